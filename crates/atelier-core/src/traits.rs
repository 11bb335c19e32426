//! Core traits for Atelier.
//!
//! [`ConfigProvider`] is the seam between configuration loading (owned by
//! the binary) and the components that only need to know where things live.

use std::path::PathBuf;

use crate::Result;

/// Trait for application configuration.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across request handlers
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use atelier_core::traits::ConfigProvider;
/// use atelier_core::Result;
///
/// #[derive(Clone)]
/// struct FixedConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for FixedConfig {
///     fn app_name(&self) -> &str {
///         "atelier"
///     }
///
///     fn projects_root(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.join("projects"))
///     }
/// }
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// Application name, used in logs and version output.
    fn app_name(&self) -> &str;

    /// Directory holding one subdirectory per project.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined (e.g. the working
    /// directory is unavailable).
    fn projects_root(&self) -> Result<PathBuf>;
}

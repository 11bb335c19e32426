//! Utility modules for file operations and path handling.
//!
//! # Modules
//!
//! - [`files`]: Async directory listing and metadata helpers
//! - [`paths`]: Tilde expansion and safe relative-path resolution

pub mod files;
pub mod paths;

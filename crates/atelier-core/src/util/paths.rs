//! Path helpers.
//!
//! [`expand_tilde`] is used on configured directories. [`resolve_within`]
//! is the single gate every client-supplied relative path passes through
//! before it touches the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Expands `~` to the user's home directory.
///
/// If the path starts with `~`, replaces it with the user's home directory.
/// Otherwise returns the path unchanged.
///
/// # Example
///
/// ```
/// use atelier_core::util::paths::expand_tilde;
///
/// let expanded = expand_tilde("~/projects");
/// assert!(!expanded.starts_with("~"));
/// ```
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if let Ok(stripped) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    path.to_path_buf()
}

/// Join a client-supplied relative path onto `root`.
///
/// Only plain name components are accepted; `.` components are dropped.
/// Absolute paths, drive prefixes and `..` are rejected with
/// [`Error::InvalidPath`], as is a path that resolves to `root` itself.
///
/// ```
/// use atelier_core::util::paths::resolve_within;
/// use std::path::Path;
///
/// let root = Path::new("/srv/projects/p1");
/// assert_eq!(
///     resolve_within(root, "docs/./a.txt").unwrap(),
///     root.join("docs/a.txt")
/// );
/// assert!(resolve_within(root, "../p2/a.txt").is_err());
/// ```
pub fn resolve_within(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::invalid_path(format!(
                    "'{}' escapes the project root",
                    relative.display()
                )));
            }
        }
    }

    if depth == 0 {
        return Err(Error::invalid_path(format!(
            "'{}' does not name an entry",
            relative.display()
        )));
    }

    Ok(resolved)
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

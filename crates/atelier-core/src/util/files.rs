//! Async file utilities.
//!
//! Thin wrappers over `tokio::fs` that attach path context to errors.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;

use crate::{Error, Result};

/// List immediate subdirectories of a path.
///
/// Entries whose type cannot be determined are skipped.
pub async fn list_subdirectories(base_path: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut entries = fs::read_dir(base_path)
        .await
        .map_err(|e| Error::io_with_path(e, base_path))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(e, base_path))?
    {
        match entry.file_type().await {
            Ok(ft) if ft.is_dir() => dirs.push(entry.path()),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping {}: {e}", entry.path().display()),
        }
    }

    Ok(dirs)
}

/// Check if a path exists and is a directory.
pub async fn is_dir(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Modification time of a path, falling back to now when the platform
/// cannot report one.
pub async fn modified_time(path: &Path) -> Result<DateTime<Utc>> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    Ok(metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_subdirectories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("dir1")).await.unwrap();
        fs::create_dir(temp.path().join("dir2")).await.unwrap();
        fs::write(temp.path().join("file.txt"), "content")
            .await
            .unwrap();

        let mut dirs = list_subdirectories(temp.path()).await.unwrap();
        dirs.sort();

        assert_eq!(
            dirs,
            vec![temp.path().join("dir1"), temp.path().join("dir2")]
        );
    }

    #[tokio::test]
    async fn test_list_subdirectories_empty() {
        let temp = TempDir::new().unwrap();

        let dirs = list_subdirectories(temp.path()).await.unwrap();
        assert!(dirs.is_empty());
    }

    #[tokio::test]
    async fn test_list_subdirectories_missing() {
        let temp = TempDir::new().unwrap();

        let err = list_subdirectories(&temp.path().join("nope"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_is_dir() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("file.txt");
        fs::write(&file_path, "content").await.unwrap();

        assert!(!is_dir(&file_path).await);
        assert!(is_dir(temp.path()).await);
        assert!(!is_dir(&temp.path().join("nonexistent")).await);
    }

    #[tokio::test]
    async fn test_modified_time_is_recent() {
        let temp = TempDir::new().unwrap();

        let mtime = modified_time(temp.path()).await.unwrap();
        let age = Utc::now() - mtime;
        assert!(age.num_minutes() < 5);
    }
}

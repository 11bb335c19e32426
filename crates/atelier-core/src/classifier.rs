//! Directory classification.
//!
//! Walks a project directory and turns every entry into a [`FileRecord`].
//! Nothing is cached; every call reads the disk.

use std::path::Path;

use async_walkdir::WalkDir;
use futures::StreamExt;

use crate::project::{FileKind, FileRecord, SIDECAR_FILE};
use crate::util::{files, paths};
use crate::{Error, Result};

/// Recursively classify everything under `root`.
///
/// The root itself and any entry named `project.json` are left out.
/// Entries that cannot be read are skipped with a warning so that one bad
/// file does not hide the rest of the tree. Order follows the walk and is
/// not guaranteed across platforms.
///
/// # Errors
///
/// [`Error::NotFound`] if `root` does not exist or is not a directory.
pub async fn classify(root: &Path, project_id: &str) -> Result<Vec<FileRecord>> {
    if !files::is_dir(root).await {
        return Err(Error::not_found(format!(
            "project directory {} not found",
            root.display()
        )));
    }

    let mut records = Vec::new();
    let mut walker = WalkDir::new(root);

    while let Some(entry_result) = walker.next().await {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        let path = entry.path();

        if path == root {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name == SIDECAR_FILE {
            continue;
        }

        let kind = match entry.file_type().await {
            Ok(ft) if ft.is_dir() => FileKind::Folder,
            Ok(_) => FileKind::from_path(&path),
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                continue;
            }
        };

        let relative = path.strip_prefix(root).unwrap_or(&path);
        records.push(FileRecord {
            name,
            path: paths::to_slash_path(relative),
            kind,
            project_id: project_id.to_string(),
        });
    }

    log::debug!(
        "Classified {} entries for project {project_id}",
        records.len()
    );
    Ok(records)
}

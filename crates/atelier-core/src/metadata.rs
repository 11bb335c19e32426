//! Per-project metadata sidecar persistence.
//!
//! Each project directory holds one `project.json`. The store only reads and
//! writes that file; it keeps no state besides the projects root and does no
//! locking. The registry serializes mutations.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::project::{Project, SIDECAR_FILE};
use crate::{Error, Result};

/// Reads and writes `project.json` sidecars under a projects root.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    root: PathBuf,
}

impl MetadataStore {
    /// Create a store rooted at the directory holding all projects.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The projects root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory backing project `id`.
    pub fn project_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Sidecar path for project `id`.
    pub fn sidecar_path(&self, id: &str) -> PathBuf {
        self.project_dir(id).join(SIDECAR_FILE)
    }

    /// Load the descriptor for `id`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the directory or sidecar is absent,
    /// [`Error::Corrupt`] if the sidecar cannot be parsed.
    pub async fn load(&self, id: &str) -> Result<Project> {
        let path = self.sidecar_path(id);
        let json = fs::read_to_string(&path)
            .await
            .map_err(|e| Error::io_with_path(e, &path))?;

        serde_json::from_str(&json)
            .map_err(|e| Error::corrupt(format!("{}: {e}", path.display())))
    }

    /// Write the descriptor, replacing any previous content.
    ///
    /// Output is pretty-printed with a fixed field order, so saving the same
    /// descriptor twice produces identical bytes.
    pub async fn save(&self, project: &Project) -> Result<()> {
        let path = self.sidecar_path(&project.id);
        let json = serde_json::to_string_pretty(project).map_err(|e| {
            Error::serialization(format!("Failed to serialize project {}: {e}", project.id))
        })?;

        fs::write(&path, json)
            .await
            .map_err(|e| Error::io_at(e, &path))?;

        log::debug!("Saved metadata for project {}", project.id);
        Ok(())
    }
}

//! Service facade consumed by the transport layer.
//!
//! [`ProjectService`] ties the registry, the metadata store and the
//! classifier together and owns the file read/upload paths. Every method
//! validates the project id against the registry before touching disk.
//!
//! Uploads are written in two steps. [`ProjectService::stage_file`] streams
//! the bytes into a hidden staging file in the project directory;
//! [`ProjectService::commit_file`] renames it into place. A failed or
//! abandoned upload never touches an existing file of the same name.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::classifier;
use crate::metadata::MetadataStore;
use crate::project::{FileKind, FileRecord, NewProject, Project, SIDECAR_FILE};
use crate::registry::{FilesGuard, ProjectRegistry};
use crate::util::files;
use crate::util::paths::{resolve_within, to_slash_path};
use crate::{Error, Result};

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Project and file operations over one shared registry.
#[derive(Debug)]
pub struct ProjectService {
    registry: ProjectRegistry,
}

/// An opened project file ready to be streamed to a client.
#[derive(Debug)]
pub struct FileDownload {
    /// Base name of the file.
    pub name: String,
    /// Size in bytes at open time.
    pub len: u64,
    /// Open handle positioned at the start.
    pub file: fs::File,
}

/// Upload bytes held in a staging file, not yet visible under their name.
///
/// Holds the project's [`FilesGuard`], so the project cannot be deleted
/// until the upload is committed or dropped. Dropping without
/// [`ProjectService::commit_file`] removes the staging file.
#[derive(Debug)]
pub struct StagedUpload {
    project_id: String,
    file_name: String,
    staging: PathBuf,
    len: u64,
    committed: bool,
    files: FilesGuard,
}

impl StagedUpload {
    /// Base name the file will be stored under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Bytes received.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if no bytes were received.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.staging) {
            Ok(()) => log::debug!("Discarded staged upload {}", self.staging.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove {}: {e}", self.staging.display()),
        }
    }
}

impl ProjectService {
    /// Wrap an existing registry.
    pub fn new(registry: ProjectRegistry) -> Self {
        Self { registry }
    }

    /// Build a service over `projects_root` and reconcile it with disk.
    pub async fn open(projects_root: impl Into<PathBuf>) -> Result<Self> {
        let registry = ProjectRegistry::new(MetadataStore::new(projects_root));
        registry.reconcile().await?;
        Ok(Self::new(registry))
    }

    /// The underlying registry.
    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// Create a project. The name is trimmed and must not be blank.
    pub async fn create_project(&self, request: NewProject) -> Result<Project> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("project name must not be empty"));
        }
        self.registry.create(name, request.description).await
    }

    /// All projects, in no particular order.
    pub async fn list_projects(&self) -> Vec<Project> {
        self.registry.list().await
    }

    /// One project by id.
    pub async fn get_project(&self, id: &str) -> Result<Project> {
        self.registry.get(id).await
    }

    /// Delete a project and everything under its directory.
    ///
    /// Waits for uploads into the project that are still in progress.
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        self.registry.delete(id).await
    }

    /// Classified file tree of a project.
    pub async fn list_files(&self, project_id: &str) -> Result<Vec<FileRecord>> {
        let root = self.project_root(project_id).await?;
        classifier::classify(&root, project_id).await
    }

    /// Open a file inside a project for streaming.
    pub async fn open_file(&self, project_id: &str, relative_path: &str) -> Result<FileDownload> {
        let root = self.project_root(project_id).await?;
        let path = resolve_within(&root, relative_path)?;

        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| Error::io_with_path(e, &path))?;
        if metadata.is_dir() {
            return Err(Error::invalid_path(format!(
                "'{relative_path}' is a directory"
            )));
        }

        let file = fs::File::open(&path)
            .await
            .map_err(|e| Error::io_with_path(e, &path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(FileDownload {
            name,
            len: metadata.len(),
            file,
        })
    }

    /// Stream an uploaded file into a project in one step.
    ///
    /// See [`stage_file`](Self::stage_file) and
    /// [`commit_file`](Self::commit_file).
    pub async fn receive_file<S, B>(
        &self,
        project_id: &str,
        filename: &str,
        subdir: Option<&str>,
        chunks: S,
    ) -> Result<FileRecord>
    where
        S: Stream<Item = io::Result<B>> + Unpin,
        B: AsRef<[u8]>,
    {
        let staged = self.stage_file(project_id, filename, chunks).await?;
        self.commit_file(staged, subdir).await
    }

    /// Write an upload to a staging file inside the project.
    ///
    /// Only the base name of `filename` is kept, and `project.json` is
    /// refused. Chunks are written as they arrive. On any error the staging
    /// file is removed and nothing else in the project changes.
    pub async fn stage_file<S, B>(
        &self,
        project_id: &str,
        filename: &str,
        mut chunks: S,
    ) -> Result<StagedUpload>
    where
        S: Stream<Item = io::Result<B>> + Unpin,
        B: AsRef<[u8]>,
    {
        let file_name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::invalid_path(format!("'{filename}' is not a file name")))?
            .to_string();
        if file_name == SIDECAR_FILE {
            return Err(Error::invalid_path(format!("'{SIDECAR_FILE}' is reserved")));
        }

        let guard = self.registry.lock_files(project_id).await?;
        if !files::is_dir(guard.dir()).await {
            return Err(Error::not_found(format!(
                "project directory {} not found",
                guard.dir().display()
            )));
        }

        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let staging = guard.dir().join(format!(".upload-{seq}.part"));
        let mut staged = StagedUpload {
            project_id: project_id.to_string(),
            file_name,
            staging,
            len: 0,
            committed: false,
            files: guard,
        };

        let mut file = fs::File::create(&staged.staging)
            .await
            .map_err(|e| Error::io_at(e, &staged.staging))?;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(Error::io)?;
            let bytes = chunk.as_ref();
            file.write_all(bytes)
                .await
                .map_err(|e| Error::io_at(e, &staged.staging))?;
            staged.len += bytes.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| Error::io_at(e, &staged.staging))?;

        Ok(staged)
    }

    /// Move a staged upload to its final place, replacing any existing file.
    ///
    /// `subdir`, when given, is a relative directory inside the project and
    /// is created if missing.
    pub async fn commit_file(
        &self,
        mut staged: StagedUpload,
        subdir: Option<&str>,
    ) -> Result<FileRecord> {
        let relative = match subdir.map(str::trim).filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir).join(&staged.file_name),
            None => PathBuf::from(&staged.file_name),
        };
        let target = resolve_within(staged.files.dir(), &relative)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_at(e, parent))?;
        }
        fs::rename(&staged.staging, &target)
            .await
            .map_err(|e| Error::io_at(e, &target))?;
        staged.committed = true;

        log::info!(
            "Stored {} bytes at {} in project {}",
            staged.len,
            relative.display(),
            staged.project_id
        );
        Ok(FileRecord {
            name: staged.file_name.clone(),
            path: to_slash_path(&relative),
            kind: FileKind::from_path(&target),
            project_id: staged.project_id.clone(),
        })
    }

    async fn project_root(&self, project_id: &str) -> Result<PathBuf> {
        if !self.registry.contains(project_id).await {
            return Err(Error::not_found(format!("project {project_id}")));
        }
        Ok(self.registry.store().project_dir(project_id))
    }
}

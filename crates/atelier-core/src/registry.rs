//! In-memory project registry kept in lockstep with the projects directory.
//!
//! The directory tree is the source of truth. [`ProjectRegistry::reconcile`]
//! rebuilds the index from disk at startup; afterwards every mutation updates
//! disk first and memory second, while holding the write lock, so the two
//! cannot drift apart within one process.
//!
//! Each project also carries a files lock. Writers inside a project hold it
//! shared through [`ProjectRegistry::lock_files`]; [`ProjectRegistry::delete`]
//! takes it exclusively, so a project is never removed under a running write.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};

use crate::metadata::MetadataStore;
use crate::project::Project;
use crate::util::files;
use crate::{Error, Result};

/// Produces candidate project identifiers.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Default identifier: current UTC time to the second, e.g. `20240501080000`.
pub fn timestamp_id() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

struct Entry {
    project: Project,
    files: Arc<RwLock<()>>,
}

impl Entry {
    fn new(project: Project) -> Self {
        Self {
            project,
            files: Arc::new(RwLock::new(())),
        }
    }
}

/// Shared hold on one project's directory.
///
/// While any guard is alive, [`ProjectRegistry::delete`] for that project
/// waits.
#[derive(Debug)]
pub struct FilesGuard {
    dir: PathBuf,
    _hold: OwnedRwLockReadGuard<()>,
}

impl FilesGuard {
    /// The project directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Authoritative in-memory view of all projects.
pub struct ProjectRegistry {
    store: MetadataStore,
    projects: RwLock<HashMap<String, Entry>>,
    next_id: IdGenerator,
}

impl std::fmt::Debug for ProjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRegistry")
            .field("root", &self.store.root())
            .finish_non_exhaustive()
    }
}

impl ProjectRegistry {
    /// Create an empty registry over `store`. Call [`reconcile`](Self::reconcile)
    /// before serving requests.
    pub fn new(store: MetadataStore) -> Self {
        Self::with_id_generator(store, Arc::new(timestamp_id))
    }

    /// Create a registry with a custom identifier source.
    pub fn with_id_generator(store: MetadataStore, next_id: IdGenerator) -> Self {
        Self {
            store,
            projects: RwLock::new(HashMap::new()),
            next_id,
        }
    }

    /// The metadata store backing this registry.
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Align the index with the projects directory.
    ///
    /// Creates the projects root if needed, adopts every subdirectory not yet
    /// indexed, and drops indexed projects whose directory is gone. Returns
    /// the number of projects indexed afterwards.
    pub async fn reconcile(&self) -> Result<usize> {
        let root = self.store.root();
        fs::create_dir_all(root)
            .await
            .map_err(|e| Error::io_at(e, root))?;

        let mut projects = self.projects.write().await;
        let dirs = files::list_subdirectories(root).await?;

        let mut seen = HashSet::with_capacity(dirs.len());
        for dir in dirs {
            let Some(id) = dir.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
                log::warn!("Skipping non UTF-8 directory {}", dir.display());
                continue;
            };
            seen.insert(id.clone());

            if projects.contains_key(&id) {
                continue;
            }

            let project = self.adopt(&id, &dir).await;
            projects.insert(id, Entry::new(project));
        }

        projects.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                log::warn!("Project {id} directory vanished, dropping from registry");
            }
            keep
        });

        log::info!("Loaded {} projects", projects.len());
        Ok(projects.len())
    }

    /// Load or synthesize the descriptor for an unindexed directory.
    async fn adopt(&self, id: &str, dir: &Path) -> Project {
        match self.store.load(id).await {
            Ok(project) if project.id == id => {
                log::info!("Loaded project: {} ({id})", project.name);
                project
            }
            Ok(mut project) => {
                log::warn!(
                    "Project metadata in {} names id {}, using directory name",
                    dir.display(),
                    project.id
                );
                project.id = id.to_string();
                project.updated_at = Utc::now();
                self.persist_adopted(&project).await;
                project
            }
            Err(e) if e.is_recoverable_metadata() => {
                log::debug!("No usable metadata for {id}: {e}");
                let project = Project::adopted(id, Self::dir_mtime(dir).await);
                self.persist_adopted(&project).await;
                log::info!("Created metadata for project: {} ({id})", project.name);
                project
            }
            Err(e) => {
                // Unreadable but maybe valid: index it without overwriting.
                log::warn!("Could not read metadata for {id}: {e}");
                Project::adopted(id, Self::dir_mtime(dir).await)
            }
        }
    }

    async fn dir_mtime(dir: &Path) -> chrono::DateTime<Utc> {
        files::modified_time(dir).await.unwrap_or_else(|e| {
            log::warn!("Could not stat {}: {e}", dir.display());
            Utc::now()
        })
    }

    /// Save an adopted descriptor; failure does not stop adoption.
    async fn persist_adopted(&self, project: &Project) {
        if let Err(e) = self.store.save(project).await {
            log::warn!("Failed to save metadata for project {}: {e}", project.id);
        }
    }

    /// Create a new project with a fresh identifier.
    ///
    /// # Errors
    ///
    /// [`Error::Conflict`] if the generated id is already taken in memory or
    /// on disk; I/O errors if the directory or sidecar cannot be written.
    pub async fn create(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Project> {
        let mut projects = self.projects.write().await;

        let id = (self.next_id)();
        if projects.contains_key(&id) {
            return Err(Error::conflict(format!("project id {id} already exists")));
        }

        let dir = self.store.project_dir(&id);
        if let Err(e) = fs::create_dir(&dir).await {
            return Err(if e.kind() == std::io::ErrorKind::AlreadyExists {
                Error::conflict(format!("project directory {} already exists", dir.display()))
            } else {
                Error::io_at(e, &dir)
            });
        }

        let project = Project::new(id.clone(), name, description, Utc::now());
        if let Err(e) = self.store.save(&project).await {
            if let Err(cleanup) = fs::remove_dir_all(&dir).await {
                log::error!(
                    "Failed to remove {} after metadata write error: {cleanup}",
                    dir.display()
                );
            }
            return Err(e);
        }

        projects.insert(id.clone(), Entry::new(project.clone()));
        log::info!("Created project: {} ({id})", project.name);
        Ok(project)
    }

    /// Look up a project by id.
    pub async fn get(&self, id: &str) -> Result<Project> {
        self.projects
            .read()
            .await
            .get(id)
            .map(|entry| entry.project.clone())
            .ok_or_else(|| Error::not_found(format!("project {id}")))
    }

    /// All indexed projects, in no particular order.
    pub async fn list(&self) -> Vec<Project> {
        self.projects
            .read()
            .await
            .values()
            .map(|entry| entry.project.clone())
            .collect()
    }

    /// True if `id` is indexed.
    pub async fn contains(&self, id: &str) -> bool {
        self.projects.read().await.contains_key(id)
    }

    /// Number of indexed projects.
    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }

    /// True if no projects are indexed.
    pub async fn is_empty(&self) -> bool {
        self.projects.read().await.is_empty()
    }

    /// Hold a project's directory against deletion.
    ///
    /// Fails with [`Error::NotFound`] if the project is unknown, or was
    /// deleted while waiting for a running delete to finish.
    pub async fn lock_files(&self, id: &str) -> Result<FilesGuard> {
        let lock = self.files_lock(id).await?;
        let hold = Arc::clone(&lock).read_owned().await;
        if !self.is_current(id, &lock).await {
            return Err(Error::not_found(format!("project {id}")));
        }
        Ok(FilesGuard {
            dir: self.store.project_dir(id),
            _hold: hold,
        })
    }

    async fn files_lock(&self, id: &str) -> Result<Arc<RwLock<()>>> {
        self.projects
            .read()
            .await
            .get(id)
            .map(|entry| Arc::clone(&entry.files))
            .ok_or_else(|| Error::not_found(format!("project {id}")))
    }

    /// True if `id` is still indexed under the same files lock, i.e. it was
    /// not deleted (and possibly recreated) in the meantime.
    async fn is_current(&self, id: &str, lock: &Arc<RwLock<()>>) -> bool {
        self.projects
            .read()
            .await
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.files, lock))
    }

    /// Delete a project and its directory.
    ///
    /// Waits for every outstanding [`FilesGuard`] of the project. The
    /// directory goes first; if removing it fails the index entry stays and
    /// the error is returned.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let lock = self.files_lock(id).await?;
        let _exclusive = lock.write().await;

        let mut projects = self.projects.write().await;
        if !projects
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.files, &lock))
        {
            return Err(Error::not_found(format!("project {id}")));
        }

        let dir = self.store.project_dir(id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            // Already gone on disk; the index must follow.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Project {id} directory was already missing");
            }
            Err(e) => return Err(Error::io_at(e, &dir)),
        }

        projects.remove(id);
        log::info!("Deleted project {id}");
        Ok(())
    }
}

//! Application state management.
//!
//! Provides [`AppState<C>`], the cheaply cloneable bundle that request
//! handlers receive: the configuration plus the one shared
//! [`ProjectService`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use atelier_core::{AppState, ConfigProvider, Result};
//!
//! #[derive(Clone)]
//! struct MyConfig {
//!     root: PathBuf,
//! }
//!
//! impl ConfigProvider for MyConfig {
//!     fn app_name(&self) -> &str { "atelier" }
//!     fn projects_root(&self) -> Result<PathBuf> { Ok(self.root.clone()) }
//! }
//!
//! # async fn example() -> Result<()> {
//! let state = AppState::open(MyConfig { root: PathBuf::from("projects") }).await?;
//! let projects = state.service().list_projects().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::Result;
use crate::service::ProjectService;
use crate::traits::ConfigProvider;

/// Thread-safe shared application state.
///
/// `AppState` is `Clone`, `Send`, and `Sync`. Cloning copies two `Arc`s.
#[derive(Debug)]
pub struct AppState<C: ConfigProvider> {
    config: Arc<C>,
    service: Arc<ProjectService>,
}

impl<C: ConfigProvider> AppState<C> {
    /// Bundle a configuration with an already built service.
    pub fn new(config: C, service: ProjectService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }

    /// Build the service from `config.projects_root()` and reconcile it.
    pub async fn open(config: C) -> Result<Self> {
        let root = config.projects_root()?;
        let service = ProjectService::open(root).await?;
        Ok(Self::new(config, service))
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// The shared project service.
    pub fn service(&self) -> &ProjectService {
        &self.service
    }
}

impl<C: ConfigProvider> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            service: Arc::clone(&self.service),
        }
    }
}

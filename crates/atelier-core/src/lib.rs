//! Atelier Core: projects on disk, indexed in memory.
//!
//! This crate owns the on-disk layout and everything that reads or writes it.
//! It has no HTTP or CLI dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`project`]: Project descriptors and file records
//! - [`metadata`]: `project.json` sidecar persistence
//! - [`classifier`]: Recursive file-tree classification
//! - [`registry`]: In-memory project index reconciled with disk
//! - [`service`]: Facade used by the transport layer
//! - [`state`]: Shared application state
//! - [`traits`]: Configuration seam
//! - [`util`]: File and path utilities

#![doc = include_str!("../README.md")]

pub mod classifier;
pub mod error;
pub mod metadata;
pub mod project;
pub mod registry;
pub mod service;
pub mod state;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use metadata::MetadataStore;
pub use project::{FileKind, FileRecord, NewProject, Project, SIDECAR_FILE};
pub use registry::{FilesGuard, ProjectRegistry};
pub use service::{FileDownload, ProjectService, StagedUpload};
pub use state::AppState;
pub use traits::ConfigProvider;

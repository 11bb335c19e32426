//! Error types for Atelier operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Atelier crates. Uses `thiserror` for derive macros.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in Atelier operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error without path context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {}: {source}", path.display())]
    IoWithPath {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Project or file not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Identifier collision on create.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Metadata sidecar exists but cannot be parsed.
    #[error("Corrupt metadata: {0}")]
    Corrupt(String),

    /// Caller supplied an unusable value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Relative path escapes its root or names something it may not.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Wrap a bare I/O error.
    pub fn io(err: std::io::Error) -> Self {
        Self::Io(err)
    }

    /// Wrap an I/O error with the path it occurred at.
    ///
    /// `ErrorKind::NotFound` becomes [`Error::NotFound`] so callers only
    /// have one variant to match on for absent files. Use this on read
    /// paths; writes go through [`Error::io_at`].
    pub fn io_with_path(err: std::io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path.display().to_string());
        }
        Self::IoWithPath {
            path: path.to_path_buf(),
            source: err,
        }
    }

    /// Wrap an I/O error with its path, keeping the kind as is.
    ///
    /// A missing parent while creating or writing is a server-side fault,
    /// not an absent resource.
    pub fn io_at(err: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source: err,
        }
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a corrupt metadata error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid path error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// True for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for [`Error::Conflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// True when a metadata load failure should fall back to synthesis.
    pub fn is_recoverable_metadata(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Corrupt(_))
    }
}

/// Result type alias using Atelier's Error type.
pub type Result<T> = std::result::Result<T, Error>;

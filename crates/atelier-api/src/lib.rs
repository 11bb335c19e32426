//! HTTP API for Atelier.
//!
//! Exposes [`atelier_core::ProjectService`] through an axum [`Router`].
//! The router holds no logic beyond request parsing and status mapping.
//!
//! # Modules
//!
//! - [`error`]: `ApiError` and its status mapping
//! - [`routes`]: Router construction and handlers
//! - [`server`]: Listener and graceful shutdown
//!
//! [`Router`]: axum::Router

#![doc = include_str!("../README.md")]

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use routes::{ApiOptions, router};
pub use server::{serve, serve_listener};

//! Command-line front end for Atelier.
//!
//! - [`cli`]: clap argument and subcommand definitions
//! - [`config`]: [`AtelierConfig`] loading via confyg
//! - [`app`]: [`AtelierCli`] dispatch and logging setup

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::AtelierCli;
pub use cli::{CliArgs, Command};
pub use config::AtelierConfig;

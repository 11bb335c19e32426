//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Disk-backed project workspace server.
#[derive(Parser, Debug)]
#[command(name = "atelier", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "ATELIER_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server.
    Serve {
        /// Host address to bind to (overrides `server.host`).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides `server.port`).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Project operations against the projects directory.
    Projects(ProjectsCommand),

    /// List the classified files of a project.
    Files {
        /// Project id.
        project_id: String,
    },

    /// Reconcile the registry with disk and report the project count.
    Reconcile,

    /// Configuration operations.
    Config(ConfigCommand),

    /// Print version information.
    Version,
}

/// Project subcommands.
#[derive(Parser, Debug)]
pub struct ProjectsCommand {
    /// Project subcommand to execute.
    #[command(subcommand)]
    pub command: ProjectsAction,
}

/// Available project subcommands.
#[derive(Subcommand, Debug)]
pub enum ProjectsAction {
    /// List all projects, newest first.
    List,

    /// Create a project.
    Create {
        /// Display name.
        name: String,

        /// Free-text description.
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Delete a project and its directory.
    Delete {
        /// Project id.
        id: String,
    },
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration as TOML.
    Show,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "server.port").
        key: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

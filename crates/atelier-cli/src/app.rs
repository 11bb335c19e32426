//! The Atelier command-line application.
//!
//! [`AtelierCli`] owns the loaded configuration and dispatches parsed
//! [`CliArgs`] to the server or to one of the offline maintenance commands.

use atelier_core::traits::ConfigProvider;
use atelier_core::{AppState, FileRecord, NewProject, Project, ProjectService, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command, ProjectsAction};
use crate::config::AtelierConfig;
use crate::config_handlers;

// ============================================================================
// AtelierCli
// ============================================================================

/// CLI application over a loaded [`AtelierConfig`].
pub struct AtelierCli {
    config: AtelierConfig,
    version: String,
}

impl AtelierCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = AtelierConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create a new CLI application.
    pub fn new(config: AtelierConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &AtelierConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    /// `log` records from the core are forwarded into the same subscriber.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Serve { host, port }) => self.serve(host, port).await,
            Some(Command::Projects(projects)) => self.handle_projects(projects.command).await,
            Some(Command::Files { project_id }) => {
                let service = self.open_service().await?;
                let mut files = service.list_files(&project_id).await?;
                files.sort_by(|a, b| a.path.cmp(&b.path));
                for file in &files {
                    println!("{}", format_file(file));
                }
                Ok(())
            }
            Some(Command::Reconcile) => {
                let root = self.config.projects_root()?;
                let service = ProjectService::open(&root).await?;
                let count = service.registry().len().await;
                println!("{count} projects in {}", root.display());
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            Some(Command::Version) => {
                println!("{} {}", self.config.app_name(), self.version);
                Ok(())
            }
            None => {
                println!(
                    "{} {}: use --help for usage",
                    self.config.app_name(),
                    self.version
                );
                Ok(())
            }
        }
    }

    async fn serve(&self, host: Option<String>, port: Option<u16>) -> Result<()> {
        let mut config = self.config.clone();
        if let Some(host) = host {
            config.server.host = host;
        }
        if let Some(port) = port {
            config.server.port = port;
        }

        let addr = config.socket_addr()?;
        let options = config.api_options();
        tracing::info!(
            projects_root = %config.projects_root()?.display(),
            "Starting {} {}",
            config.app_name(),
            self.version
        );

        let state = AppState::open(config).await?;
        atelier_api::serve(state, &options, addr).await
    }

    async fn handle_projects(&self, action: ProjectsAction) -> Result<()> {
        let service = self.open_service().await?;
        match action {
            ProjectsAction::List => {
                let mut projects = service.list_projects().await;
                projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                for project in &projects {
                    println!("{}", format_project(project));
                }
                Ok(())
            }
            ProjectsAction::Create { name, description } => {
                let project = service
                    .create_project(NewProject::new(name, description))
                    .await?;
                println!("{}", format_project(&project));
                Ok(())
            }
            ProjectsAction::Delete { id } => {
                service.delete_project(&id).await?;
                println!("Deleted project {id}");
                Ok(())
            }
        }
    }

    async fn open_service(&self) -> Result<ProjectService> {
        let root = self.config.projects_root()?;
        tracing::debug!(root = %root.display(), "Opening projects directory");
        ProjectService::open(root).await
    }
}

fn format_project(project: &Project) -> String {
    format!(
        "{}\t{}\t{}",
        project.id,
        project.created_at.format("%Y-%m-%d %H:%M:%S"),
        project.name
    )
}

fn format_file(file: &FileRecord) -> String {
    format!("{:<6}\t{}", file.kind, file.path)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli_in(temp: &TempDir) -> AtelierCli {
        AtelierCli::new(AtelierConfig {
            projects_dir: temp.path().join("projects").to_string_lossy().into_owned(),
            ..Default::default()
        })
    }

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("atelier").chain(argv.iter().copied()))
    }

    #[test]
    fn test_atelier_cli_new() {
        let cli = AtelierCli::new(AtelierConfig::default());
        assert_eq!(cli.config().app_name(), "atelier");
        assert_eq!(cli.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_from_args_with_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "projects_dir = \"/from/file\"\n").unwrap();

        let cli = AtelierCli::from_args(&args(&["--config", path.to_str().unwrap()])).unwrap();
        assert_eq!(cli.config().projects_dir, "/from/file");
    }

    #[tokio::test]
    async fn test_run_version_and_no_command() {
        let temp = TempDir::new().unwrap();
        let cli = cli_in(&temp);
        assert!(cli.run(args(&["version"])).await.is_ok());
        assert!(cli.run(args(&[])).await.is_ok());
    }

    #[tokio::test]
    async fn test_projects_create_list_delete() {
        let temp = TempDir::new().unwrap();
        let cli = cli_in(&temp);

        cli.run(args(&["projects", "create", "Survey", "-d", "notes"]))
            .await
            .unwrap();

        let service = cli.open_service().await.unwrap();
        let projects = service.list_projects().await;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Survey");
        assert_eq!(projects[0].description, "notes");
        let id = projects[0].id.clone();

        cli.run(args(&["projects", "list"])).await.unwrap();
        cli.run(args(&["files", &id])).await.unwrap();
        cli.run(args(&["projects", "delete", &id])).await.unwrap();

        assert!(cli.open_service().await.unwrap().list_projects().await.is_empty());
        assert!(!temp.path().join("projects").join(&id).exists());
    }

    #[tokio::test]
    async fn test_projects_delete_unknown() {
        let temp = TempDir::new().unwrap();
        let cli = cli_in(&temp);

        let err = cli.run(args(&["projects", "delete", "ghost"])).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reconcile_adopts_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("projects");
        std::fs::create_dir_all(root.join("manual")).unwrap();
        let cli = cli_in(&temp);

        cli.run(args(&["reconcile"])).await.unwrap();

        assert!(root.join("manual").join("project.json").is_file());
    }

    #[tokio::test]
    async fn test_files_unknown_project() {
        let temp = TempDir::new().unwrap();
        let cli = cli_in(&temp);

        assert!(cli.run(args(&["files", "ghost"])).await.is_err());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let cli = AtelierCli::new(AtelierConfig::default());
        cli.init_logging(false, false);
        cli.init_logging(true, false);
        cli.init_logging(false, true);
    }
}

//! Configuration for the Atelier binary.
//!
//! Provides the [`AtelierConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `ATELIER_CONFIG` environment variable
//! 3. XDG default: `~/.config/atelier/config.toml`
//! 4. Built-in defaults
//!
//! `ATELIER_*` environment variables are overlaid on top. confyg passes env
//! values through as strings, so only string fields can be overridden that
//! way; use the `serve` flags for the port.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use atelier_api::ApiOptions;
use atelier_core::traits::ConfigProvider;
use atelier_core::util::paths::expand_tilde;
use atelier_core::{Error, Result};
use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};

/// Name used for the config directory, env prefix and logs.
pub const APP_NAME: &str = "atelier";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the Atelier binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtelierConfig {
    /// Directory holding one subdirectory per project. `~` is expanded and
    /// relative paths are taken from the working directory.
    pub projects_dir: String,

    /// HTTP listener.
    pub server: ServerConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Request body limits.
    pub upload: UploadConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any.
    pub allowed_origins: Vec<String>,
}

/// Upload configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted request body, in bytes.
    pub max_bytes: usize,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for AtelierConfig {
    fn default() -> Self {
        Self {
            projects_dir: "projects".to_string(),
            server: ServerConfig::default(),
            cors: CorsConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: ApiOptions::default().allowed_origins,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: ApiOptions::default().max_body_bytes,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl AtelierConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("ATELIER");
        env_opts.add_section("server");
        env_opts.add_section("cors");
        env_opts.add_section("upload");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("ATELIER_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `ATELIER_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "ATELIER", &mut vars);
        Ok(vars)
    }

    /// Resolve `server.host` and `server.port` to a bindable address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let host = self.server.host.as_str();
        (host, self.server.port)
            .to_socket_addrs()
            .map_err(|e| Error::config(format!("invalid server address {host}: {e}")))?
            .next()
            .ok_or_else(|| Error::config(format!("server host {host} did not resolve")))
    }

    /// Transport settings derived from the `cors` and `upload` sections.
    pub fn api_options(&self) -> ApiOptions {
        ApiOptions {
            allowed_origins: self.cors.allowed_origins.clone(),
            max_body_bytes: self.upload.max_bytes,
        }
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for AtelierConfig {
    fn app_name(&self) -> &str {
        APP_NAME
    }

    fn projects_root(&self) -> Result<PathBuf> {
        let dir = expand_tilde(&self.projects_dir);
        if dir.is_absolute() {
            return Ok(dir);
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .map_err(|e| Error::config(format!("Could not determine working directory: {e}")))
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// RAII guard for env var manipulation in tests.
    struct EnvGuard {
        key: String,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn new(key: &str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: tests that touch the environment use distinct keys.
            unsafe { std::env::set_var(key, value) };
            Self {
                key: key.to_string(),
                prev,
            }
        }

        fn remove(key: &str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: see `new`.
            unsafe { std::env::remove_var(key) };
            Self {
                key: key.to_string(),
                prev,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // SAFETY: see `new`.
            unsafe {
                match self.prev {
                    Some(ref val) => std::env::set_var(&self.key, val),
                    None => std::env::remove_var(&self.key),
                }
            }
        }
    }

    #[test]
    fn test_atelier_config_default() {
        let config = AtelierConfig::default();
        assert_eq!(config.projects_dir, "projects");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.upload.max_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_atelier_config_from_toml() {
        let toml_str = r#"
            projects_dir = "/srv/atelier"

            [server]
            host = "127.0.0.1"
            port = 9000

            [cors]
            allowed_origins = ["https://app.example.com", "http://localhost:3000"]

            [upload]
            max_bytes = 1024
        "#;

        let config: AtelierConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.projects_dir, "/srv/atelier");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cors.allowed_origins.len(), 2);
        assert_eq!(config.upload.max_bytes, 1024);
    }

    #[test]
    fn test_atelier_config_partial_toml_keeps_defaults() {
        let config: AtelierConfig = toml::from_str("[server]\nport = 7000\n").unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.projects_dir, "projects");
    }

    #[test]
    fn test_atelier_config_to_toml_round_trip() {
        let config = AtelierConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("projects_dir = \"projects\""));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("port = 8080"));

        let parsed: AtelierConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.cors.allowed_origins, config.cors.allowed_origins);
    }

    #[test]
    fn test_atelier_config_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                projects_dir = "/data/projects"
                [server]
                port = 9090
            "#,
        )
        .unwrap();

        let config = AtelierConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.projects_dir, "/data/projects");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_atelier_config_load_missing_file_uses_defaults() {
        let config = AtelierConfig::load(Some("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.projects_dir, "projects");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_atelier_config_load_env_overlay() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nhost = \"127.0.0.1\"\n").unwrap();

        let _guard = EnvGuard::new("ATELIER_SERVER_HOST", "10.0.0.1");
        let config = AtelierConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
    }

    #[test]
    fn test_resolve_config_path_explicit() {
        let path = AtelierConfig::resolve_config_path(Some("/explicit/config.toml"));
        assert_eq!(path, Some(PathBuf::from("/explicit/config.toml")));
    }

    #[test]
    fn test_resolve_config_path_env() {
        let _guard = EnvGuard::new("ATELIER_CONFIG", "/env/config.toml");
        let path = AtelierConfig::resolve_config_path(None);
        assert_eq!(path, Some(PathBuf::from("/env/config.toml")));
    }

    #[test]
    fn test_resolve_config_path_default() {
        let _guard = EnvGuard::remove("ATELIER_CONFIG");
        let path = AtelierConfig::resolve_config_path(None).unwrap();
        let text = path.to_string_lossy();
        assert!(text.contains("atelier"));
        assert!(text.ends_with("config.toml"));
    }

    #[test]
    fn test_projects_root_absolute() {
        let config = AtelierConfig {
            projects_dir: "/srv/projects".into(),
            ..Default::default()
        };
        assert_eq!(config.projects_root().unwrap(), PathBuf::from("/srv/projects"));
    }

    #[test]
    fn test_projects_root_relative_uses_cwd() {
        let config = AtelierConfig::default();
        assert_eq!(
            config.projects_root().unwrap(),
            std::env::current_dir().unwrap().join("projects")
        );
    }

    #[test]
    fn test_projects_root_expands_tilde() {
        let config = AtelierConfig {
            projects_dir: "~/atelier".into(),
            ..Default::default()
        };
        let root = config.projects_root().unwrap();
        assert!(!root.starts_with("~"));
        assert!(root.ends_with("atelier"));
    }

    #[test]
    fn test_socket_addr() {
        let config = AtelierConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 4321,
            },
            ..Default::default()
        };
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:4321".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_socket_addr_invalid_host() {
        let config = AtelierConfig {
            server: ServerConfig {
                host: "not a host".into(),
                port: 1,
            },
            ..Default::default()
        };
        assert!(matches!(config.socket_addr(), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_options() {
        let config = AtelierConfig {
            cors: CorsConfig {
                allowed_origins: vec!["*".into()],
            },
            upload: UploadConfig { max_bytes: 10 },
            ..Default::default()
        };
        let options = config.api_options();
        assert_eq!(options.allowed_origins, vec!["*"]);
        assert_eq!(options.max_body_bytes, 10);
    }

    #[test]
    fn test_to_env_vars() {
        let vars = AtelierConfig::default().to_env_vars().unwrap();
        let map: HashMap<_, _> = vars.into_iter().collect();
        assert_eq!(map.get("ATELIER_PROJECTS_DIR").unwrap(), "projects");
        assert_eq!(map.get("ATELIER_SERVER_PORT").unwrap(), "8080");
        assert_eq!(map.get("ATELIER_SERVER_HOST").unwrap(), "0.0.0.0");
        assert_eq!(
            map.get("ATELIER_CORS_ALLOWED_ORIGINS").unwrap(),
            "[\"http://localhost:5173\"]"
        );
    }

    #[test]
    fn test_atelier_config_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AtelierConfig>();
    }
}

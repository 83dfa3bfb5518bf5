//! CLI configuration
//!
//! Settings are layered: built-in defaults, then the config file (an explicit
//! `--config` path, or `config.toml` in the platform config directory when it
//! exists), then `JOBTRACK__*` environment variables such as
//! `JOBTRACK__API__BASE_URL`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use jobtrack_http::client::config::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "JOBTRACK";

/// CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Backend connection
    pub api: ClientConfig,

    /// Token file location; defaults to `tokens.json` in the state directory
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ClientConfig::default(),
            token_file: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings, reading `path` if given (it must then exist)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let dirs = project_dirs();
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("log_level", defaults.log_level)?;

        match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(dirs) = &dirs {
                    let default_file = dirs.config_dir().join("config.toml");
                    builder = builder.add_source(config::File::from(default_file).required(false));
                }
            }
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to read configuration")?;

        let settings: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.api.validate()?;
        Ok(settings)
    }

    /// Where the token pair is persisted
    pub fn token_path(&self) -> PathBuf {
        if let Some(path) = &self.token_file {
            return path.clone();
        }

        match project_dirs() {
            Some(dirs) => dirs.data_local_dir().join("tokens.json"),
            // Fallback to current directory
            None => PathBuf::from(".jobtrack").join("tokens.json"),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "jobtrack", "jobtrack")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobtrack.toml");
        std::fs::write(
            &path,
            r#"
log_level = "debug"
token_file = "/tmp/jobtrack-test/tokens.json"

[api]
base_url = "https://jobs.example.com"
refresh_timeout_secs = 10
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.api.base_url, "https://jobs.example.com");
        assert_eq!(settings.api.refresh_timeout_secs, Some(10));
        assert_eq!(settings.api.timeout_secs, None);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(
            settings.token_path(),
            PathBuf::from("/tmp/jobtrack-test/tokens.json")
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobtrack.toml");
        std::fs::write(&path, "[api]\nbase_url = \"jobs.example.com\"\n").unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }
}

//! Configuration file support for archivist.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `ARCHIVIST_`, e.g., `ARCHIVIST_REMOTE_TOKEN`)
//! 3. Config file (~/.config/archivist/config.toml or ./archivist.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/archivist/archivist.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/archivist/archivist.db"  # optional, this is the default
//!
//! [remote]
//! url = "https://tracker.example.com"
//! token = "..."  # or use ARCHIVIST_REMOTE_TOKEN env var
//!
//! [sync]
//! page_size = 100
//! prefetch = 5
//! concurrency = 2
//! ```

use std::path::PathBuf;

use anyhow::Context;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use archivist::remote::StaticRemoteConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Remote service configuration.
    pub remote: RemoteSection,
    /// Default sync options.
    pub sync: SyncSection,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Defaults to `sqlite://~/.local/state/archivist/archivist.db`.
    pub url: Option<String>,
}

/// Remote service configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    /// Base URL of the tracker/wiki service.
    /// Can also be set via ARCHIVIST_REMOTE_URL.
    pub url: Option<String>,
    /// Bearer token for the service.
    /// Can also be set via ARCHIVIST_REMOTE_TOKEN.
    pub token: Option<String>,
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Items requested per page.
    pub page_size: u64,
    /// Pages fetched ahead of processing.
    pub prefetch: usize,
    /// Scopes synced concurrently.
    pub concurrency: usize,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            page_size: 100,
            prefetch: 5,
            concurrency: 2,
        }
    }
}

impl Config {
    /// Load configuration from file, environment and defaults.
    pub fn load() -> anyhow::Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = Self::config_file_path() {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        builder = builder.add_source(File::new("archivist.toml", FileFormat::Toml).required(false));
        builder = builder.add_source(Environment::with_prefix("ARCHIVIST").separator("_"));

        let cfg = builder.build().context("failed to read configuration")?;
        cfg.try_deserialize()
            .context("failed to parse configuration")
    }

    fn config_file_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "archivist").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The database URL to use, creating the default state directory when
    /// needed.
    pub fn database_url(&self) -> anyhow::Result<String> {
        if let Some(url) = &self.database.url {
            return Ok(url.clone());
        }

        let dirs = ProjectDirs::from("", "", "archivist")
            .context("cannot determine a home directory for the default database path")?;
        let state_dir = dirs
            .state_dir()
            .map(PathBuf::from)
            .unwrap_or_else(|| dirs.data_dir().to_path_buf());
        std::fs::create_dir_all(&state_dir)
            .with_context(|| format!("cannot create {}", state_dir.display()))?;

        let db_path = state_dir.join("archivist.db");
        Ok(format!("sqlite://{}?mode=rwc", db_path.display()))
    }

    /// The remote configuration handed to the API client.
    pub fn remote_config(&self) -> anyhow::Result<StaticRemoteConfig> {
        let url = self.remote.url.clone().context(
            "remote URL is not configured; set [remote].url in config.toml \
             or the ARCHIVIST_REMOTE_URL environment variable",
        )?;
        Ok(StaticRemoteConfig::new(url, self.remote.token.clone()))
    }
}

//! Configuration management for revwatch
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (REVWATCH_*)
//! 3. Config file (~/.config/revwatch/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};

use crate::check::{CheckSettings, DELIVERY_INTERVAL, MAX_RESULTS};
use crate::message::LinkContext;
use crate::{Error, Result};

/// Review check configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Time between scheduled passes
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Minimum time between two chat messages, at least one second
    #[serde(with = "humantime_serde")]
    pub delivery_interval: Duration,

    /// Reviews requested per app (the API caps this at 100)
    pub max_results: u32,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15 * 60),
            delivery_interval: DELIVERY_INTERVAL,
            max_results: MAX_RESULTS,
        }
    }
}

/// Console hosting the app documents, used for settings links
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub project_id: Option<String>,
    pub database_id: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database_id: "(default)".to_string(),
        }
    }
}

/// Watermark store location
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to `~/.cache/revwatch/revwatch.db`
    pub path: Option<PathBuf>,
}

/// HTTP trigger settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Google Play Developer API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayConfig {
    pub base_url: String,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://androidpublisher.googleapis.com".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub check: CheckConfig,
    pub console: ConsoleConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub play: PlayConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/revwatch/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("revwatch").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - REVWATCH_INTERVAL: time between scheduled passes (e.g. `15m`)
    /// - REVWATCH_DB_PATH: watermark store file
    /// - REVWATCH_PROJECT_ID / REVWATCH_DATABASE_ID: console identifiers
    /// - REVWATCH_BIND: HTTP trigger address
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(interval) = std::env::var("REVWATCH_INTERVAL") {
            self.check.interval = parse_duration(&interval)?;
        }

        if let Ok(path) = std::env::var("REVWATCH_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(project_id) = std::env::var("REVWATCH_PROJECT_ID") {
            self.console.project_id = Some(project_id);
        }

        if let Ok(database_id) = std::env::var("REVWATCH_DATABASE_ID") {
            self.console.database_id = database_id;
        }

        if let Ok(bind) = std::env::var("REVWATCH_BIND") {
            self.server.bind = bind;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, db_path: Option<PathBuf>, interval: Option<Duration>) -> Self {
        if let Some(path) = db_path {
            self.database.path = Some(path);
        }

        if let Some(interval) = interval {
            self.check.interval = interval;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        db_path: Option<PathBuf>,
        interval: Option<Duration>,
    ) -> Result<Self> {
        let config = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(config
            .with_env_overrides()?
            .with_cli_overrides(db_path, interval)
            .validated())
    }

    fn validated(mut self) -> Self {
        self.check.max_results = self.check.max_results.clamp(1, MAX_RESULTS);
        // Slack drops webhook calls above one per second
        self.check.delivery_interval = self.check.delivery_interval.max(DELIVERY_INTERVAL);
        self
    }

    /// Settings of a check pass derived from this configuration
    pub fn check_settings(&self) -> CheckSettings {
        CheckSettings {
            max_results: self.check.max_results,
            delivery_interval: self.check.delivery_interval,
            links: self.link_context(),
        }
    }

    pub fn link_context(&self) -> LinkContext {
        LinkContext {
            project_id: self
                .console
                .project_id
                .clone()
                .unwrap_or_else(|| "_".to_string()),
            database_id: self.console.database_id.clone(),
        }
    }
}

/// Parse a human readable duration such as `90s` or `15m`
pub fn parse_duration(value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| Error::Config(format!("Invalid duration '{}': {}", value, e)))
}

//! Secrets management for revwatch
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/revwatch/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (SLACK_INCOMING_WEBHOOK, SERVICE_ACCOUNT)
//! 2. Secrets file (~/.config/revwatch/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    pub slack: SlackSecrets,
    pub google: GoogleSecrets,
}

/// Slack incoming webhook
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackSecrets {
    pub webhook_url: Option<String>,
}

/// Google service account used for the Play Developer API
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GoogleSecrets {
    /// Service account key as inline JSON
    pub service_account: Option<String>,
    /// Path to a service account key file
    pub service_account_path: Option<PathBuf>,
}

/// Where the service account key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceAccountKey {
    Json(String),
    File(PathBuf),
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut url) = secrets.slack.webhook_url {
            *url = url.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/revwatch/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("revwatch").join("secrets.toml"))
    }

    /// Slack webhook URL with environment variable override
    ///
    /// Priority: SLACK_INCOMING_WEBHOOK env var > secrets file
    pub fn slack_webhook_url(&self) -> Option<String> {
        if let Some(url) = non_empty_env("SLACK_INCOMING_WEBHOOK") {
            debug!("Using Slack webhook from SLACK_INCOMING_WEBHOOK environment variable");
            return Some(url);
        }

        self.slack
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
    }

    /// Service account key with environment variable override
    ///
    /// Priority: SERVICE_ACCOUNT env var (inline JSON) > inline JSON in the
    /// secrets file > key file path in the secrets file. `None` means the
    /// ambient Google credentials should be used.
    pub fn service_account(&self) -> Option<ServiceAccountKey> {
        if let Some(json) = non_empty_env("SERVICE_ACCOUNT") {
            debug!("Using service account from SERVICE_ACCOUNT environment variable");
            return Some(ServiceAccountKey::Json(json));
        }

        if let Some(json) = self
            .google
            .service_account
            .as_deref()
            .filter(|j| !j.trim().is_empty())
        {
            return Some(ServiceAccountKey::Json(json.to_string()));
        }

        self.google
            .service_account_path
            .clone()
            .map(ServiceAccountKey::File)
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;
        Self::create_template_at(&path)?;
        Ok(path)
    }

    /// Create a template secrets file at `path`, refusing to overwrite
    pub fn create_template_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# revwatch secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[slack]
# Incoming webhook of the channel that receives review notifications
webhook_url = ""

[google]
# Service account with access to the Play Console reply-to-reviews API.
# Either inline the key JSON or point to the key file.
# service_account = '''{ ... }'''
# service_account_path = "/path/to/key.json"
"#;

        std::fs::write(path, template).map_err(Error::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your credentials");

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

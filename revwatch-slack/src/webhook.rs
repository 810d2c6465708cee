//! Slack incoming webhook client

use std::time::Duration;

use async_trait::async_trait;
use revwatch_core::{Message, Notifier, Secrets};
use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// Client for one Slack incoming webhook
///
/// Slack allows roughly one message per second per webhook; callers are
/// responsible for spacing out [`SlackWebhook::send`] calls.
pub struct SlackWebhook {
    http: reqwest::Client,
    url: Url,
}

impl SlackWebhook {
    /// Create a client for the given webhook URL
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url.trim())
            .map_err(|e| Error::Config(format!("Invalid Slack webhook URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported Slack webhook scheme: {}",
                url.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, url })
    }

    /// Create a client from the configured secrets
    ///
    /// URL is loaded from (in priority order):
    /// 1. SLACK_INCOMING_WEBHOOK environment variable
    /// 2. ~/.config/revwatch/secrets.toml
    pub fn from_secrets(secrets: &Secrets) -> Result<Self> {
        let url = secrets.slack_webhook_url().ok_or_else(|| {
            Error::Config(
                "Slack webhook not found. Set SLACK_INCOMING_WEBHOOK environment variable \
                 or add webhook_url to ~/.config/revwatch/secrets.toml"
                    .to_string(),
            )
        })?;
        Self::new(&url)
    }

    /// Post one message
    pub async fn send(&self, message: &Message) -> Result<()> {
        debug!(
            blocks = message.blocks.len(),
            payload = %serde_json::to_string(message).unwrap_or_default(),
            "Posting Slack message"
        );

        let response = self
            .http
            .post(self.url.clone())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Webhook {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl std::fmt::Debug for SlackWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The webhook path is a credential
        f.debug_struct("SlackWebhook")
            .field("host", &self.url.host_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn send(&self, message: &Message) -> revwatch_core::Result<()> {
        SlackWebhook::send(self, message).await?;
        Ok(())
    }
}

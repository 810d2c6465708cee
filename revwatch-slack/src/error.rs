//! Error types for Slack delivery

use thiserror::Error;

/// Result type for Slack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while posting to Slack
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack rejected the message
    #[error("Slack webhook error ({status}): {body}")]
    Webhook { status: u16, body: String },

    /// Missing or malformed webhook URL
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<Error> for revwatch_core::Error {
    fn from(err: Error) -> Self {
        revwatch_core::Error::Notify(err.to_string())
    }
}

//! Error types for Play Developer API operations

use thiserror::Error;

/// Result type for Play Developer API operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the Play Developer API
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials could not be loaded or exchanged for a token
    #[error("Google authentication error: {0}")]
    Auth(String),

    /// The API answered with a non-success status
    #[error("Play API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<gcp_auth::Error> for Error {
    fn from(err: gcp_auth::Error) -> Self {
        Error::Auth(err.to_string())
    }
}

impl From<Error> for revwatch_core::Error {
    fn from(err: Error) -> Self {
        revwatch_core::Error::Source(err.to_string())
    }
}

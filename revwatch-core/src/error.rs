//! Error types for revwatch

use thiserror::Error;

/// Result type alias for revwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for revwatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Watermark store error
    #[error("Store error: {0}")]
    Store(String),

    /// Review source error
    #[error("Review source error: {0}")]
    Source(String),

    /// Notifier delivery error
    #[error("Delivery error: {0}")]
    Notify(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

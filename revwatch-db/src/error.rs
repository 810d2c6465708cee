//! Error types for database operations

use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum Error {
    /// SQLx database error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate key
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for revwatch_core::Error {
    fn from(err: Error) -> Self {
        revwatch_core::Error::Store(err.to_string())
    }
}

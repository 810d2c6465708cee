//! Database layer for revwatch
//!
//! Stores the tracked app documents and their watermarks in SQLite.

pub mod error;
pub mod repos;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use error::{Error, Result};
pub use repos::AppsRepo;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection from a file path
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Io(format!("Failed to create database directory: {}", e)))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::migrated(pool).await
    }

    /// Create an in-memory database for testing
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Get the default database path (~/.cache/revwatch/revwatch.db)
    pub fn default_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| Error::Io("Could not determine cache directory".to_string()))?;
        Ok(cache_dir.join("revwatch").join("revwatch.db"))
    }

    /// Open the database at `path`, or at the default path
    pub async fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::new(path).await,
            None => Self::new(Self::default_path()?).await,
        }
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the tracked apps repository
    pub fn apps(&self) -> AppsRepo {
        AppsRepo::new(self.pool.clone())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let db = Database::new(&db_path).await.unwrap();
        assert!(db_path.exists());
        db.close().await;
    }

    #[tokio::test]
    async fn test_database_migrations() {
        let db = Database::in_memory().await.unwrap();

        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='apps'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::new(&db_path).await.unwrap();
        db.apps()
            .insert("a1", Default::default())
            .await
            .unwrap();
        db.close().await;

        let db = Database::open(Some(&db_path)).await.unwrap();
        assert_eq!(db.apps().list().await.unwrap().len(), 1);
    }
}

//! Repository for tracked app documents

use async_trait::async_trait;
use chrono::Utc;
use revwatch_core::{AppDocument, AppStore, TrackedApp};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::{Error, Result};

const APP_COLUMNS: &str =
    "id, name, icon, package_name, developer_id, application_id, ignored, watermark";

/// Repository for managing tracked apps
#[derive(Clone)]
pub struct AppsRepo {
    pool: SqlitePool,
}

impl AppsRepo {
    /// Create a new repository instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new app, filling every missing field with its default.
    /// New apps start ignored unless the document says otherwise.
    pub async fn insert(&self, id: &str, document: AppDocument) -> Result<TrackedApp> {
        let app = document.sanitize(id);
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO apps (
                id, name, icon, package_name, developer_id, application_id,
                ignored, watermark, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        )
        .bind(&app.id)
        .bind(&app.name)
        .bind(&app.icon)
        .bind(&app.package_name)
        .bind(&app.developer_id)
        .bind(&app.application_id)
        .bind(app.ignored)
        .bind(app.watermark)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::AlreadyExists(format!("App '{}'", id))
            }
            other => Error::Sqlx(other),
        })?;

        debug!(app_id = %app.id, ignored = app.ignored, "Inserted app");
        Ok(app)
    }

    /// List every app, ordered by id
    pub async fn list(&self) -> Result<Vec<TrackedApp>> {
        let rows = sqlx::query(&format!("SELECT {} FROM apps ORDER BY id", APP_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row).collect()
    }

    /// Find an app by id
    pub async fn get(&self, id: &str) -> Result<TrackedApp> {
        let row = sqlx::query(&format!("SELECT {} FROM apps WHERE id = ?1", APP_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("App '{}'", id)))?;

        map_row(&row)
    }

    /// Overwrite the fields present in `document`, keeping the others
    pub async fn update(&self, id: &str, document: AppDocument) -> Result<TrackedApp> {
        let affected = sqlx::query(
            "UPDATE apps SET
                name = COALESCE(?1, name),
                icon = COALESCE(?2, icon),
                package_name = COALESCE(?3, package_name),
                developer_id = COALESCE(?4, developer_id),
                application_id = COALESCE(?5, application_id),
                ignored = COALESCE(?6, ignored),
                watermark = COALESCE(?7, watermark),
                updated_at = ?8
             WHERE id = ?9",
        )
        .bind(document.name)
        .bind(document.icon)
        .bind(document.package_name)
        .bind(document.developer_id)
        .bind(document.application_id)
        .bind(document.ignored)
        .bind(document.watermark)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("App '{}'", id)));
        }

        self.get(id).await
    }

    /// Include or exclude an app from review checks
    pub async fn set_ignored(&self, id: &str, ignored: bool) -> Result<()> {
        let affected = sqlx::query("UPDATE apps SET ignored = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(ignored)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("App '{}'", id)));
        }
        Ok(())
    }

    /// Delete an app
    pub async fn remove(&self, id: &str) -> Result<()> {
        let affected = sqlx::query("DELETE FROM apps WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("App '{}'", id)));
        }
        Ok(())
    }

    /// Raise the watermark of an app; never lowers it.
    ///
    /// A stored value that is not an integer counts as absent. Returns
    /// whether the watermark was written.
    pub async fn advance_watermark(&self, id: &str, watermark: i64) -> Result<bool> {
        let affected = sqlx::query(
            "UPDATE apps SET watermark = ?1, updated_at = ?2
             WHERE id = ?3
               AND (watermark IS NULL OR typeof(watermark) != 'integer' OR watermark < ?1)",
        )
        .bind(watermark)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            // Distinguish a stale write from a missing app
            self.get(id).await?;
            return Ok(false);
        }

        debug!(app_id = %id, watermark, "Stored watermark");
        Ok(true)
    }
}

fn map_row(row: &SqliteRow) -> Result<TrackedApp> {
    Ok(TrackedApp {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        icon: row.try_get("icon")?,
        package_name: row.try_get("package_name")?,
        developer_id: row.try_get("developer_id")?,
        application_id: row.try_get("application_id")?,
        ignored: row.try_get("ignored")?,
        watermark: read_watermark(row),
    })
}

/// Integer watermark, or a numeric string; anything else reads as absent
fn read_watermark(row: &SqliteRow) -> Option<i64> {
    if let Ok(value) = row.try_get::<Option<i64>, _>("watermark") {
        return value;
    }

    row.try_get::<Option<String>, _>("watermark")
        .ok()
        .flatten()
        .and_then(|s| s.trim().parse().ok())
}

#[async_trait]
impl AppStore for AppsRepo {
    async fn list_apps(&self) -> revwatch_core::Result<Vec<TrackedApp>> {
        Ok(self.list().await?)
    }

    async fn advance_watermark(&self, app_id: &str, watermark: i64) -> revwatch_core::Result<bool> {
        Ok(AppsRepo::advance_watermark(self, app_id, watermark).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn repo() -> AppsRepo {
        Database::in_memory().await.unwrap().apps()
    }

    fn document(package: &str) -> AppDocument {
        AppDocument {
            name: Some("Example".to_string()),
            package_name: Some(package.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_applies_defaults() {
        let repo = repo().await;
        let app = repo.insert("a1", AppDocument::default()).await.unwrap();
        assert!(app.ignored);

        let stored = repo.get("a1").await.unwrap();
        assert_eq!(stored, app);
        assert!(stored.package_name.is_none());
        assert!(stored.watermark.is_none());
    }

    #[tokio::test]
    async fn test_insert_keeps_supplied_fields() {
        let repo = repo().await;
        let mut doc = document("com.example");
        doc.ignored = Some(false);
        doc.watermark = Some(42);
        repo.insert("a1", doc).await.unwrap();

        let stored = repo.get("a1").await.unwrap();
        assert!(!stored.ignored);
        assert_eq!(stored.package_name.as_deref(), Some("com.example"));
        assert_eq!(stored.watermark, Some(42));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let repo = repo().await;
        repo.insert("a1", AppDocument::default()).await.unwrap();
        let err = repo.insert("a1", AppDocument::default()).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_list_is_ordered() {
        let repo = repo().await;
        repo.insert("b", AppDocument::default()).await.unwrap();
        repo.insert("a", AppDocument::default()).await.unwrap();

        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_update_and_set_ignored() {
        let repo = repo().await;
        repo.insert("a1", document("com.old")).await.unwrap();

        let updated = repo
            .update(
                "a1",
                AppDocument {
                    package_name: Some("com.new".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.package_name.as_deref(), Some("com.new"));
        assert_eq!(updated.name.as_deref(), Some("Example"));

        repo.set_ignored("a1", false).await.unwrap();
        assert!(!repo.get("a1").await.unwrap().ignored);

        assert!(matches!(
            repo.set_ignored("missing", false).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = repo().await;
        repo.insert("a1", AppDocument::default()).await.unwrap();
        repo.remove("a1").await.unwrap();
        assert!(matches!(repo.get("a1").await, Err(Error::NotFound(_))));
        assert!(repo.remove("a1").await.is_err());
    }

    #[tokio::test]
    async fn test_watermark_only_moves_forward() {
        let repo = repo().await;
        repo.insert("a1", document("com.example")).await.unwrap();

        assert!(repo.advance_watermark("a1", 200).await.unwrap());
        assert!(!repo.advance_watermark("a1", 100).await.unwrap());
        assert!(!repo.advance_watermark("a1", 200).await.unwrap());
        assert_eq!(repo.get("a1").await.unwrap().watermark, Some(200));

        assert!(repo.advance_watermark("a1", 300).await.unwrap());
        assert_eq!(repo.get("a1").await.unwrap().watermark, Some(300));
    }

    #[tokio::test]
    async fn test_watermark_for_missing_app() {
        let repo = repo().await;
        assert!(matches!(
            repo.advance_watermark("missing", 1).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unparseable_watermark_reads_as_absent() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.apps();
        repo.insert("text", document("com.text")).await.unwrap();
        repo.insert("numeric", document("com.numeric")).await.unwrap();

        sqlx::query("UPDATE apps SET watermark = 'yesterday' WHERE id = 'text'")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("UPDATE apps SET watermark = ' 1700 ' WHERE id = 'numeric'")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(repo.get("text").await.unwrap().watermark, None);
        assert_eq!(repo.get("numeric").await.unwrap().watermark, Some(1700));

        // A garbage value is replaced by the first real watermark
        assert!(repo.advance_watermark("text", 5).await.unwrap());
        assert_eq!(repo.get("text").await.unwrap().watermark, Some(5));
    }

    #[tokio::test]
    async fn test_app_store_trait() {
        let repo = repo().await;
        repo.insert("a1", document("com.example")).await.unwrap();

        let store: &dyn AppStore = &repo;
        assert_eq!(store.list_apps().await.unwrap().len(), 1);
        assert!(store.advance_watermark("a1", 10).await.unwrap());
        assert!(store.advance_watermark("zzz", 10).await.is_err());
    }
}

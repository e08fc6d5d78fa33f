//! SQLite seen-set store implementation

use async_trait::async_trait;
use room_watch_domain::{SeenStore, StoreError};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::collections::HashSet;
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// SQLite-backed seen-set store
pub struct SqliteSeenStore {
    pool: SqlitePool,
    location: String,
}

impl SqliteSeenStore {
    /// Open the database, creating it and its schema if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self {
            pool,
            location: db_path.display().to_string(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Read the recorded identifiers without creating the database or its schema
    ///
    /// A missing file or a database without the table yields an empty set.
    pub async fn read_ids(db_path: impl AsRef<Path>) -> Result<HashSet<String>, StoreError> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            return Ok(HashSet::new());
        }

        let location = db_path.display().to_string();
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let table: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'seen_listings'",
        )
        .fetch_optional(&pool)
        .await
        .map_err(|e| StoreError::Corrupt {
            location: location.clone(),
            message: e.to_string(),
        })?;

        let ids = match table {
            Some(_) => {
                let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM seen_listings")
                    .fetch_all(&pool)
                    .await
                    .map_err(|e| StoreError::Database(e.to_string()))?;
                rows.into_iter().map(|(id,)| id).collect()
            }
            None => HashSet::new(),
        };

        pool.close().await;
        Ok(ids)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self {
            pool,
            location: ":memory:".to_string(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        // A file that is not a database fails here, on first touch
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_listings (
                id TEXT PRIMARY KEY,
                recorded_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Corrupt {
            location: self.location.clone(),
            message: e.to_string(),
        })?;

        Ok(())
    }
}

#[async_trait]
impl SeenStore for SqliteSeenStore {
    async fn load(&self) -> Result<HashSet<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM seen_listings")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn append(&self, id: &str) -> Result<(), StoreError> {
        let recorded_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query("INSERT OR IGNORE INTO seen_listings (id, recorded_at) VALUES (?, ?)")
            .bind(id)
            .bind(&recorded_at)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_and_load() {
        let store = SqliteSeenStore::in_memory().await.unwrap();

        store.append("4411").await.unwrap();
        store.append("4412").await.unwrap();

        let ids = store.load().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("4411"));
    }

    #[tokio::test]
    async fn test_duplicate_append_is_ignored() {
        let store = SqliteSeenStore::in_memory().await.unwrap();

        store.append("4411").await.unwrap();
        store.append("4411").await.unwrap();

        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("seen.sqlite");

        let store = SqliteSeenStore::new(&path).await.unwrap();
        store.append("1").await.unwrap();
        drop(store);

        let reopened = SqliteSeenStore::new(&path).await.unwrap();
        assert!(reopened.load().await.unwrap().contains("1"));
    }

    #[tokio::test]
    async fn test_non_database_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.sqlite");
        std::fs::write(&path, "id\n1\n2\n this is a flat file, not a database\n").unwrap();

        let result = SqliteSeenStore::new(&path).await;

        assert!(matches!(
            result,
            Err(StoreError::Corrupt { ref message, .. }) if message.contains("file is not a database")
        ));
    }

    #[tokio::test]
    async fn test_read_ids_does_not_create_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.sqlite");

        assert!(SqliteSeenStore::read_ids(&path).await.unwrap().is_empty());
        assert!(!path.exists());

        let store = SqliteSeenStore::new(&path).await.unwrap();
        store.append("4411").await.unwrap();
        drop(store);

        let ids = SqliteSeenStore::read_ids(&path).await.unwrap();
        assert_eq!(ids, HashSet::from(["4411".to_string()]));
    }
}

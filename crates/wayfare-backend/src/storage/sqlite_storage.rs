//! SQLite document storage implementation
//!
//! Every document is one row keyed by `(collection, id)` holding the JSON text
//! of the document. Rows are listed in rowid order, and upserts keep the rowid,
//! so collections keep the order in which documents were first written.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool, sqlite::SqliteConnectOptions};
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::DocumentStore;
use crate::error::{BackendError, Result};

/// SQLite-based document storage
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `database_url`
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| BackendError::Storage(format!("Invalid database path: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| BackendError::Storage(format!("Failed to connect to SQLite: {}", e)))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create SQLite storage from the `DATABASE_URL` environment variable
    ///
    /// Example: sqlite:./data/wayfare.db
    pub async fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./data/wayfare.db".to_string());

        Self::new(&database_url).await
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,          -- JSON
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| BackendError::Storage(format!("Failed to create documents table: {}", e)))?;

        Ok(())
    }

    fn now() -> Result<String> {
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| BackendError::Storage(format!("Failed to format timestamp: {}", e)))
    }

    fn parse(data: &str) -> Result<Value> {
        serde_json::from_str(data)
            .map_err(|e| BackendError::Storage(format!("Failed to deserialize document: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BackendError::Storage(format!("Failed to get document: {}", e)))?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                Ok(Some(Self::parse(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
        "#,
        )
        .bind(collection)
        .bind(id)
        .bind(document.to_string())
        .bind(Self::now()?)
        .execute(&self.pool)
        .await
        .map_err(|e| BackendError::Storage(format!("Failed to save document: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| BackendError::Storage(format!("Failed to delete document: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let rows = sqlx::query("SELECT data FROM documents WHERE collection = ? ORDER BY rowid")
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BackendError::Storage(format!("Failed to list documents: {}", e)))?;

        rows.iter()
            .map(|row| {
                let data: String = row.get("data");
                Self::parse(&data)
            })
            .collect()
    }

    async fn replace_collection(
        &self,
        collection: &str,
        documents: Vec<(String, Value)>,
    ) -> Result<()> {
        let now = Self::now()?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BackendError::Storage(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(collection)
            .execute(&mut *tx)
            .await
            .map_err(|e| BackendError::Storage(format!("Failed to clear collection: {}", e)))?;

        for (id, document) in documents {
            sqlx::query(
                "INSERT INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(collection)
            .bind(&id)
            .bind(document.to_string())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                BackendError::Storage(format!("Failed to insert document {}: {}", id, e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| BackendError::Storage(format!("Failed to commit collection: {}", e)))?;

        Ok(())
    }
}

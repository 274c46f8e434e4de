//! Durable content history in SQLite. At most five records per content type
//! survive; the trim runs in the same transaction as every insert, so the cap
//! holds even when writers race or crash mid-save.

use crate::error::{Result, StorageError};
use crate::router::ContentType;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Records kept per content type.
pub const MAX_ITEMS_PER_TYPE: i64 = 5;

/// SQLite-backed content history using an sqlx async pool.
pub struct ContentStore {
    pool: SqlitePool,
    db_path: Option<PathBuf>,
}

/// One persisted generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: i64,
    pub session_id: String,
    pub content_type: ContentType,
    pub content: String,
    pub prompt: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_items: i64,
    pub items_by_type: BTreeMap<String, i64>,
    pub latest_entry: Option<String>,
    pub database_size_bytes: u64,
    pub max_items_per_type: i64,
}

impl ContentStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Open(format!("create {}: {e}", parent.display())))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .map_err(|e| StorageError::Open(format!("{}: {e}", path.display())))?;

        let store = Self {
            pool,
            db_path: Some(path.to_path_buf()),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store for tests and ephemeral runs.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StorageError::Open(e.to_string()))?;

        let store = Self {
            pool,
            db_path: None,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS content_history (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 session_id TEXT NOT NULL,
                 content_type TEXT NOT NULL,
                 content TEXT NOT NULL,
                 prompt TEXT,
                 metadata TEXT,
                 created_at TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_content_history_type
                 ON content_history(content_type, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_content_history_session
                 ON content_history(session_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a record and trim its type back to the cap in one transaction.
    /// Returns the new record's id.
    pub async fn save(
        &self,
        session_id: &str,
        content_type: ContentType,
        content: &str,
        prompt: Option<&str>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<i64> {
        let metadata_json = metadata
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::from)?;
        let created_at = Utc::now().to_rfc3339();
        let type_str = content_type.to_string();

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO content_history (session_id, content_type, content, prompt, metadata, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(&type_str)
        .bind(content)
        .bind(prompt)
        .bind(&metadata_json)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        // Survivors are picked by insertion order, not wall clock, so rapid
        // same-timestamp inserts still trim deterministically.
        sqlx::query(
            "DELETE FROM content_history
             WHERE content_type = ?
               AND id NOT IN (
                   SELECT id FROM content_history
                   WHERE content_type = ?
                   ORDER BY created_at DESC, id DESC
                   LIMIT ?
               )",
        )
        .bind(&type_str)
        .bind(&type_str)
        .bind(MAX_ITEMS_PER_TYPE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(inserted.last_insert_rowid())
    }

    /// Most recent records, newest first, optionally filtered by type and
    /// session.
    pub async fn recent(
        &self,
        content_type: Option<ContentType>,
        limit: i64,
        session_id: Option<&str>,
    ) -> Result<Vec<ContentRecord>> {
        let type_str = content_type.map(|ct| ct.to_string());
        let rows = sqlx::query(
            "SELECT id, session_id, content_type, content, prompt, metadata, created_at
             FROM content_history
             WHERE (? IS NULL OR content_type = ?)
               AND (? IS NULL OR session_id = ?)
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(&type_str)
        .bind(&type_str)
        .bind(session_id)
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_record_row).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<ContentRecord>> {
        let row = sqlx::query(
            "SELECT id, session_id, content_type, content, prompt, metadata, created_at
             FROM content_history
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_record_row).transpose()
    }

    /// Distinct content types present, alphabetical.
    pub async fn content_types(&self) -> Result<Vec<ContentType>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT content_type FROM content_history ORDER BY content_type",
        )
        .fetch_all(&self.pool)
        .await?;

        names.iter().map(|name| parse_content_type(name)).collect()
    }

    pub async fn count(&self, content_type: Option<ContentType>) -> Result<i64> {
        let type_str = content_type.map(|ct| ct.to_string());
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM content_history
             WHERE (? IS NULL OR content_type = ?)",
        )
        .bind(&type_str)
        .bind(&type_str)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content_history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove everything. Returns how many records were deleted.
    pub async fn clear_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM content_history")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn clear_type(&self, content_type: ContentType) -> Result<u64> {
        let result = sqlx::query("DELETE FROM content_history WHERE content_type = ?")
            .bind(content_type.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Case-insensitive substring search over stored content, newest first.
    pub async fn search(
        &self,
        term: &str,
        content_type: Option<ContentType>,
        limit: i64,
    ) -> Result<Vec<ContentRecord>> {
        let pattern = format!("%{term}%");
        let type_str = content_type.map(|ct| ct.to_string());
        let rows = sqlx::query(
            "SELECT id, session_id, content_type, content, prompt, metadata, created_at
             FROM content_history
             WHERE content LIKE ?
               AND (? IS NULL OR content_type = ?)
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(&pattern)
        .bind(&type_str)
        .bind(&type_str)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_record_row).collect()
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_history")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            "SELECT content_type, COUNT(*) AS cnt
             FROM content_history
             GROUP BY content_type",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_type = BTreeMap::new();
        for row in &rows {
            let name: String = row.try_get("content_type")?;
            let count: i64 = row.try_get("cnt")?;
            items_by_type.insert(name, count);
        }

        let latest_entry: Option<String> = sqlx::query_scalar(
            "SELECT created_at FROM content_history
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let database_size_bytes = match &self.db_path {
            Some(path) => tokio::fs::metadata(path)
                .await
                .map(|meta| meta.len())
                .unwrap_or(0),
            None => 0,
        };

        Ok(StoreStats {
            total_items: total,
            items_by_type,
            latest_entry,
            database_size_bytes,
            max_items_per_type: MAX_ITEMS_PER_TYPE,
        })
    }
}

fn parse_content_type(value: &str) -> Result<ContentType> {
    value
        .parse()
        .map_err(|_| StorageError::UnknownContentType(value.to_string()).into())
}

fn map_record_row(row: &SqliteRow) -> Result<ContentRecord> {
    let type_raw: String = row.try_get("content_type")?;
    let metadata_raw: Option<String> = row.try_get("metadata")?;
    let metadata = metadata_raw
        .map(|value| serde_json::from_str::<serde_json::Value>(&value))
        .transpose()
        .map_err(StorageError::from)?;

    Ok(ContentRecord {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        content_type: parse_content_type(&type_raw)?,
        content: row.try_get("content")?,
        prompt: row.try_get("prompt")?,
        metadata,
        created_at: row.try_get("created_at")?,
    })
}

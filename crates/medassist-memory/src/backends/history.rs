//! HistoryStore: SQLite persistence for long-term conversation history.
//!
//! Table: `memory_records`. Content and metadata are stored as JSON text.

use super::{by_relevance, generated_key};
use crate::backend::MemoryBackend;
use crate::error::{Error, Result};
use crate::scorer::term_overlap_score;
use crate::types::{MemoryKind, MemoryQueryResult, MemoryRecord, NewRecord, SearchFilters};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rows scanned per search, newest first.
pub const DEFAULT_SCAN_WINDOW: u32 = 500;

/// SQLite-backed history store.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
    scan_window: u32,
}

impl HistoryStore {
    /// Open (or create) a history store at the given path.
    pub async fn from_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Internal(format!("mkdir: {e}")))?;
        }
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;

        let store = Self {
            pool,
            scan_window: DEFAULT_SCAN_WINDOW,
        };
        store.run_migrations().await?;
        info!("History store initialized at {}", db_path.display());
        Ok(store)
    }

    /// In-memory store (for tests).
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self {
            pool,
            scan_window: DEFAULT_SCAN_WINDOW,
        };
        store.run_migrations().await?;
        debug!("In-memory history store initialized");
        Ok(store)
    }

    /// Override how many recent rows a search scans.
    #[must_use]
    pub fn with_scan_window(mut self, rows: u32) -> Self {
        self.scan_window = rows.max(1);
        self
    }

    // ── Migrations ──────────────────────────────────────────────

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS memory_records (
                key             TEXT PRIMARY KEY,
                conversation_id TEXT,
                content         TEXT NOT NULL,
                metadata        TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_conversation
             ON memory_records(conversation_id, updated_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_updated
             ON memory_records(updated_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Records ─────────────────────────────────────────────────

    /// Total number of records stored.
    pub async fn record_count(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM memory_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i32, _>("cnt")? as u32)
    }

    async fn recent_rows(&self, conversation_id: Option<&str>) -> Result<Vec<MemoryRecord>> {
        let rows = match conversation_id {
            Some(conversation_id) => {
                sqlx::query(
                    "SELECT * FROM memory_records WHERE conversation_id = ?1
                     ORDER BY updated_at DESC LIMIT ?2",
                )
                .bind(conversation_id)
                .bind(self.scan_window)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM memory_records ORDER BY updated_at DESC LIMIT ?1")
                    .bind(self.scan_window)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::row_to_record).collect()
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryRecord> {
        let content: String = row.try_get("content")?;
        let metadata: String = row.try_get("metadata")?;
        let created_str: String = row.try_get("created_at")?;
        let updated_str: String = row.try_get("updated_at")?;
        Ok(MemoryRecord {
            key: row.try_get("key")?,
            content: serde_json::from_str(&content)?,
            metadata: serde_json::from_str(&metadata)?,
            conversation_id: row.try_get("conversation_id")?,
            created_at: parse_timestamp(&created_str),
            updated_at: parse_timestamp(&updated_str),
        })
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    // fixed width so lexical order matches time order
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl MemoryBackend for HistoryStore {
    fn kind(&self) -> MemoryKind {
        MemoryKind::LongTermHistory
    }

    fn name(&self) -> &str {
        "history-store"
    }

    async fn store(&self, key: Option<String>, entry: NewRecord) -> Result<String> {
        let key = key.unwrap_or_else(|| generated_key(MemoryKind::LongTermHistory));
        let now = format_timestamp(Utc::now());

        sqlx::query(
            "INSERT INTO memory_records
             (key, conversation_id, content, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(key) DO UPDATE SET
                conversation_id = excluded.conversation_id,
                content = excluded.content,
                metadata = excluded.metadata,
                updated_at = excluded.updated_at",
        )
        .bind(&key)
        .bind(&entry.conversation_id)
        .bind(serde_json::to_string(&entry.content)?)
        .bind(serde_json::to_string(&entry.metadata)?)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(key)
    }

    async fn retrieve(&self, key: &str) -> Result<Option<MemoryRecord>> {
        let row = sqlx::query("SELECT * FROM memory_records WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<MemoryQueryResult>> {
        let records = self.recent_rows(filters.conversation_id.as_deref()).await?;

        let mut hits: Vec<MemoryQueryResult> = records
            .into_iter()
            .filter_map(|record| {
                let score = term_overlap_score(query, &record.content.search_text());
                (score > 0.0).then(|| MemoryQueryResult::new(record, score))
            })
            .collect();
        hits.sort_by(by_relevance);
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM memory_records WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "History store health check failed");
                false
            }
        }
    }
}

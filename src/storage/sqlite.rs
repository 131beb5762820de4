//! SQLite Storage Implementation
//!
//! Provides persistent strike storage using SQLite with WAL mode for crash
//! safety. All statements for one operation run inside a single transaction
//! on a connection guarded by a mutex, so operations on the same item are
//! serialized.

use super::{StrikeRecord, StrikeStore, TrackedItem};
use crate::error::{Result, WardenError};
use crate::protocol::{normalize_hash, StrikeKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// SQLite-based strike store
pub struct SqliteStrikeStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStrikeStore {
    /// Create a new SQLite store at the given path
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    WardenError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let path = path.to_path_buf();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&path)?;

            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;

            migrate(&conn)?;

            Ok(conn)
        })
        .await
        .map_err(|e| WardenError::Database(format!("Failed to initialize database: {}", e)))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory SQLite database (for testing)
    pub async fn in_memory() -> Result<Self> {
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open_in_memory()?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            migrate(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|e| {
            WardenError::Database(format!("Failed to create in-memory database: {}", e))
        })??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Current schema version, bump when adding migrations
const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Database schema v1
const SCHEMA_V1: &str = r#"
-- One row per item identity that has ever been struck
CREATE TABLE IF NOT EXISTS download_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hash TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Append-only strikes; deleted per (item, kind) on reset
CREATE TABLE IF NOT EXISTS strikes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    download_item_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    created_at TEXT NOT NULL,
    last_downloaded_bytes INTEGER,

    FOREIGN KEY (download_item_id) REFERENCES download_items(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_strikes_item_kind ON strikes(download_item_id, kind);
"#;

/// Run schema migrations to bring the database up to `CURRENT_SCHEMA_VERSION`.
///
/// Uses SQLite's `PRAGMA user_version` to track the current version. Calling
/// it on an already-current database is a no-op.
fn migrate(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    debug_assert_eq!(
        conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?,
        CURRENT_SCHEMA_VERSION
    );

    Ok(())
}

#[async_trait]
impl StrikeStore for SqliteStrikeStore {
    async fn record_strike(
        &self,
        hash: &str,
        title: &str,
        kind: StrikeKind,
        last_downloaded_bytes: Option<u64>,
    ) -> Result<u32> {
        let conn = self.conn.clone();
        let hash = normalize_hash(hash);
        let title = title.to_string();

        tokio::task::spawn_blocking(move || -> Result<u32> {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction()?;
            let now = Utc::now().to_rfc3339();

            tx.execute(
                r#"
                INSERT INTO download_items (hash, title, created_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(hash) DO UPDATE SET title = excluded.title
                WHERE download_items.title <> excluded.title
                "#,
                params![hash, title, now],
            )?;

            let item_id: i64 = tx.query_row(
                "SELECT id FROM download_items WHERE hash = ?1",
                params![hash],
                |row| row.get(0),
            )?;

            tx.execute(
                r#"
                INSERT INTO strikes (download_item_id, kind, created_at, last_downloaded_bytes)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    item_id,
                    kind.as_str(),
                    now,
                    last_downloaded_bytes.map(|b| b as i64),
                ],
            )?;

            let count: u32 = tx.query_row(
                "SELECT COUNT(*) FROM strikes WHERE download_item_id = ?1 AND kind = ?2",
                params![item_id, kind.as_str()],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok(count)
        })
        .await
        .map_err(|e| WardenError::Database(format!("Failed to record strike: {}", e)))?
    }

    async fn count_strikes(&self, hash: &str, kind: StrikeKind) -> Result<u32> {
        let conn = self.conn.clone();
        let hash = normalize_hash(hash);

        tokio::task::spawn_blocking(move || -> Result<u32> {
            let conn = conn.blocking_lock();
            let count: u32 = conn.query_row(
                r#"
                SELECT COUNT(*)
                FROM strikes s
                JOIN download_items d ON d.id = s.download_item_id
                WHERE d.hash = ?1 AND s.kind = ?2
                "#,
                params![hash, kind.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(|e| WardenError::Database(format!("Failed to count strikes: {}", e)))?
    }

    async fn reset_strikes(&self, hash: &str, kind: StrikeKind) -> Result<u64> {
        let conn = self.conn.clone();
        let hash = normalize_hash(hash);

        tokio::task::spawn_blocking(move || -> Result<u64> {
            let conn = conn.blocking_lock();
            let deleted = conn.execute(
                r#"
                DELETE FROM strikes
                WHERE kind = ?2
                  AND download_item_id = (SELECT id FROM download_items WHERE hash = ?1)
                "#,
                params![hash, kind.as_str()],
            )?;
            Ok(deleted as u64)
        })
        .await
        .map_err(|e| WardenError::Database(format!("Failed to reset strikes: {}", e)))?
    }

    async fn strikes_for(&self, hash: &str) -> Result<Vec<StrikeRecord>> {
        let conn = self.conn.clone();
        let hash = normalize_hash(hash);

        tokio::task::spawn_blocking(move || -> Result<Vec<StrikeRecord>> {
            let conn = conn.blocking_lock();

            let mut stmt = conn.prepare(
                r#"
                SELECT s.kind, s.created_at, s.last_downloaded_bytes
                FROM strikes s
                JOIN download_items d ON d.id = s.download_item_id
                WHERE d.hash = ?1
                ORDER BY s.id
                "#,
            )?;

            let iter = stmt.query_map(params![hash], row_to_strike)?;

            let mut results = Vec::new();
            for strike in iter {
                if let Some(strike) = strike? {
                    results.push(strike);
                }
            }

            Ok(results)
        })
        .await
        .map_err(|e| WardenError::Database(format!("Failed to load strikes: {}", e)))?
    }

    async fn tracked_item(&self, hash: &str) -> Result<Option<TrackedItem>> {
        let conn = self.conn.clone();
        let hash = normalize_hash(hash);

        tokio::task::spawn_blocking(move || -> Result<Option<TrackedItem>> {
            let conn = conn.blocking_lock();
            let item = conn
                .query_row(
                    "SELECT hash, title FROM download_items WHERE hash = ?1",
                    params![hash],
                    |row| {
                        Ok(TrackedItem {
                            hash: row.get(0)?,
                            title: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(item)
        })
        .await
        .map_err(|e| WardenError::Database(format!("Failed to load tracked item: {}", e)))?
    }

    async fn health_check(&self) -> Result<()> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = conn.blocking_lock();
            let _: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            Ok(())
        })
        .await
        .map_err(|e| WardenError::Database(format!("Health check failed: {}", e)))?
    }
}

/// Convert a database row to a StrikeRecord.
///
/// Rows with an unknown kind (written by a newer schema) are skipped with a
/// warning rather than failing the whole read.
fn row_to_strike(row: &rusqlite::Row<'_>) -> rusqlite::Result<Option<StrikeRecord>> {
    let kind_str: String = row.get(0)?;
    let created_at_str: String = row.get(1)?;
    let last_downloaded_bytes: Option<i64> = row.get(2)?;

    let kind = match kind_str.parse::<StrikeKind>() {
        Ok(kind) => kind,
        Err(_) => {
            tracing::warn!("Unknown strike kind '{}' in strike table, skipping", kind_str);
            return Ok(None);
        }
    };

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Some(StrikeRecord {
        kind,
        created_at,
        last_downloaded_bytes: last_downloaded_bytes.map(|b| b as u64),
    }))
}

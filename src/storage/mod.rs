//! Storage Module
//!
//! Durable strike accounting. The warden is the sole writer of two record
//! kinds: one tracking record per item identity, and an append-only list of
//! strikes per item, each tagged with its kind. Uses SQLite with WAL mode
//! for crash-safe atomic commits.

#[cfg(feature = "storage")]
pub mod sqlite;

#[cfg(feature = "storage")]
pub use sqlite::SqliteStrikeStore;

use crate::error::Result;
use crate::protocol::{normalize_hash, StrikeKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parent record for an item that has been struck at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedItem {
    /// Normalized (lower-case) identity hash
    pub hash: String,
    /// Last seen display name
    pub title: String,
}

/// A single recorded strike
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeRecord {
    pub kind: StrikeKind,
    pub created_at: DateTime<Utc>,
    /// Downloaded bytes observed when the strike was issued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_downloaded_bytes: Option<u64>,
}

/// Storage trait for strike accounting
///
/// Every method must be atomic with respect to other calls for the same
/// `(hash, kind)` pair; `record_strike` in particular must append and count
/// in one step so concurrent passes never read a stale count.
#[async_trait]
pub trait StrikeStore: Send + Sync {
    /// Upsert the tracking record, append one strike and return the new
    /// number of strikes of `kind` for `hash`
    async fn record_strike(
        &self,
        hash: &str,
        title: &str,
        kind: StrikeKind,
        last_downloaded_bytes: Option<u64>,
    ) -> Result<u32>;

    /// Count strikes of one kind for an item
    async fn count_strikes(&self, hash: &str, kind: StrikeKind) -> Result<u32>;

    /// Delete all strikes of one kind for an item, returning how many went
    async fn reset_strikes(&self, hash: &str, kind: StrikeKind) -> Result<u64>;

    /// All strikes for an item, oldest first
    async fn strikes_for(&self, hash: &str) -> Result<Vec<StrikeRecord>>;

    /// Load the tracking record for an item
    async fn tracked_item(&self, hash: &str) -> Result<Option<TrackedItem>>;

    /// Check if the store is healthy
    async fn health_check(&self) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    items: HashMap<String, TrackedItem>,
    strikes: HashMap<String, Vec<StrikeRecord>>,
}

/// In-memory strike store, used when no database is configured and in tests
#[derive(Debug, Default)]
pub struct MemoryStrikeStore {
    state: parking_lot::RwLock<MemoryState>,
}

impl MemoryStrikeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn count_kind(records: Option<&Vec<StrikeRecord>>, kind: StrikeKind) -> u32 {
    records
        .map(|records| records.iter().filter(|s| s.kind == kind).count() as u32)
        .unwrap_or(0)
}

#[async_trait]
impl StrikeStore for MemoryStrikeStore {
    async fn record_strike(
        &self,
        hash: &str,
        title: &str,
        kind: StrikeKind,
        last_downloaded_bytes: Option<u64>,
    ) -> Result<u32> {
        let hash = normalize_hash(hash);
        let mut state = self.state.write();

        state
            .items
            .entry(hash.clone())
            .and_modify(|item| {
                if item.title != title {
                    item.title = title.to_string();
                }
            })
            .or_insert_with(|| TrackedItem {
                hash: hash.clone(),
                title: title.to_string(),
            });

        let records = state.strikes.entry(hash).or_default();
        records.push(StrikeRecord {
            kind,
            created_at: Utc::now(),
            last_downloaded_bytes,
        });

        Ok(count_kind(Some(records), kind))
    }

    async fn count_strikes(&self, hash: &str, kind: StrikeKind) -> Result<u32> {
        let state = self.state.read();
        Ok(count_kind(state.strikes.get(&normalize_hash(hash)), kind))
    }

    async fn reset_strikes(&self, hash: &str, kind: StrikeKind) -> Result<u64> {
        let mut state = self.state.write();
        let Some(records) = state.strikes.get_mut(&normalize_hash(hash)) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|s| s.kind != kind);
        Ok((before - records.len()) as u64)
    }

    async fn strikes_for(&self, hash: &str) -> Result<Vec<StrikeRecord>> {
        let state = self.state.read();
        Ok(state
            .strikes
            .get(&normalize_hash(hash))
            .cloned()
            .unwrap_or_default())
    }

    async fn tracked_item(&self, hash: &str) -> Result<Option<TrackedItem>> {
        Ok(self.state.read().items.get(&normalize_hash(hash)).cloned())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

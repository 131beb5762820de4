//! Strike ledger
//!
//! Durable per-(item, kind) strike counters with an explicit reset, plus a
//! registry of items that keep getting struck after reaching their limit.

use crate::error::Result;
use crate::protocol::{normalize_hash, StrikeEvent, StrikeKind};
use crate::storage::StrikeStore;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Items struck past their limit more than once, keyed by normalized hash.
///
/// Owned by whoever builds the [`Striker`] and shared by handle, so tests and
/// separate engines never see each other's entries.
#[derive(Debug, Default)]
pub struct RecurringItems {
    hashes: RwLock<HashSet<String>>,
}

impl RecurringItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hash; returns false if it was already present
    pub fn insert(&self, hash: &str) -> bool {
        self.hashes.write().insert(normalize_hash(hash))
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.read().contains(&normalize_hash(hash))
    }

    pub fn len(&self) -> usize {
        self.hashes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.read().is_empty()
    }

    /// Copy of the current entries, sorted
    pub fn snapshot(&self) -> Vec<String> {
        let mut hashes: Vec<String> = self.hashes.read().iter().cloned().collect();
        hashes.sort();
        hashes
    }
}

/// Strike ledger over a [`StrikeStore`]
pub struct Striker {
    store: Arc<dyn StrikeStore>,
    recurring: Arc<RecurringItems>,
    event_tx: broadcast::Sender<StrikeEvent>,
}

impl Striker {
    /// Create a striker; `event_capacity` bounds the event broadcast buffer
    pub fn new(
        store: Arc<dyn StrikeStore>,
        recurring: Arc<RecurringItems>,
        event_capacity: usize,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            store,
            recurring,
            event_tx,
        }
    }

    /// Subscribe to strike events
    pub fn subscribe(&self) -> broadcast::Receiver<StrikeEvent> {
        self.event_tx.subscribe()
    }

    /// Registry of items struck past their limit
    pub fn recurring(&self) -> &Arc<RecurringItems> {
        &self.recurring
    }

    /// Underlying strike store
    pub fn store(&self) -> &Arc<dyn StrikeStore> {
        &self.store
    }

    /// Record one strike and report whether the limit has been reached.
    ///
    /// A `max_strikes` of zero disables strikes for the rule: nothing is
    /// written and the limit is never reached.
    pub async fn strike_and_check_limit(
        &self,
        hash: &str,
        name: &str,
        max_strikes: u32,
        kind: StrikeKind,
    ) -> Result<bool> {
        self.strike_with_payload(hash, name, max_strikes, kind, None)
            .await
    }

    /// Same as [`strike_and_check_limit`](Self::strike_and_check_limit),
    /// storing the downloaded byte count observed with the strike
    pub async fn strike_with_payload(
        &self,
        hash: &str,
        name: &str,
        max_strikes: u32,
        kind: StrikeKind,
        last_downloaded_bytes: Option<u64>,
    ) -> Result<bool> {
        if max_strikes == 0 {
            return Ok(false);
        }

        let hash = normalize_hash(hash);
        let count = self
            .store
            .record_strike(&hash, name, kind, last_downloaded_bytes)
            .await?;

        tracing::info!(
            hash = %hash,
            name,
            kind = %kind,
            count,
            max_strikes,
            "Item struck"
        );

        let limit_reached = count >= max_strikes;

        // Reaching the limit once is expected; striking past it means the
        // item survived a removal decision and came back.
        if count > max_strikes && self.recurring.insert(&hash) {
            tracing::info!(hash = %hash, name, kind = %kind, "Item marked as recurring");
        }

        let event = if limit_reached {
            StrikeEvent::LimitReached {
                hash,
                name: name.to_string(),
                kind,
                count,
                max_strikes,
            }
        } else {
            StrikeEvent::Struck {
                hash,
                name: name.to_string(),
                kind,
                count,
                max_strikes,
            }
        };
        // No subscribers is fine
        let _ = self.event_tx.send(event);

        Ok(limit_reached)
    }

    /// Forgive all strikes of one kind for an item. Resetting an item that
    /// was never struck is a no-op.
    pub async fn reset_strike(&self, hash: &str, name: &str, kind: StrikeKind) -> Result<()> {
        let hash = normalize_hash(hash);
        let removed = self.store.reset_strikes(&hash, kind).await?;

        if removed > 0 {
            tracing::debug!(hash = %hash, name, kind = %kind, removed, "Strikes reset");
            let _ = self.event_tx.send(StrikeEvent::Reset {
                hash,
                name: name.to_string(),
                kind,
            });
        }

        Ok(())
    }

    /// Current strike count for one kind
    pub async fn strike_count(&self, hash: &str, kind: StrikeKind) -> Result<u32> {
        self.store.count_strikes(hash, kind).await
    }
}

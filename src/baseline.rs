//! Progress baselines
//!
//! Per-item state remembered between polling passes: the downloaded byte
//! count last seen by the stall policy, and which slow condition was active
//! on the previous pass. The cache is bounded by capacity and by time since
//! last touch, and callers can drop identities that left the queue.

use crate::protocol::{normalize_hash, StrikeKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Policy a baseline belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Stall,
    Slow,
}

/// Remembered observation for one (item, policy) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    /// Downloaded bytes at the last reset or first sighting
    Downloaded(u64),
    /// Slow condition that was active on the previous pass
    ConditionActive(StrikeKind),
}

#[derive(Debug)]
struct Entry {
    value: Baseline,
    touched: Instant,
}

/// Bounded cache of baselines keyed by (normalized hash, policy)
#[derive(Debug)]
pub struct ProgressBaselines {
    entries: Mutex<HashMap<(String, PolicyKind), Entry>>,
    capacity: usize,
    ttl: Duration,
}

impl ProgressBaselines {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Current baseline, if one is cached and not expired
    pub fn get(&self, hash: &str, policy: PolicyKind) -> Option<Baseline> {
        let now = Instant::now();
        let entries = self.entries.lock();
        entries
            .get(&(normalize_hash(hash), policy))
            .filter(|entry| now.duration_since(entry.touched) <= self.ttl)
            .map(|entry| entry.value)
    }

    /// Atomically read and replace a baseline.
    ///
    /// `f` receives the current value and returns the value to store (`None`
    /// removes the entry) together with a result handed back to the caller.
    /// Concurrent updates of the same key are serialized.
    pub fn update<T, F>(&self, hash: &str, policy: PolicyKind, f: F) -> T
    where
        F: FnOnce(Option<Baseline>) -> (Option<Baseline>, T),
    {
        self.update_at(Instant::now(), hash, policy, f)
    }

    fn update_at<T, F>(&self, now: Instant, hash: &str, policy: PolicyKind, f: F) -> T
    where
        F: FnOnce(Option<Baseline>) -> (Option<Baseline>, T),
    {
        let key = (normalize_hash(hash), policy);
        let mut entries = self.entries.lock();

        let current = entries
            .get(&key)
            .filter(|entry| now.duration_since(entry.touched) <= self.ttl)
            .map(|entry| entry.value);

        let (next, result) = f(current);

        match next {
            Some(value) => {
                if !entries.contains_key(&key) && entries.len() >= self.capacity {
                    self.make_room(&mut entries, now);
                }
                entries.insert(
                    key,
                    Entry {
                        value,
                        touched: now,
                    },
                );
            }
            None => {
                entries.remove(&key);
            }
        }

        result
    }

    /// Drop expired entries, then the least recently touched one if still full
    fn make_room(&self, entries: &mut HashMap<(String, PolicyKind), Entry>, now: Instant) {
        entries.retain(|_, entry| now.duration_since(entry.touched) <= self.ttl);

        if entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                tracing::debug!(hash = %key.0, "Evicting progress baseline");
                entries.remove(&key);
            }
        }
    }

    /// Forget every baseline for an item
    pub fn forget(&self, hash: &str) {
        let hash = normalize_hash(hash);
        self.entries.lock().retain(|(h, _), _| *h != hash);
    }

    /// Keep only baselines for the given items, e.g. those still queued
    pub fn retain<'a, I>(&self, hashes: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: std::collections::HashSet<String> =
            hashes.into_iter().map(normalize_hash).collect();
        self.entries.lock().retain(|(h, _), _| keep.contains(h));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ProgressBaselines {
        ProgressBaselines::new(100, Duration::from_secs(3600))
    }

    #[test]
    fn test_update_and_get() {
        let cache = cache();
        assert_eq!(cache.get("abc", PolicyKind::Stall), None);

        let seen = cache.update("ABC", PolicyKind::Stall, |current| {
            (Some(Baseline::Downloaded(10)), current)
        });
        assert_eq!(seen, None);
        assert_eq!(cache.get("abc", PolicyKind::Stall), Some(Baseline::Downloaded(10)));
        assert_eq!(cache.get("abc", PolicyKind::Slow), None);
    }

    #[test]
    fn test_update_none_removes() {
        let cache = cache();
        cache.update("abc", PolicyKind::Slow, |_| {
            (Some(Baseline::ConditionActive(StrikeKind::SlowSpeed)), ())
        });
        cache.update("abc", PolicyKind::Slow, |_| (None, ()));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ProgressBaselines::new(2, Duration::from_secs(3600));
        let start = Instant::now();

        cache.update_at(start, "a", PolicyKind::Stall, |_| (Some(Baseline::Downloaded(1)), ()));
        cache.update_at(start + Duration::from_secs(1), "b", PolicyKind::Stall, |_| {
            (Some(Baseline::Downloaded(2)), ())
        });
        cache.update_at(start + Duration::from_secs(2), "c", PolicyKind::Stall, |_| {
            (Some(Baseline::Downloaded(3)), ())
        });

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", PolicyKind::Stall), None);
        assert_eq!(cache.get("c", PolicyKind::Stall), Some(Baseline::Downloaded(3)));
    }

    #[test]
    fn test_expired_entries_are_invisible() {
        let cache = ProgressBaselines::new(10, Duration::from_secs(60));
        let start = Instant::now();

        cache.update_at(start, "a", PolicyKind::Stall, |_| (Some(Baseline::Downloaded(1)), ()));
        let seen = cache.update_at(start + Duration::from_secs(61), "a", PolicyKind::Stall, |current| {
            (current, current)
        });
        assert_eq!(seen, None);
    }

    #[test]
    fn test_forget_and_retain() {
        let cache = cache();
        for hash in ["a", "b", "c"] {
            cache.update(hash, PolicyKind::Stall, |_| (Some(Baseline::Downloaded(0)), ()));
            cache.update(hash, PolicyKind::Slow, |_| {
                (Some(Baseline::ConditionActive(StrikeKind::SlowTime)), ())
            });
        }

        cache.forget("A");
        assert_eq!(cache.len(), 4);

        cache.retain(["c"]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("c", PolicyKind::Stall).is_some());
        assert!(cache.get("b", PolicyKind::Stall).is_none());
    }
}

//! Queue item snapshots
//!
//! A snapshot is built fresh by a torrent-client adapter on every polling
//! pass and is read-only to the warden.

use super::types::PrivacyType;
use serde::{Deserialize, Serialize};

/// Read-only view of a torrent in a download client's queue
pub trait TorrentItem: Send + Sync {
    /// Info hash identifying the torrent (case-insensitive)
    fn hash(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;

    /// Whether the torrent only talks to private trackers
    fn is_private(&self) -> bool;

    /// Total size in bytes
    fn size(&self) -> u64;

    /// Completion percentage (0.0 - 100.0)
    fn completion_percentage(&self) -> f64;

    /// Cumulative bytes downloaded
    fn downloaded_bytes(&self) -> u64;

    /// Current download speed in bytes/sec
    fn download_speed(&self) -> u64;

    /// Estimated time remaining in seconds
    fn eta_seconds(&self) -> u64;

    /// Announce URLs
    fn trackers(&self) -> &[String];

    fn privacy(&self) -> PrivacyType {
        PrivacyType::from_private_flag(self.is_private())
    }
}

/// Plain snapshot of a queue item, as produced by client adapters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueItem {
    pub hash: String,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    pub size: u64,
    pub completion_percentage: f64,
    pub downloaded_bytes: u64,
    pub download_speed: u64,
    pub eta_seconds: u64,
    #[serde(default)]
    pub trackers: Vec<String>,
}

impl QueueItem {
    pub fn new(hash: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }

    pub fn completion(mut self, percentage: f64) -> Self {
        self.completion_percentage = percentage;
        self
    }

    pub fn downloaded(mut self, bytes: u64) -> Self {
        self.downloaded_bytes = bytes;
        self
    }

    pub fn speed(mut self, bytes_per_sec: u64) -> Self {
        self.download_speed = bytes_per_sec;
        self
    }

    pub fn eta(mut self, seconds: u64) -> Self {
        self.eta_seconds = seconds;
        self
    }
}

impl TorrentItem for QueueItem {
    fn hash(&self) -> &str {
        &self.hash
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_private(&self) -> bool {
        self.is_private
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn completion_percentage(&self) -> f64 {
        self.completion_percentage
    }

    fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes
    }

    fn download_speed(&self) -> u64 {
        self.download_speed
    }

    fn eta_seconds(&self) -> u64 {
        self.eta_seconds
    }

    fn trackers(&self) -> &[String] {
        &self.trackers
    }
}

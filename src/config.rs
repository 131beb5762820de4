//! Warden configuration
//!
//! This module contains all configuration options for the strike engine.

use crate::error::{Result, WardenError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the warden
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Database path for strike persistence (None = in-memory only)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Maximum number of cached progress baselines
    #[serde(default = "default_baseline_capacity")]
    pub baseline_capacity: usize,

    /// Seconds a baseline survives without being touched
    #[serde(default = "default_baseline_ttl_secs")]
    pub baseline_ttl_secs: u64,

    /// Buffered strike events per subscriber before lagging
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_baseline_capacity() -> usize {
    10_000
}

fn default_baseline_ttl_secs() -> u64 {
    24 * 60 * 60 // 1 day
}

fn default_event_channel_capacity() -> usize {
    256
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            baseline_capacity: default_baseline_capacity(),
            baseline_ttl_secs: default_baseline_ttl_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl WardenConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist strikes in the SQLite database at `path`
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Persist strikes in the platform data directory
    pub fn default_database(self) -> Self {
        self.database_path(Self::default_database_path())
    }

    /// Set the baseline cache capacity
    pub fn baseline_capacity(mut self, capacity: usize) -> Self {
        self.baseline_capacity = capacity;
        self
    }

    /// Set the baseline time-to-live
    pub fn baseline_ttl(mut self, ttl: Duration) -> Self {
        self.baseline_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the strike event buffer size
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    pub fn baseline_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.baseline_ttl_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.baseline_capacity == 0 {
            return Err(WardenError::invalid_input(
                "baseline_capacity",
                "Must be at least 1",
            ));
        }

        if self.baseline_ttl_secs == 0 {
            return Err(WardenError::invalid_input(
                "baseline_ttl_secs",
                "Must be at least 1 second",
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(WardenError::invalid_input(
                "event_channel_capacity",
                "Must be at least 1",
            ));
        }

        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(WardenError::invalid_input(
                    "database_path",
                    "Must not be empty",
                ));
            }
        }

        Ok(())
    }

    /// Default on-disk location of the strike database
    pub fn default_database_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("queue-warden")
            .join("strikes.db")
    }
}

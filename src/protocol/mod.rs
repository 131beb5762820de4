//! Protocol types for queue-warden
//!
//! This module contains all types that cross the warden boundary:
//! - Queue item snapshots supplied by client adapters
//! - Stall and slow rules supplied by the configuration layer
//! - Decisions, validation results and coverage gaps returned to callers
//! - Strike events emitted for notification collaborators
//!
//! These types are designed for serialization and can be used for IPC,
//! RPC, or any message-passing interface.

mod decision;
mod events;
mod item;
mod rules;
mod types;

// Re-export all protocol types
pub use decision::{CoverageGap, EvaluationResult, IntervalConflict, ValidationResult};
pub use events::StrikeEvent;
pub use item::{QueueItem, TorrentItem};
pub use rules::{QueueRule, SlowRule, StallRule, MAX_PROGRESS};
pub use types::{
    normalize_hash, DeleteReason, PrivacyScope, PrivacyType, RuleId, StrikeKind,
};

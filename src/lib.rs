//! # queue-warden
//!
//! A strike-based rule engine that decides when torrents sitting in a
//! download queue should be removed.
//!
//! ## Features
//!
//! - **Stall and slow policies**: Progress-ranged rules, split by tracker privacy
//! - **Interval validation**: Overlap detection and coverage gap reporting
//! - **Durable strikes**: SQLite-backed ledger that survives restarts
//! - **Progress forgiveness**: Strikes are reset once an item moves again
//! - **Async**: Built on Tokio, safe to drive from concurrent polling jobs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use queue_warden::{QueueItem, StallRule, WardenConfig, WardenEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WardenConfig::default().default_database();
//!     let engine = WardenEngine::new(config).await?;
//!
//!     engine
//!         .rules()
//!         .upsert_stall_rule(StallRule::new("stalled", 0, 100, 3).reset_on_progress("10 MB"))?;
//!
//!     let item = QueueItem::new("c12fe1c06bba254a9dc9f519b335aa7c1367a88a", "ubuntu.iso")
//!         .completion(42.0);
//!     let decision = engine.evaluate_stall(&item).await;
//!     println!("remove: {}", decision.should_remove);
//!
//!     Ok(())
//! }
//! ```

// Modules
pub mod baseline;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod protocol;
pub mod rules;
pub mod size;
pub mod storage;
pub mod striker;
pub mod validation;

// Re-exports for convenience
pub use config::WardenConfig;
pub use engine::WardenEngine;
pub use error::{Result, WardenError};
pub use protocol::{
    CoverageGap, DeleteReason, EvaluationResult, IntervalConflict, PrivacyScope, PrivacyType,
    QueueItem, QueueRule, RuleId, SlowRule, StallRule, StrikeEvent, StrikeKind, TorrentItem,
    ValidationResult, MAX_PROGRESS,
};
pub use size::ByteSize;

// Storage exports
pub use storage::{MemoryStrikeStore, StrikeRecord, StrikeStore, TrackedItem};
#[cfg(feature = "storage")]
pub use storage::SqliteStrikeStore;

// Evaluation exports
pub use baseline::{Baseline, PolicyKind, ProgressBaselines};
pub use evaluator::RuleEvaluator;
pub use matcher::{match_progress, match_rule};
pub use rules::RuleBook;
pub use striker::{RecurringItems, Striker};
pub use validation::{find_gaps_in_coverage, intervals_overlap, validate_intervals};

//! Warden Engine
//!
//! The main entry point for embedding the warden. Wires the configured
//! strike store, the rule book, the striker and the evaluator together and
//! exposes the operations a polling job needs.

use crate::baseline::ProgressBaselines;
use crate::config::WardenConfig;
use crate::error::Result;
use crate::evaluator::RuleEvaluator;
use crate::protocol::{
    CoverageGap, EvaluationResult, SlowRule, StallRule, StrikeEvent, StrikeKind, TorrentItem,
    ValidationResult,
};
use crate::rules::RuleBook;
use crate::storage::{MemoryStrikeStore, StrikeRecord, StrikeStore};
use crate::striker::{RecurringItems, Striker};
use crate::validation::validate_intervals;
use std::sync::Arc;
use tokio::sync::broadcast;

#[cfg(feature = "storage")]
use crate::storage::SqliteStrikeStore;

/// Strike-based queue warden
pub struct WardenEngine {
    config: WardenConfig,
    rules: Arc<RuleBook>,
    striker: Arc<Striker>,
    evaluator: RuleEvaluator,
}

impl WardenEngine {
    /// Create a new engine with the given configuration.
    ///
    /// When a database path is configured but cannot be opened, the engine
    /// falls back to in-memory strikes and logs a warning.
    pub async fn new(config: WardenConfig) -> Result<Self> {
        config.validate()?;

        #[cfg(feature = "storage")]
        let store: Arc<dyn StrikeStore> = if let Some(ref db_path) = config.database_path {
            match SqliteStrikeStore::new(db_path).await {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    tracing::warn!(
                        "Failed to initialize strike database: {}. Strikes will not be persisted.",
                        e
                    );
                    Arc::new(MemoryStrikeStore::new())
                }
            }
        } else {
            Arc::new(MemoryStrikeStore::new())
        };
        #[cfg(not(feature = "storage"))]
        let store: Arc<dyn StrikeStore> = Arc::new(MemoryStrikeStore::new());

        Ok(Self::with_store(config, store))
    }

    /// Create an engine over an existing strike store
    pub fn with_store(config: WardenConfig, store: Arc<dyn StrikeStore>) -> Self {
        let striker = Arc::new(Striker::new(
            store,
            Arc::new(RecurringItems::new()),
            config.event_channel_capacity,
        ));
        let rules = Arc::new(RuleBook::new());
        let baselines =
            ProgressBaselines::new(config.baseline_capacity, config.baseline_ttl_duration());
        let evaluator = RuleEvaluator::new(rules.clone(), striker.clone(), baselines);

        tracing::info!(
            persistent = config.database_path.is_some(),
            "Queue warden initialized"
        );

        Self {
            config,
            rules,
            striker,
            evaluator,
        }
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// Configured rules
    pub fn rules(&self) -> &Arc<RuleBook> {
        &self.rules
    }

    /// Strike ledger
    pub fn striker(&self) -> &Arc<Striker> {
        &self.striker
    }

    /// Subscribe to strike events
    pub fn subscribe(&self) -> broadcast::Receiver<StrikeEvent> {
        self.striker.subscribe()
    }

    /// Evaluate the stall policy for one item
    pub async fn evaluate_stall<I: TorrentItem + ?Sized>(&self, item: &I) -> EvaluationResult {
        self.evaluator.evaluate_stall(item).await
    }

    /// Evaluate the slow policy for one item
    pub async fn evaluate_slow<I: TorrentItem + ?Sized>(&self, item: &I) -> Result<EvaluationResult> {
        self.evaluator.evaluate_slow(item).await
    }

    /// Check a stall rule against the configured set without saving it
    pub fn validate_stall_rule(&self, rule: &StallRule) -> ValidationResult {
        if let Err(e) = rule.validate() {
            return ValidationResult::malformed(e.to_string());
        }
        validate_intervals(rule, &self.rules.stall_rules())
    }

    /// Check a slow rule against the configured set without saving it
    pub fn validate_slow_rule(&self, rule: &SlowRule) -> ValidationResult {
        if let Err(e) = rule.validate() {
            return ValidationResult::malformed(e.to_string());
        }
        validate_intervals(rule, &self.rules.slow_rules())
    }

    pub fn stall_gaps(&self) -> Vec<CoverageGap> {
        self.rules.stall_gaps()
    }

    pub fn slow_gaps(&self) -> Vec<CoverageGap> {
        self.rules.slow_gaps()
    }

    /// Record a strike of a kind decided outside the stall/slow policies
    pub async fn strike(&self, hash: &str, name: &str, max_strikes: u32, kind: StrikeKind) -> Result<bool> {
        self.striker.strike_and_check_limit(hash, name, max_strikes, kind).await
    }

    /// Forgive strikes of one kind
    pub async fn reset_strike(&self, hash: &str, name: &str, kind: StrikeKind) -> Result<()> {
        self.striker.reset_strike(hash, name, kind).await
    }

    /// All strikes recorded for an item, oldest first
    pub async fn strikes_for(&self, hash: &str) -> Result<Vec<StrikeRecord>> {
        self.striker.store().strikes_for(hash).await
    }

    /// Items struck past their limit more than once
    pub fn recurring_items(&self) -> Vec<String> {
        self.striker.recurring().snapshot()
    }

    /// Drop remembered progress for items no longer in the queue
    pub fn retain_items<'a, I>(&self, hashes: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.evaluator.retain_items(hashes);
    }

    /// Drop remembered progress for one item
    pub fn forget_item(&self, hash: &str) {
        self.evaluator.forget_item(hash);
    }

    /// Check that the strike store is reachable
    pub async fn health_check(&self) -> Result<()> {
        self.striker.store().health_check().await
    }
}

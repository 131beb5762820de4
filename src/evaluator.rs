//! Rule evaluation
//!
//! Decides, once per item per polling pass, whether a queue item should be
//! removed for stalling or downloading too slowly. Matching picks the rule,
//! progress decides between striking and forgiving, and the striker keeps
//! the durable count.

use crate::baseline::{Baseline, PolicyKind, ProgressBaselines};
use crate::error::Result;
use crate::protocol::{EvaluationResult, StrikeKind, TorrentItem};
use crate::rules::RuleBook;
use crate::striker::Striker;
use std::sync::Arc;

/// Evaluates stall and slow rules against queue item snapshots
pub struct RuleEvaluator {
    rules: Arc<RuleBook>,
    striker: Arc<Striker>,
    baselines: ProgressBaselines,
}

impl RuleEvaluator {
    pub fn new(rules: Arc<RuleBook>, striker: Arc<Striker>, baselines: ProgressBaselines) -> Self {
        Self {
            rules,
            striker,
            baselines,
        }
    }

    /// Progress baselines remembered between passes
    pub fn baselines(&self) -> &ProgressBaselines {
        &self.baselines
    }

    /// Decide whether a stalled item should be removed.
    ///
    /// Ledger failures are logged and treated as "keep" so a flaky store
    /// never removes items on its own.
    pub async fn evaluate_stall<I: TorrentItem + ?Sized>(&self, item: &I) -> EvaluationResult {
        let Some(rule) = self.rules.match_stall(item) else {
            tracing::debug!(hash = item.hash(), "No stall rule matches item");
            return EvaluationResult::keep();
        };

        let hash = item.hash();
        let name = item.name();
        let downloaded = item.downloaded_bytes();

        if rule.reset_strikes_on_progress {
            match rule.progress_delta() {
                Ok(delta) => {
                    let progressed = self.baselines.update(hash, PolicyKind::Stall, |current| {
                        match current {
                            // Only forward growth counts, even with a zero delta
                            Some(Baseline::Downloaded(base))
                                if downloaded > base && downloaded - base >= delta.as_u64() =>
                            {
                                (Some(Baseline::Downloaded(downloaded)), true)
                            }
                            Some(baseline @ Baseline::Downloaded(_)) => (Some(baseline), false),
                            // First sighting seeds the baseline
                            _ => (Some(Baseline::Downloaded(downloaded)), false),
                        }
                    });

                    if progressed {
                        tracing::debug!(
                            hash,
                            name,
                            downloaded,
                            rule = %rule.name,
                            "Item made progress, forgiving stall strikes"
                        );
                        if let Err(e) = self.striker.reset_strike(hash, name, StrikeKind::Stalled).await {
                            tracing::warn!("Failed to reset stall strikes for {}: {}", hash, e);
                        }
                        return EvaluationResult::keep();
                    }
                }
                Err(e) => {
                    tracing::warn!(rule = %rule.name, "Ignoring progress reset: {}", e);
                }
            }
        }

        match self
            .striker
            .strike_with_payload(hash, name, rule.max_strikes, StrikeKind::Stalled, Some(downloaded))
            .await
        {
            Ok(true) => EvaluationResult::remove(StrikeKind::Stalled.into()),
            Ok(false) => EvaluationResult::keep(),
            Err(e) => {
                tracing::warn!("Failed to strike stalled item {}: {}", hash, e);
                EvaluationResult::keep()
            }
        }
    }

    /// Decide whether a slow item should be removed.
    ///
    /// Unlike the stall path, ledger failures are returned to the caller.
    pub async fn evaluate_slow<I: TorrentItem + ?Sized>(&self, item: &I) -> Result<EvaluationResult> {
        let Some(rule) = self.rules.match_slow(item) else {
            tracing::debug!(hash = item.hash(), "No slow rule matches item");
            return Ok(EvaluationResult::keep());
        };

        let hash = item.hash();
        let name = item.name();

        let speed_threshold = rule.speed_threshold().unwrap_or_else(|e| {
            tracing::warn!(rule = %rule.name, "Ignoring speed check: {}", e);
            None
        });

        // Speed takes priority: time is not looked at while speed is failing
        let active = if speed_threshold.is_some_and(|min| item.download_speed() < min.as_u64()) {
            Some(StrikeKind::SlowSpeed)
        } else if rule.checks_time() && item.eta_seconds() as f64 / 3600.0 > rule.max_time_hours {
            Some(StrikeKind::SlowTime)
        } else {
            None
        };

        if rule.reset_strikes_on_progress {
            let previous = self.baselines.update(hash, PolicyKind::Slow, |current| {
                let previous = match current {
                    Some(Baseline::ConditionActive(kind)) => Some(kind),
                    _ => None,
                };
                (active.map(Baseline::ConditionActive), previous)
            });

            if let (None, Some(cleared)) = (active, previous) {
                tracing::debug!(hash, name, kind = %cleared, "Slow condition cleared, forgiving strikes");
                if let Err(e) = self.striker.reset_strike(hash, name, cleared).await {
                    // Remember the condition so the reset is retried next pass
                    self.baselines.update(hash, PolicyKind::Slow, |current| {
                        (current.or(Some(Baseline::ConditionActive(cleared))), ())
                    });
                    return Err(e);
                }
            }
        }

        let Some(kind) = active else {
            return Ok(EvaluationResult::keep());
        };

        let limit_reached = self
            .striker
            .strike_and_check_limit(hash, name, rule.max_strikes, kind)
            .await?;

        Ok(if limit_reached {
            EvaluationResult::remove(kind.into())
        } else {
            EvaluationResult::keep()
        })
    }

    /// Drop remembered progress for an item that left the queue
    pub fn forget_item(&self, hash: &str) {
        self.baselines.forget(hash);
    }

    /// Drop remembered progress for every item not in `hashes`
    pub fn retain_items<'a, I>(&self, hashes: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.baselines.retain(hashes);
    }
}

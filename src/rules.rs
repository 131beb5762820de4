//! Rule book
//!
//! Holds the configured stall and slow rules in insertion order. Writes go
//! through sanity and interval validation; reads are cheap snapshots for the
//! evaluator.

use crate::error::{Result, WardenError};
use crate::matcher::match_rule;
use crate::protocol::{CoverageGap, QueueRule, RuleId, SlowRule, StallRule, TorrentItem};
use crate::validation::{find_gaps_in_coverage, validate_intervals};
use parking_lot::RwLock;

/// Concurrently readable set of stall and slow rules
#[derive(Debug, Default)]
pub struct RuleBook {
    stall: RwLock<Vec<StallRule>>,
    slow: RwLock<Vec<SlowRule>>,
}

/// Insert or replace `rule` by id once its interval fits among `rules`
fn upsert<R: QueueRule>(rules: &mut Vec<R>, rule: R) -> Result<()> {
    let result = validate_intervals(&rule, rules);
    if !result.is_valid {
        return Err(WardenError::IntervalConflict {
            message: result
                .error_message
                .unwrap_or_else(|| format!("Rule '{}' overlaps an existing rule", rule.name())),
        });
    }

    match rules.iter_mut().find(|existing| existing.id() == rule.id()) {
        Some(existing) => *existing = rule,
        None => rules.push(rule),
    }
    Ok(())
}

fn remove<R: QueueRule>(rules: &mut Vec<R>, id: RuleId) -> Result<R> {
    let index = rules
        .iter()
        .position(|rule| rule.id() == id)
        .ok_or_else(|| WardenError::NotFound(format!("rule {}", id)))?;
    Ok(rules.remove(index))
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install rules loaded elsewhere without validating them.
    ///
    /// Overlapping sets are tolerated; matching picks the first rule in order.
    pub fn load_unchecked(&self, stall: Vec<StallRule>, slow: Vec<SlowRule>) {
        *self.stall.write() = stall;
        *self.slow.write() = slow;
    }

    /// Add a stall rule, or replace the one with the same id
    pub fn upsert_stall_rule(&self, rule: StallRule) -> Result<()> {
        rule.validate()?;
        tracing::debug!(rule = %rule.name, id = %rule.id, "Saving stall rule");
        upsert(&mut *self.stall.write(), rule)
    }

    /// Add a slow rule, or replace the one with the same id
    pub fn upsert_slow_rule(&self, rule: SlowRule) -> Result<()> {
        rule.validate()?;
        tracing::debug!(rule = %rule.name, id = %rule.id, "Saving slow rule");
        upsert(&mut *self.slow.write(), rule)
    }

    pub fn remove_stall_rule(&self, id: RuleId) -> Result<StallRule> {
        remove(&mut *self.stall.write(), id)
    }

    pub fn remove_slow_rule(&self, id: RuleId) -> Result<SlowRule> {
        remove(&mut *self.slow.write(), id)
    }

    pub fn stall_rules(&self) -> Vec<StallRule> {
        self.stall.read().clone()
    }

    pub fn slow_rules(&self) -> Vec<SlowRule> {
        self.slow.read().clone()
    }

    /// Stall rule applying to an item
    pub fn match_stall<I: TorrentItem + ?Sized>(&self, item: &I) -> Option<StallRule> {
        match_rule(item, self.stall.read().as_slice()).cloned()
    }

    /// Slow rule applying to an item
    pub fn match_slow<I: TorrentItem + ?Sized>(&self, item: &I) -> Option<SlowRule> {
        match_rule(item, self.slow.read().as_slice()).cloned()
    }

    /// Completion ranges no enabled stall rule covers
    pub fn stall_gaps(&self) -> Vec<CoverageGap> {
        find_gaps_in_coverage(self.stall.read().as_slice())
    }

    /// Completion ranges no enabled slow rule covers
    pub fn slow_gaps(&self) -> Vec<CoverageGap> {
        find_gaps_in_coverage(self.slow.read().as_slice())
    }
}

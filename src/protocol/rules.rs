//! Queue rule types
//!
//! Rules are owned by the configuration layer and read-only to the
//! evaluator. Each rule covers an inclusive completion-percentage interval
//! for one privacy scope.

use super::types::{PrivacyScope, RuleId};
use crate::error::{Result, WardenError};
use crate::size::ByteSize;
use serde::{Deserialize, Serialize};

/// Upper bound of the completion axis
pub const MAX_PROGRESS: u16 = 100;

/// Capability shared by every intervaled, privacy-scoped rule kind.
///
/// Matching, overlap validation and gap analysis are written once against
/// this trait; stall and slow rules only add their strike policy on top.
pub trait QueueRule {
    fn id(&self) -> RuleId;
    fn name(&self) -> &str;
    fn enabled(&self) -> bool;
    fn privacy_scope(&self) -> PrivacyScope;
    fn min_progress(&self) -> u16;
    fn max_progress(&self) -> u16;

    /// Inclusive containment of a completion percentage
    fn covers(&self, percentage: f64) -> bool {
        percentage >= f64::from(self.min_progress()) && percentage <= f64::from(self.max_progress())
    }

    /// `min <= max`; inverted intervals never take part in gap analysis
    fn has_valid_bounds(&self) -> bool {
        self.min_progress() <= self.max_progress()
    }

    /// Exact-point rule (`min == max`)
    fn is_zero_width(&self) -> bool {
        self.min_progress() == self.max_progress()
    }
}

/// Rule for torrents that stop making download progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StallRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub privacy_scope: PrivacyScope,
    pub min_progress: u16,
    pub max_progress: u16,
    /// Strike threshold; 0 disables removal
    pub max_strikes: u32,
    #[serde(default)]
    pub reset_strikes_on_progress: bool,
    /// Download growth that counts as progress, e.g. "10 MB"
    #[serde(default)]
    pub minimum_progress_delta: String,
}

/// Rule for torrents that download too slowly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub privacy_scope: PrivacyScope,
    pub min_progress: u16,
    pub max_progress: u16,
    /// Strike threshold; 0 disables removal
    pub max_strikes: u32,
    #[serde(default)]
    pub reset_strikes_on_progress: bool,
    /// Minimum acceptable speed, e.g. "1 MB"; empty disables the check
    #[serde(default)]
    pub min_speed: String,
    /// Maximum acceptable ETA in hours; 0 disables the check
    #[serde(default)]
    pub max_time_hours: f64,
}

fn default_true() -> bool {
    true
}

fn check_common<R: QueueRule>(rule: &R) -> Result<()> {
    if rule.name().trim().is_empty() {
        return Err(WardenError::invalid_rule(rule.id().to_string(), "Name must not be empty"));
    }
    if rule.min_progress() > rule.max_progress() {
        return Err(WardenError::invalid_rule(
            rule.name(),
            format!(
                "Min progress {} exceeds max progress {}",
                rule.min_progress(),
                rule.max_progress()
            ),
        ));
    }
    if rule.max_progress() > MAX_PROGRESS {
        return Err(WardenError::invalid_rule(
            rule.name(),
            format!("Max progress {} exceeds {}", rule.max_progress(), MAX_PROGRESS),
        ));
    }
    Ok(())
}

impl StallRule {
    pub fn new(name: impl Into<String>, min_progress: u16, max_progress: u16, max_strikes: u32) -> Self {
        Self {
            id: RuleId::new(),
            name: name.into(),
            enabled: true,
            privacy_scope: PrivacyScope::Both,
            min_progress,
            max_progress,
            max_strikes,
            reset_strikes_on_progress: false,
            minimum_progress_delta: String::new(),
        }
    }

    pub fn scope(mut self, scope: PrivacyScope) -> Self {
        self.privacy_scope = scope;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Forgive strikes once downloads grow by at least `delta`
    pub fn reset_on_progress(mut self, delta: impl Into<String>) -> Self {
        self.reset_strikes_on_progress = true;
        self.minimum_progress_delta = delta.into();
        self
    }

    /// Parsed progress threshold; blank means any growth counts.
    ///
    /// The evaluator requires strictly positive growth on top of this.
    pub fn progress_delta(&self) -> Result<ByteSize> {
        ByteSize::parse_optional(&self.minimum_progress_delta)
            .map(Option::unwrap_or_default)
            .map_err(|e| WardenError::invalid_rule(&self.name, e))
    }

    /// Sanity-check the rule on its own, without regard to other rules
    pub fn validate(&self) -> Result<()> {
        check_common(self)?;
        self.progress_delta()?;
        Ok(())
    }
}

impl SlowRule {
    pub fn new(name: impl Into<String>, min_progress: u16, max_progress: u16, max_strikes: u32) -> Self {
        Self {
            id: RuleId::new(),
            name: name.into(),
            enabled: true,
            privacy_scope: PrivacyScope::Both,
            min_progress,
            max_progress,
            max_strikes,
            reset_strikes_on_progress: false,
            min_speed: String::new(),
            max_time_hours: 0.0,
        }
    }

    pub fn scope(mut self, scope: PrivacyScope) -> Self {
        self.privacy_scope = scope;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn min_speed(mut self, speed: impl Into<String>) -> Self {
        self.min_speed = speed.into();
        self
    }

    pub fn max_time_hours(mut self, hours: f64) -> Self {
        self.max_time_hours = hours;
        self
    }

    pub fn reset_on_progress(mut self) -> Self {
        self.reset_strikes_on_progress = true;
        self
    }

    /// Parsed speed threshold; `None` when the speed check is disabled
    pub fn speed_threshold(&self) -> Result<Option<ByteSize>> {
        ByteSize::parse_optional(&self.min_speed).map_err(|e| WardenError::invalid_rule(&self.name, e))
    }

    /// Whether the ETA check is enabled
    pub fn checks_time(&self) -> bool {
        self.max_time_hours > 0.0
    }

    /// Sanity-check the rule on its own, without regard to other rules
    pub fn validate(&self) -> Result<()> {
        check_common(self)?;
        if !self.max_time_hours.is_finite() || self.max_time_hours < 0.0 {
            return Err(WardenError::invalid_rule(
                &self.name,
                format!("Max time must be a non-negative number of hours, got {}", self.max_time_hours),
            ));
        }
        let speed = self.speed_threshold()?;
        if speed.is_none() && !self.checks_time() {
            return Err(WardenError::invalid_rule(
                &self.name,
                "Either min speed or max time must be set",
            ));
        }
        Ok(())
    }
}

macro_rules! impl_queue_rule {
    ($rule:ty) => {
        impl QueueRule for $rule {
            fn id(&self) -> RuleId {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn enabled(&self) -> bool {
                self.enabled
            }

            fn privacy_scope(&self) -> PrivacyScope {
                self.privacy_scope
            }

            fn min_progress(&self) -> u16 {
                self.min_progress
            }

            fn max_progress(&self) -> u16 {
                self.max_progress
            }
        }
    };
}

impl_queue_rule!(StallRule);
impl_queue_rule!(SlowRule);

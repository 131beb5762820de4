//! Evaluation and validation results
//!
//! Types returned to the orchestration layer.

use super::types::{DeleteReason, PrivacyType, RuleId};
use serde::{Deserialize, Serialize};

/// Removal decision for one item on one polling pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub should_remove: bool,
    pub reason: Option<DeleteReason>,
}

impl EvaluationResult {
    /// Leave the item in the queue
    pub fn keep() -> Self {
        Self::default()
    }

    /// Remove the item for the given reason
    pub fn remove(reason: DeleteReason) -> Self {
        Self {
            should_remove: true,
            reason: Some(reason),
        }
    }
}

/// One overlapping pair found while validating a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalConflict {
    /// Privacy type under which the ranges collide
    pub privacy_type: PrivacyType,
    pub conflicting_rule_id: RuleId,
    pub conflicting_rule_name: String,
    /// Shared part of the two ranges
    pub overlap_start: u16,
    pub overlap_end: u16,
}

impl std::fmt::Display for IntervalConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "overlaps '{}' on {} items between {}% and {}%",
            self.conflicting_rule_name, self.privacy_type, self.overlap_start, self.overlap_end
        )
    }
}

/// Outcome of validating a candidate rule against the configured set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub details: Vec<IntervalConflict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            details: Vec::new(),
            error_message: None,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            details: Vec::new(),
            error_message: Some(message.into()),
        }
    }

    pub fn from_conflicts(details: Vec<IntervalConflict>) -> Self {
        if details.is_empty() {
            return Self::valid();
        }
        let message = details
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            is_valid: false,
            details,
            error_message: Some(format!("Rule interval {}", message)),
        }
    }
}

/// Completion range with no enabled rule for one privacy type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub privacy_type: PrivacyType,
    pub start: u16,
    pub end: u16,
}

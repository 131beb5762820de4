//! Interval validation
//!
//! Configuration-time checks that the enabled rules of one kind partition
//! the completion axis without overlapping, plus gap analysis for
//! surfacing unconfigured progress ranges to an operator. Neither runs on
//! the evaluation path.

use crate::protocol::{
    CoverageGap, IntervalConflict, PrivacyType, QueueRule, ValidationResult, MAX_PROGRESS,
};

/// Check a candidate rule's interval against the existing rule set.
///
/// Existing rules that are disabled or share the candidate's id are ignored,
/// so an edited rule never collides with its previous version. Ranges that
/// only touch (`a.max == b.min`) are allowed, and zero-width rules never
/// conflict.
pub fn validate_intervals<R: QueueRule>(candidate: &R, existing: &[R]) -> ValidationResult {
    if !candidate.enabled() {
        return ValidationResult::valid();
    }

    if !candidate.has_valid_bounds() || candidate.max_progress() > MAX_PROGRESS {
        return ValidationResult::malformed(format!(
            "Rule '{}' has an invalid progress range {}-{}",
            candidate.name(),
            candidate.min_progress(),
            candidate.max_progress()
        ));
    }

    let others: Vec<&R> = existing
        .iter()
        .filter(|rule| {
            rule.enabled()
                && rule.id() != candidate.id()
                && rule.privacy_scope().intersects(candidate.privacy_scope())
        })
        .collect();

    let mut conflicts = Vec::new();
    for privacy in PrivacyType::ALL {
        if !candidate.privacy_scope().applies_to(privacy) {
            continue;
        }

        for other in others
            .iter()
            .filter(|rule| rule.privacy_scope().applies_to(privacy))
        {
            if intervals_overlap(candidate, *other) {
                conflicts.push(IntervalConflict {
                    privacy_type: privacy,
                    conflicting_rule_id: other.id(),
                    conflicting_rule_name: other.name().to_string(),
                    overlap_start: candidate.min_progress().max(other.min_progress()),
                    overlap_end: candidate.max_progress().min(other.max_progress()),
                });
            }
        }
    }

    if !conflicts.is_empty() {
        tracing::debug!(
            rule = candidate.name(),
            conflicts = conflicts.len(),
            "Rule interval overlaps existing rules"
        );
    }

    ValidationResult::from_conflicts(conflicts)
}

/// Interior overlap test; touching boundaries and exact-point rules are exempt
pub fn intervals_overlap<A: QueueRule, B: QueueRule>(a: &A, b: &B) -> bool {
    if a.is_zero_width() || b.is_zero_width() {
        return false;
    }
    a.min_progress() < b.max_progress() && b.min_progress() < a.max_progress()
}

/// List completion ranges that no enabled rule covers, per privacy type.
///
/// Rules with inverted bounds are skipped; bounds beyond 100 are clamped.
pub fn find_gaps_in_coverage<R: QueueRule>(rules: &[R]) -> Vec<CoverageGap> {
    let mut gaps = Vec::new();

    for privacy in PrivacyType::ALL {
        let mut intervals: Vec<(u16, u16)> = rules
            .iter()
            .filter(|rule| {
                rule.enabled() && rule.has_valid_bounds() && rule.privacy_scope().applies_to(privacy)
            })
            .map(|rule| {
                (
                    rule.min_progress().min(MAX_PROGRESS),
                    rule.max_progress().min(MAX_PROGRESS),
                )
            })
            .collect();
        intervals.sort_unstable();

        let mut covered_to = 0u16;
        for (start, end) in intervals {
            if start > covered_to {
                gaps.push(CoverageGap {
                    privacy_type: privacy,
                    start: covered_to,
                    end: start,
                });
            }
            covered_to = covered_to.max(end);
        }

        if covered_to < MAX_PROGRESS {
            gaps.push(CoverageGap {
                privacy_type: privacy,
                start: covered_to,
                end: MAX_PROGRESS,
            });
        }
    }

    gaps
}

//! Rule matching
//!
//! Picks the rule that applies to a queue item. Rules are evaluated in
//! order and the first match wins, so a rule set that slipped past interval
//! validation still resolves deterministically.

use crate::protocol::{PrivacyType, QueueRule, TorrentItem};

/// Find the rule applying to an item's privacy and completion percentage
pub fn match_rule<'a, R, I>(item: &I, rules: &'a [R]) -> Option<&'a R>
where
    R: QueueRule,
    I: TorrentItem + ?Sized,
{
    match_progress(item.privacy(), item.completion_percentage(), rules)
}

/// Find the first enabled rule whose scope and interval contain the given point
pub fn match_progress<R: QueueRule>(privacy: PrivacyType, percentage: f64, rules: &[R]) -> Option<&R> {
    rules.iter().find(|rule| {
        rule.enabled() && rule.privacy_scope().applies_to(privacy) && rule.covers(percentage)
    })
}

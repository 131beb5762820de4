//! Property tests for interval validation and coverage gaps

use proptest::prelude::*;
use queue_warden::{
    find_gaps_in_coverage, intervals_overlap, validate_intervals, PrivacyScope, StallRule,
    MAX_PROGRESS,
};

fn scope() -> impl Strategy<Value = PrivacyScope> {
    prop_oneof![
        Just(PrivacyScope::Public),
        Just(PrivacyScope::Private),
        Just(PrivacyScope::Both),
    ]
}

fn rule() -> impl Strategy<Value = StallRule> {
    (0..=MAX_PROGRESS, 0..=MAX_PROGRESS, scope()).prop_map(|(a, b, scope)| {
        StallRule::new("rule", a.min(b), a.max(b), 3).scope(scope)
    })
}

proptest! {
    #[test]
    fn overlap_is_symmetric(a in rule(), b in rule()) {
        prop_assert_eq!(intervals_overlap(&a, &b), intervals_overlap(&b, &a));
    }

    #[test]
    fn touching_intervals_never_conflict(split in 0..=MAX_PROGRESS, s1 in scope(), s2 in scope()) {
        let left = StallRule::new("left", 0, split, 3).scope(s1);
        let right = StallRule::new("right", split, MAX_PROGRESS, 3).scope(s2);
        prop_assert!(!intervals_overlap(&left, &right));
        prop_assert!(validate_intervals(&right, &[left]).is_valid);
    }

    #[test]
    fn zero_width_rules_never_conflict(point in 0..=MAX_PROGRESS, other in rule()) {
        let pin = StallRule::new("pin", point, point, 3);
        prop_assert!(!intervals_overlap(&pin, &other));
    }

    #[test]
    fn rule_never_conflicts_with_itself(candidate in rule()) {
        prop_assert!(validate_intervals(&candidate, &[candidate.clone()]).is_valid);
    }

    #[test]
    fn tiled_rules_leave_no_gaps(cuts in proptest::collection::btree_set(1..MAX_PROGRESS, 0..6)) {
        let mut points = vec![0];
        points.extend(cuts);
        points.push(MAX_PROGRESS);

        let rules: Vec<StallRule> = points
            .windows(2)
            .map(|w| StallRule::new("tile", w[0], w[1], 3))
            .collect();
        prop_assert!(find_gaps_in_coverage(&rules).is_empty());
    }

    #[test]
    fn gaps_never_intersect_rules(rules in proptest::collection::vec(rule(), 0..6)) {
        for gap in find_gaps_in_coverage(&rules) {
            prop_assert!(gap.start < gap.end);
            for rule in &rules {
                if rule.privacy_scope.applies_to(gap.privacy_type) && rule.min_progress < rule.max_progress {
                    prop_assert!(rule.max_progress <= gap.start || rule.min_progress >= gap.end);
                }
            }
        }
    }
}

#[test]
fn empty_rule_set_has_two_full_gaps() {
    let gaps = find_gaps_in_coverage::<StallRule>(&[]);
    assert_eq!(gaps.len(), 2);
    assert!(gaps.iter().all(|g| g.start == 0 && g.end == MAX_PROGRESS));
}

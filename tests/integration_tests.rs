//! Integration tests for queue-warden
//!
//! These tests drive the engine the way a polling job does: one snapshot
//! per item per pass, with strikes persisted between passes.


use queue_warden::{
    DeleteReason, PrivacyScope, QueueItem, SlowRule, StallRule, StrikeEvent, StrikeKind,
    WardenConfig, WardenEngine, WardenError,
};
use std::time::Duration;
use test_helpers::*;
use tokio::sync::broadcast;
use tokio::time::timeout;

/// Helper to wait for a specific event type
async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<StrikeEvent>,
    predicate: F,
    timeout_duration: Duration,
) -> Option<StrikeEvent>
where
    F: Fn(&StrikeEvent) -> bool,
{
    let result = timeout(timeout_duration, async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    })
    .await;
    result.unwrap_or(None)
}

async fn memory_engine() -> WardenEngine {
    WardenEngine::new(WardenConfig::default())
        .await
        .expect("Failed to create engine")
}

// =============================================================================
// Stall Policy
// =============================================================================

#[tokio::test]
async fn test_stall_removed_after_max_strikes() {
    let engine = memory_engine().await;
    engine
        .rules()
        .upsert_stall_rule(StallRule::new("stalled", 0, 100, 3))
        .unwrap();

    let item = stalled_item("aaaa", 12.0, 10 * MB);
    for _ in 0..2 {
        assert!(!engine.evaluate_stall(&item).await.should_remove);
    }
    let result = engine.evaluate_stall(&item).await;
    assert!(result.should_remove);
    assert_eq!(result.reason, Some(DeleteReason::Stalled));
}

#[tokio::test]
async fn test_stall_rule_selected_by_privacy_and_progress() {
    let engine = memory_engine().await;
    engine
        .rules()
        .load_unchecked(tiled_stall_rules(), Vec::new());
    assert!(engine.stall_gaps().is_empty());

    // Boundary belongs to the first rule in order: max 3 strikes
    let public = stalled_item("pub", 50.0, 0);
    for _ in 0..2 {
        engine.evaluate_stall(&public).await;
    }
    assert!(engine.evaluate_stall(&public).await.should_remove);

    // Private rule allows 10 strikes
    let private = stalled_item("priv", 50.0, 0).private(true);
    for _ in 0..3 {
        assert!(!engine.evaluate_stall(&private).await.should_remove);
    }
}

#[tokio::test]
async fn test_stall_progress_forgives_strikes() {
    let engine = memory_engine().await;
    engine
        .rules()
        .upsert_stall_rule(StallRule::new("stalled", 0, 100, 3).reset_on_progress("5 MB"))
        .unwrap();
    let mut events = engine.subscribe();

    engine.evaluate_stall(&stalled_item("bbbb", 10.0, 10 * MB)).await;
    engine.evaluate_stall(&stalled_item("bbbb", 10.0, 12 * MB)).await;
    assert_eq!(
        engine.striker().strike_count("bbbb", StrikeKind::Stalled).await.unwrap(),
        2
    );

    // 10 MB -> 16 MB is at least the 5 MB delta
    let result = engine.evaluate_stall(&stalled_item("bbbb", 12.0, 16 * MB)).await;
    assert!(!result.should_remove);
    assert_eq!(
        engine.striker().strike_count("bbbb", StrikeKind::Stalled).await.unwrap(),
        0
    );

    let reset = wait_for_event(
        &mut events,
        |e| matches!(e, StrikeEvent::Reset { .. }),
        Duration::from_secs(1),
    )
    .await;
    assert_eq!(reset.map(|e| e.hash().to_string()), Some("bbbb".to_string()));
}

#[tokio::test]
async fn test_stalled_item_removed_with_blank_progress_delta() {
    let engine = memory_engine().await;
    engine
        .rules()
        .upsert_stall_rule(StallRule::new("stalled", 0, 100, 2).reset_on_progress(""))
        .unwrap();

    let item = stalled_item("blnk", 40.0, 5_000);
    let mut removed_on = None;
    for pass in 1..=10 {
        if engine.evaluate_stall(&item).await.should_remove {
            removed_on = Some(pass);
            break;
        }
    }
    assert_eq!(removed_on, Some(2));
}

#[tokio::test]
async fn test_disabled_rule_never_strikes() {
    let engine = memory_engine().await;
    engine
        .rules()
        .upsert_stall_rule(StallRule::new("off", 0, 100, 1).disabled())
        .unwrap();

    let item = stalled_item("cccc", 10.0, 0);
    assert!(!engine.evaluate_stall(&item).await.should_remove);
    assert!(engine.strikes_for("cccc").await.unwrap().is_empty());
}

// =============================================================================
// Slow Policy
// =============================================================================

#[tokio::test]
async fn test_slow_speed_then_recovery() {
    let engine = memory_engine().await;
    engine.rules().upsert_slow_rule(slow_rule(3)).unwrap();

    let slow = downloading_item("dddd", 100_000, 600);
    assert!(!engine.evaluate_slow(&slow).await.unwrap().should_remove);
    assert!(!engine.evaluate_slow(&slow).await.unwrap().should_remove);

    // Fast again with a short ETA: strikes are forgiven
    let fast = downloading_item("dddd", 5 * MB, 600);
    assert!(!engine.evaluate_slow(&fast).await.unwrap().should_remove);
    assert_eq!(
        engine.striker().strike_count("dddd", StrikeKind::SlowSpeed).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_slow_time_strikes_when_speed_is_fine() {
    let engine = memory_engine().await;
    engine.rules().upsert_slow_rule(slow_rule(2)).unwrap();

    // Fast enough but 3 hours left against a 2 hour limit
    let item = downloading_item("eeee", 2 * MB, 3 * 3600);
    assert!(!engine.evaluate_slow(&item).await.unwrap().should_remove);
    let result = engine.evaluate_slow(&item).await.unwrap();
    assert!(result.should_remove);
    assert_eq!(result.reason, Some(DeleteReason::SlowTime));
}

#[tokio::test]
async fn test_slow_rule_for_private_only() {
    let engine = memory_engine().await;
    engine
        .rules()
        .upsert_slow_rule(
            SlowRule::new("private slow", 0, 100, 1)
                .min_speed("500 KB")
                .scope(PrivacyScope::Private),
        )
        .unwrap();

    let public = downloading_item("ffff", 1_000, 60);
    assert!(!engine.evaluate_slow(&public).await.unwrap().should_remove);

    let private = downloading_item("ffff", 1_000, 60).private(true);
    let result = engine.evaluate_slow(&private).await.unwrap();
    assert_eq!(result.reason, Some(DeleteReason::SlowSpeed));
}

// =============================================================================
// Rule Validation
// =============================================================================

#[tokio::test]
async fn test_overlapping_rule_rejected() {
    let engine = memory_engine().await;
    engine
        .rules()
        .upsert_stall_rule(StallRule::new("early", 0, 50, 3))
        .unwrap();

    // Touching at 50 is allowed
    engine
        .rules()
        .upsert_stall_rule(StallRule::new("late", 50, 100, 3))
        .unwrap();

    let err = engine
        .rules()
        .upsert_stall_rule(StallRule::new("middle", 40, 60, 3).scope(PrivacyScope::Private))
        .unwrap_err();
    assert!(matches!(err, WardenError::IntervalConflict { .. }));
    assert_eq!(engine.rules().stall_rules().len(), 2);
}

#[tokio::test]
async fn test_updating_rule_in_place() {
    let engine = memory_engine().await;
    let rule = StallRule::new("all", 0, 100, 3);
    engine.rules().upsert_stall_rule(rule.clone()).unwrap();

    // Same id never conflicts with itself
    let mut edited = rule;
    edited.max_strikes = 5;
    edited.max_progress = 80;
    engine.rules().upsert_stall_rule(edited).unwrap();

    let rules = engine.rules().stall_rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].max_strikes, 5);
    assert_eq!(engine.stall_gaps().len(), 2);
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_strikes_survive_restart() {
    let temp_dir = create_temp_dir();
    {
        let engine = persistent_engine(&temp_dir).await;
        engine
            .rules()
            .upsert_stall_rule(StallRule::new("stalled", 0, 100, 3))
            .unwrap();
        let item = stalled_item("ABCD", 20.0, 0);
        engine.evaluate_stall(&item).await;
        engine.evaluate_stall(&item).await;
    }

    let engine = persistent_engine(&temp_dir).await;
    engine.health_check().await.unwrap();
    engine
        .rules()
        .upsert_stall_rule(StallRule::new("stalled", 0, 100, 3))
        .unwrap();
    assert_eq!(engine.strikes_for("abcd").await.unwrap().len(), 2);

    let result = engine.evaluate_stall(&stalled_item("abcd", 20.0, 0)).await;
    assert!(result.should_remove);
}

#[tokio::test]
async fn test_unusable_database_falls_back_to_memory() {
    let temp_dir = create_temp_dir();
    // Parent of the database path is a regular file
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let path = blocker.join("strikes.db");

    let engine = WardenEngine::new(WardenConfig::default().database_path(&path))
        .await
        .unwrap();
    engine.strike("abcd", "item", 1, StrikeKind::FailedImport).await.unwrap();
    assert_eq!(engine.strikes_for("abcd").await.unwrap().len(), 1);
}

// =============================================================================
// Events and Recurring Items
// =============================================================================

#[tokio::test]
async fn test_limit_event_and_recurring_item() {
    let engine = memory_engine().await;
    engine
        .rules()
        .upsert_stall_rule(StallRule::new("stalled", 0, 100, 2))
        .unwrap();
    let mut events = engine.subscribe();

    let item = QueueItem::new("9999", "returning.iso").completion(1.0);
    engine.evaluate_stall(&item).await;
    engine.evaluate_stall(&item).await;

    let event = wait_for_event(
        &mut events,
        |e| matches!(e, StrikeEvent::LimitReached { .. }),
        Duration::from_secs(1),
    )
    .await;
    assert!(matches!(
        event,
        Some(StrikeEvent::LimitReached { count: 2, max_strikes: 2, .. })
    ));
    assert!(engine.recurring_items().is_empty());

    // Item was removed, came back and got struck again
    assert!(engine.evaluate_stall(&item).await.should_remove);
    assert_eq!(engine.recurring_items(), vec!["9999".to_string()]);
}

//! Sync, snapshot retention, and overlay-driven re-merge.

use super::support::{record, GatedRoster, MemoryOverlay, StaticRoster};
use outreach::engine::OutreachEngine;
use outreach::error::EngineError;
use outreach::overlay::StatusOverlay;
use outreach::types::{ContactState, StatusPatch, StatusRecord};
use std::sync::Arc;

fn sample_roster() -> Vec<outreach::types::ContactRecord> {
    vec![
        record("1", "Ana Diaz", Some("3624000000"), Some("Resistencia")),
        record("2", "Beto Sosa", Some("3624111111"), Some("Barranqueras")),
        record("3", "Carla Ruiz", Some("3624222222"), Some("Resistencia")),
    ]
}

#[tokio::test]
async fn test_sync_merges_roster_and_overlay() {
    let roster = Arc::new(StaticRoster::new(sample_roster()));
    let overlay = Arc::new(MemoryOverlay::new().with_record(
        "2",
        StatusRecord {
            state: ContactState::Contacted,
            last_contacted_at: None,
            contacted_by: Some("Maria Lopez".to_string()),
        },
    ));
    let engine = OutreachEngine::new(roster, overlay);

    let count = engine.sync().await.unwrap();
    assert_eq!(count, 3);

    let merged = engine.merged();
    assert_eq!(merged[0].state, ContactState::NotContacted);
    assert_eq!(merged[1].state, ContactState::Contacted);
    assert_eq!(merged[1].contacted_by.as_deref(), Some("Maria Lopez"));
    assert!(engine.last_synced_at().is_some());
}

#[tokio::test]
async fn test_failed_refresh_retains_last_good_snapshot() {
    let roster = Arc::new(StaticRoster::new(sample_roster()));
    let engine = OutreachEngine::new(roster.clone(), Arc::new(MemoryOverlay::new()));

    engine.sync().await.unwrap();
    assert_eq!(engine.merged().len(), 3);

    roster.set_fail(true);
    let err = engine.sync().await.unwrap_err();
    assert!(matches!(err, EngineError::RosterUnavailable(_)));

    // The prior merged set is still served.
    assert_eq!(engine.merged().len(), 3);
    assert_eq!(engine.merged()[0].name(), "Ana Diaz");
}

#[tokio::test]
async fn test_sync_before_first_success_yields_empty_view() {
    let roster = Arc::new(StaticRoster::new(sample_roster()));
    roster.set_fail(true);
    let engine = OutreachEngine::new(roster, Arc::new(MemoryOverlay::new()));

    assert!(engine.sync().await.is_err());
    assert!(engine.merged().is_empty());
    assert!(engine.last_synced_at().is_none());
}

#[tokio::test]
async fn test_overlay_notification_drives_re_merge() {
    let roster = Arc::new(StaticRoster::new(sample_roster()));
    let overlay = Arc::new(MemoryOverlay::new());
    let engine = OutreachEngine::new(roster, overlay.clone());

    engine.sync().await.unwrap();
    let mut subscription = engine.subscribe_overlay();

    overlay
        .upsert(
            &"1".to_string(),
            StatusPatch {
                state: Some(ContactState::Contacted),
                contacted_by: Some("Maria Lopez".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let snapshot = subscription.changed().await.unwrap();
    engine.apply_overlay_snapshot(snapshot);

    let merged = engine.merged();
    assert_eq!(merged[0].state, ContactState::Contacted);
    // The roster itself was not refetched; order and length are unchanged.
    assert_eq!(merged.len(), 3);
}

#[tokio::test]
async fn test_newer_sync_supersedes_in_flight_fetch() {
    let roster = Arc::new(GatedRoster::new(vec![record(
        "1",
        "Ana Diaz",
        None,
        None,
    )]));
    let engine = Arc::new(OutreachEngine::new(
        roster.clone(),
        Arc::new(MemoryOverlay::new()),
    ));

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.sync().await }
    });
    // Let the first sync take its ticket and block inside the fetch.
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    roster.set_records(vec![
        record("1", "Ana Diaz", None, None),
        record("2", "Beto Sosa", None, None),
    ]);
    let second = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.sync().await }
    });
    tokio::task::yield_now().await;

    roster.release(2);
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // The later request won; the stale single-record result was discarded.
    assert_eq!(engine.merged().len(), 2);
}

#[tokio::test]
async fn test_begin_contact_unknown_id() {
    let roster = Arc::new(StaticRoster::new(sample_roster()));
    let engine = OutreachEngine::new(roster, Arc::new(MemoryOverlay::new()));
    engine.sync().await.unwrap();

    let err = engine.begin_contact("no-such-id").unwrap_err();
    assert!(matches!(err, EngineError::ContactNotFound(_)));
}

//! Filtered views over the live merged set.

use super::support::{record, MemoryOverlay, RecordingHandoff, StaticRoster};
use outreach::engine::OutreachEngine;
use outreach::filter::{FilterState, StatusSelector};
use outreach::handoff::LinkConfig;
use outreach::identity::StaticActor;
use outreach::workflow::{MessageDispatcher, MessageTemplate};
use std::sync::Arc;

fn engine_with(overlay: Arc<MemoryOverlay>) -> OutreachEngine {
    let roster = Arc::new(StaticRoster::new(vec![
        record("1", "Ana Diaz", Some("3624000000"), Some("Resistencia")),
        record("2", "Beto Sosa", Some("3624111111"), Some("Barranqueras")),
        record("3", "Carla Ruiz", Some("3624222222"), Some("Resistencia")),
    ]));
    OutreachEngine::new(roster, overlay)
}

#[tokio::test]
async fn test_contacted_person_leaves_default_view_after_commit() {
    let overlay = Arc::new(MemoryOverlay::new());
    let engine = engine_with(overlay.clone());
    engine.sync().await.unwrap();

    let default_filter = FilterState::default();
    assert_eq!(engine.visible(&default_filter).len(), 3);

    // Contact Ana through the full workflow.
    let handoff = RecordingHandoff::default();
    let actor = StaticActor::new("Maria Lopez");
    let link = LinkConfig::default();
    let dispatcher =
        MessageDispatcher::new(overlay.as_ref(), &handoff, &actor, &link, "la asociación");

    let mut subscription = engine.subscribe_overlay();
    let mut session = engine.begin_contact("1").unwrap();
    session.begin().unwrap();
    session
        .choose_template(MessageTemplate::InitialGreeting)
        .unwrap();
    dispatcher.send(&mut session).await.unwrap();

    // Feed the overlay change back through the engine.
    let snapshot = subscription.changed().await.unwrap();
    engine.apply_overlay_snapshot(snapshot);

    // Ana no longer appears under the default not-contacted view but does
    // under the contacted selector.
    let visible = engine.visible(&default_filter);
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|c| c.id() != "1"));

    let contacted = engine.visible(&FilterState {
        status: StatusSelector::Contacted,
        ..FilterState::pass_all()
    });
    assert_eq!(contacted.len(), 1);
    assert_eq!(contacted[0].name(), "Ana Diaz");
}

#[tokio::test]
async fn test_search_and_locality_combined() {
    let engine = engine_with(Arc::new(MemoryOverlay::new()));
    engine.sync().await.unwrap();

    let filter = FilterState {
        search: "ruiz".to_string(),
        status: StatusSelector::All,
        locality: Some("Resistencia".to_string()),
    };
    let visible = engine.visible(&filter);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id(), "3");
}

#[tokio::test]
async fn test_locality_options_follow_the_merged_set() {
    let engine = engine_with(Arc::new(MemoryOverlay::new()));
    assert!(engine.locality_options().is_empty());

    engine.sync().await.unwrap();
    assert_eq!(
        engine.locality_options(),
        vec!["Resistencia", "Barranqueras"]
    );
}

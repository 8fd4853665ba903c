//! End-to-end engine flows against the in-memory remote: subscription
//! lifecycle, push application, mutation round-trips, and error surfacing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use uuid::Uuid;

use tiq_core::{project, Status, StatusFilter, Ticket, TicketDraft, TicketQuery, TicketStore};
use tiq_sync::{CreateError, EngineStatus, InMemoryRemote, RemoteError, SyncConfig, SyncEngine};

fn ticket(title: &str, status: Status) -> Ticket {
    Ticket {
        id: Uuid::new_v4(),
        title: title.into(),
        description: "desc".into(),
        status,
        done_by: None,
        user_email: None,
        created_at: Utc::now(),
    }
}

fn engine_for(remote: &Arc<InMemoryRemote>) -> SyncEngine {
    SyncEngine::new(
        remote.clone(),
        Arc::new(TicketStore::new()),
        SyncConfig::for_user("agent@example.com"),
    )
}

async fn wait_for_status(engine: &SyncEngine, pred: impl FnMut(&EngineStatus) -> bool) {
    let mut status = engine.status();
    timeout(Duration::from_secs(2), status.wait_for(pred))
        .await
        .expect("timed out waiting for engine status")
        .expect("engine status channel closed");
}

async fn wait_for_store(store: &TicketStore, pred: impl Fn(&[Ticket]) -> bool) {
    timeout(Duration::from_secs(2), async {
        loop {
            if pred(store.snapshot().tickets()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for store contents");
}

#[tokio::test]
async fn empty_collection_goes_live_with_empty_projection() {
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine_for(&remote);

    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;

    let snapshot = engine.store().snapshot();
    assert!(snapshot.is_empty());
    assert!(project(snapshot.tickets(), &TicketQuery::default()).is_empty());
}

#[tokio::test]
async fn pushed_snapshot_feeds_status_filtered_projection() {
    let remote = Arc::new(InMemoryRemote::seeded(vec![
        ticket("Printer broken", Status::Open),
        ticket("VPN issue", Status::Resolved),
    ]));
    let engine = engine_for(&remote);

    engine.start();
    wait_for_store(engine.store(), |tickets| tickets.len() == 2).await;

    let snapshot = engine.store().snapshot();
    let open_only = TicketQuery {
        search: String::new(),
        status: StatusFilter::Only(Status::Open),
    };
    let view = project(snapshot.tickets(), &open_only);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "Printer broken");
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_remote() {
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine_for(&remote);
    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;

    let draft = TicketDraft {
        title: "   ".into(),
        description: "x".into(),
        ..Default::default()
    };
    let err = engine.create_ticket(draft).await.unwrap_err();
    assert!(matches!(err, CreateError::Validation(_)));
    assert_eq!(remote.create_calls(), 0);
    assert!(engine.store().is_empty());
}

#[tokio::test]
async fn created_ticket_arrives_through_the_push_channel() {
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine_for(&remote);
    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;

    let draft = TicketDraft {
        title: "Disk full".into(),
        description: "Server A".into(),
        ..Default::default()
    };
    engine.create_ticket(draft).await.unwrap();

    wait_for_store(engine.store(), |tickets| {
        tickets.iter().any(|t| t.title == "Disk full")
    })
    .await;

    let snapshot = engine.store().snapshot();
    let created = snapshot
        .tickets()
        .iter()
        .find(|t| t.title == "Disk full")
        .unwrap();
    assert_eq!(created.status, Status::Open);
    assert_eq!(created.user_email.as_deref(), Some("agent@example.com"));
}

#[tokio::test]
async fn deleted_ticket_disappears_from_projection() {
    let victim = ticket("VPN issue", Status::Resolved);
    let victim_id = victim.id;
    let remote = Arc::new(InMemoryRemote::seeded(vec![
        ticket("Printer broken", Status::Open),
        victim,
    ]));
    let engine = engine_for(&remote);
    engine.start();
    wait_for_store(engine.store(), |tickets| tickets.len() == 2).await;

    engine.delete_ticket(victim_id).await.unwrap();
    wait_for_store(engine.store(), |tickets| tickets.len() == 1).await;

    let snapshot = engine.store().snapshot();
    assert!(snapshot.get(victim_id).is_none());
    let view = project(snapshot.tickets(), &TicketQuery::default());
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "Printer broken");
}

#[tokio::test]
async fn deleting_unknown_id_surfaces_not_found() {
    let remote = Arc::new(InMemoryRemote::seeded(vec![ticket(
        "Printer broken",
        Status::Open,
    )]));
    let engine = engine_for(&remote);
    engine.start();
    wait_for_store(engine.store(), |tickets| tickets.len() == 1).await;

    let unknown = Uuid::new_v4();
    let err = engine.delete_ticket(unknown).await.unwrap_err();
    assert_eq!(err, RemoteError::NotFound(unknown));

    // Local state is untouched and the engine keeps running.
    assert_eq!(engine.store().len(), 1);
    assert_eq!(engine.current_status(), EngineStatus::Live);
}

#[tokio::test]
async fn rejected_create_surfaces_remote_error() {
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine_for(&remote);
    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;

    remote.fail_next_create(RemoteError::Unauthorized("expired session".into()));
    let draft = TicketDraft {
        title: "Disk full".into(),
        description: "Server A".into(),
        ..Default::default()
    };
    let err = engine.create_ticket(draft).await.unwrap_err();
    assert!(matches!(err, CreateError::Remote(RemoteError::Unauthorized(_))));
    assert!(engine.store().is_empty());
}

#[tokio::test]
async fn subscription_failure_parks_engine_until_restarted() {
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine_for(&remote);
    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;

    remote.fail_subscriptions("link down");
    wait_for_status(&engine, |s| matches!(s, EngineStatus::Errored(_))).await;

    // No retry happens on its own; an explicit start re-subscribes.
    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;
}

#[tokio::test]
async fn stop_releases_the_subscription() {
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine_for(&remote);
    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;

    engine.stop();
    assert_eq!(engine.current_status(), EngineStatus::Unsubscribed);

    timeout(Duration::from_secs(2), async {
        while remote.subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("subscription was not released");

    // Pushes after stop never reach the store.
    remote.push_snapshot(vec![ticket("late arrival", Status::Open)]);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(engine.store().is_empty());

    // stop is idempotent.
    engine.stop();
    assert_eq!(engine.current_status(), EngineStatus::Unsubscribed);
}

#[tokio::test]
async fn start_is_idempotent_while_active() {
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine_for(&remote);
    engine.start();
    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;
    assert_eq!(remote.subscriber_count(), 1);
}

#[tokio::test]
async fn later_push_wins_in_full() {
    let remote = Arc::new(InMemoryRemote::new());
    let engine = engine_for(&remote);
    engine.start();
    wait_for_status(&engine, |s| *s == EngineStatus::Live).await;

    let first = vec![
        ticket("Printer broken", Status::Open),
        ticket("VPN issue", Status::Resolved),
    ];
    let second = vec![ticket("Disk full", Status::Open)];
    remote.push_snapshot(first);
    remote.push_snapshot(second.clone());

    wait_for_store(engine.store(), |tickets| {
        tickets.len() == 1 && tickets[0].id == second[0].id
    })
    .await;
    assert_eq!(engine.store().snapshot().tickets(), &second[..]);
}

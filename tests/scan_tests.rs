//! Single-pass scan engine tests.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use common::FakeStore;
use mailprune::{
    ErrorCode, MailboxStore, MessageModel, RetentionMetrics, RetentionPolicy, ScanEngine,
};

const DAY: u64 = 24 * 60 * 60;

fn engine(
    store: Arc<FakeStore>,
    days: u64,
    throttle: Duration,
) -> (ScanEngine, Arc<RetentionMetrics>) {
    let metrics = Arc::new(RetentionMetrics::new(10));
    let policy = RetentionPolicy::new(Duration::from_secs(days * DAY), throttle);
    (ScanEngine::new(store, policy, metrics.clone()), metrics)
}

#[tokio::test]
async fn test_deletes_only_expired_messages() {
    let store = FakeStore::new();
    store.add_aged("alice", "a-10d", 10).await;
    store.add_aged("alice", "a-40d", 40).await;
    store.add_aged("bob", "b-5d", 5).await;
    store.add_aged("bob", "b-3d", 3).await;

    let (engine, metrics) = engine(store.clone(), 30, Duration::ZERO);
    let before = metrics.deletes_total();

    let outcome = engine.run_once(&CancellationToken::new()).await.unwrap();

    assert_eq!(store.deletes(), vec!["a-40d".to_string()]);
    assert_eq!(outcome.deletes_attempted, 1);
    assert_eq!(outcome.deletes_succeeded, 1);
    assert_eq!(outcome.retained, 3);
    assert_eq!(outcome.mailboxes_scanned, 2);
    assert!(outcome.is_complete());
    assert!(!outcome.interrupted);

    assert_eq!(metrics.deletes_total(), before + 1);
    assert_eq!(metrics.retained_current(), 3);
    assert_eq!(store.ids("alice").await, vec!["a-10d".to_string()]);
}

#[tokio::test]
async fn test_delete_failure_does_not_stop_pass() {
    let store = FakeStore::new();
    store.add_aged("alice", "a-old-1", 60).await;
    store.add_aged("alice", "a-old-2", 50).await;
    store.add_aged("bob", "b-old", 45).await;
    store.add_aged("bob", "b-new", 1).await;
    store.fail_delete("a-old-1");

    let (engine, metrics) = engine(store.clone(), 30, Duration::ZERO);
    let outcome = engine.run_once(&CancellationToken::new()).await.unwrap();

    let mut deletes = store.deletes();
    deletes.sort();
    assert_eq!(deletes, vec!["a-old-1", "a-old-2", "b-old"]);
    assert_eq!(outcome.deletes_attempted, 3);
    assert_eq!(outcome.deletes_succeeded, 2);
    assert_eq!(outcome.deletes_failed, 1);
    assert_eq!(outcome.retained, 1);
    assert_eq!(metrics.deletes_total(), 2);
    assert_eq!(store.ids("alice").await, vec!["a-old-1".to_string()]);
    assert_eq!(store.ids("bob").await, vec!["b-new".to_string()]);
}

#[tokio::test]
async fn test_each_expired_message_deleted_once() {
    let store = FakeStore::new();
    for i in 0..5 {
        store.add_aged("carol", &format!("old-{}", i), 31 + i).await;
        store.add_aged("carol", &format!("new-{}", i), i).await;
    }

    let (engine, metrics) = engine(store.clone(), 30, Duration::ZERO);
    engine.run_once(&CancellationToken::new()).await.unwrap();
    // A second pass finds nothing left to delete
    let second = engine.run_once(&CancellationToken::new()).await.unwrap();

    let deletes = store.deletes();
    assert_eq!(deletes.len(), 5);
    assert!(deletes.iter().all(|id| id.starts_with("old-")));
    assert_eq!(second.deletes_attempted, 0);
    assert_eq!(second.retained, 5);
    assert_eq!(metrics.deletes_total(), 5);
    assert_eq!(metrics.retained_current(), 5);
}

#[tokio::test]
async fn test_message_at_cutoff_is_retained() {
    let store = FakeStore::new();
    let now = Utc::now();
    let period = ChronoDuration::hours(1);
    store
        .deliver(MessageModel::new("dave").with_id("at-cutoff").with_date(now - period))
        .await
        .unwrap();
    store
        .deliver(
            MessageModel::new("dave")
                .with_id("past-cutoff")
                .with_date(now - period - ChronoDuration::milliseconds(1)),
        )
        .await
        .unwrap();

    let metrics = Arc::new(RetentionMetrics::new(10));
    let policy = RetentionPolicy::new(Duration::from_secs(3600), Duration::ZERO);
    let engine = ScanEngine::new(store.clone(), policy, metrics);

    let outcome = engine.run_at(now, &CancellationToken::new()).await.unwrap();

    assert_eq!(store.deletes(), vec!["past-cutoff".to_string()]);
    assert_eq!(outcome.retained, 1);
}

#[tokio::test]
async fn test_empty_store_is_successful_pass() {
    let store = FakeStore::new();
    let (engine, metrics) = engine(store.clone(), 30, Duration::ZERO);
    let before = metrics.scan_completed();

    let outcome = engine.run_once(&CancellationToken::new()).await.unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.mailboxes_scanned, 0);
    assert_eq!(outcome.retained, 0);
    assert!(metrics.scan_completed() >= before);
}

#[tokio::test]
async fn test_list_mailboxes_error_propagates() {
    let store = FakeStore::new();
    store.add_aged("erin", "old", 90).await;
    store.fail_list_mailboxes(true);

    let (engine, metrics) = engine(store.clone(), 30, Duration::ZERO);
    let before = metrics.scan_completed();

    let err = engine.run_once(&CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::StoreUnavailable);
    assert_eq!(err.message, "mailbox index offline");
    assert!(store.deletes().is_empty());
    assert_eq!(metrics.scan_completed(), before);
}

#[tokio::test]
async fn test_list_messages_error_aborts_whole_pass() {
    let store = FakeStore::new();
    store.add_aged("a-box", "a-new", 1).await;
    store.add_aged("b-box", "b-old", 90).await;
    store.add_aged("c-box", "c-old", 90).await;
    store.fail_list_messages("b-box");

    let (engine, metrics) = engine(store.clone(), 30, Duration::ZERO);
    metrics.set_retained(42);
    let before = metrics.scan_completed();

    let err = engine.run_once(&CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::InternalError);
    assert!(store.deletes().is_empty());
    assert_eq!(store.ids("c-box").await, vec!["c-old".to_string()]);
    // Nothing is published for an aborted pass
    assert_eq!(metrics.retained_current(), 42);
    assert_eq!(metrics.scan_completed(), before);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_throttle_stops_pass() {
    let store = FakeStore::new();
    store.add_aged("a-box", "a-old", 90).await;
    store.add_aged("b-box", "b-old", 90).await;
    store.add_aged("c-box", "c-old", 90).await;

    let (engine, metrics) = engine(store.clone(), 30, Duration::from_secs(10));
    metrics.set_retained(7);
    let before = metrics.scan_completed();

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(async move { engine.run_once(&token).await });

    // The pass is now sleeping after the first mailbox
    tokio::time::sleep(Duration::from_secs(5)).await;
    shutdown.cancel();

    let outcome = handle.await.unwrap().unwrap();

    assert!(outcome.interrupted);
    assert!(!outcome.is_complete());
    assert_eq!(outcome.mailboxes_scanned, 1);
    assert_eq!(outcome.deletes_succeeded, 1);
    assert_eq!(store.deletes(), vec!["a-old".to_string()]);
    assert_eq!(metrics.deletes_total(), 1);
    assert_eq!(metrics.retained_current(), 7);
    assert_eq!(metrics.scan_completed(), before);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_between_mailboxes() {
    let store = FakeStore::new();
    for name in ["a-box", "b-box", "c-box"] {
        store.add_aged(name, "new", 1).await;
    }

    let (engine, _metrics) = engine(store.clone(), 30, Duration::from_millis(250));
    let started = tokio::time::Instant::now();

    let outcome = engine.run_once(&CancellationToken::new()).await.unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.retained, 3);
    assert!(started.elapsed() >= Duration::from_millis(750));
}

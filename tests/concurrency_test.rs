//! Concurrency tests for newsgrab.
//!
//! Sweeps of the same source may overlap when one runs longer than the poll
//! delay. These tests verify that the item table's uniqueness keeps such
//! sweeps from storing or announcing an item twice.

mod common;

use std::sync::Arc;

use tokio::sync::Barrier;

use newsgrab::sync::ManualClock;
use newsgrab::{Database, ItemRepository};

use common::{create_group, day, raw, sqlite_engine, RecordingNotifier, ScriptedSource};

/// Test two sweeps racing over the same group.
///
/// Both sweeps fetch the first page before either stores anything, so both
/// see the same cursor and both try to insert the same items.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_sweeps_store_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("newsgrab.db")).await.unwrap();
    let group = create_group(&db, "100", "test", "club", day(1)).await;

    let gate = Arc::new(Barrier::new(2));
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(day(10)));

    let mut handles = Vec::new();
    for _ in 0..2 {
        let source = Arc::new(ScriptedSource::new("test", 3).with_gate(Arc::clone(&gate)));
        source.set_page(0, vec![raw("b", 3), raw("a", 2)]);
        let engine = sqlite_engine(&db, source, notifier.clone(), clock.clone());
        handles.push(tokio::spawn(async move { engine.sweep().await }));
    }

    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.synced, 1);
    }

    let items = ItemRepository::new(db.pool().clone());
    assert_eq!(items.count_by_group(group.id).await.unwrap(), 2);

    let mut sent: Vec<String> = notifier.sent().into_iter().map(|(_, text)| text).collect();
    sent.sort();
    assert_eq!(sent, vec!["test/club/a", "test/club/b"]);
}

/// Test many sweeps racing over the same group.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_overlapping_sweeps() {
    const NUM_SWEEPS: usize = 5;

    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("newsgrab.db")).await.unwrap();
    let group = create_group(&db, "100", "test", "club", day(1)).await;

    let gate = Arc::new(Barrier::new(NUM_SWEEPS));
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(day(20)));

    let mut handles = Vec::new();
    for _ in 0..NUM_SWEEPS {
        let source = Arc::new(ScriptedSource::new("test", 2).with_gate(Arc::clone(&gate)));
        source.set_page(0, vec![raw("e", 9), raw("d", 8)]);
        let engine = sqlite_engine(&db, source, notifier.clone(), clock.clone());
        handles.push(tokio::spawn(async move { engine.sweep().await }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let items = ItemRepository::new(db.pool().clone());
    assert_eq!(items.count_by_group(group.id).await.unwrap(), 2);
    assert_eq!(notifier.sent().len(), 2);
}

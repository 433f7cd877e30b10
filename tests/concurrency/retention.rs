//! Retention Tests
//!
//! Tests vacuum: old versions are dropped only once no active snapshot can
//! observe them, tombstone floors disappear, and finished transaction
//! records are purged.

use crate::common::*;

#[test]
fn unbounded_store_keeps_every_version() {
    let store = create_store();
    for i in 0..20 {
        commit_one(&store, "k", i);
    }
    assert_eq!(versions_of(&store, "k").len(), 20);
}

#[test]
fn vacuum_without_readers_keeps_latest_only() {
    let store = create_store();
    for i in 0..5 {
        commit_one(&store, "k", i);
    }

    let stats = store.vacuum();

    assert_eq!(stats.low_watermark, 5);
    assert_eq!(stats.versions_removed, 4);
    assert_eq!(versions_of(&store, "k"), vec![5]);
}

#[test]
fn vacuum_keeps_floor_for_oldest_snapshot() {
    let store = create_store();
    commit_one(&store, "k", "v1");
    commit_one(&store, "k", "v2");
    let old = store.begin();
    commit_one(&store, "k", "v3");
    let newer = store.begin();
    commit_one(&store, "k", "v4");

    store.vacuum();

    assert_eq!(versions_of(&store, "k"), vec![4, 3, 2]);
    assert_eq!(store.read(old, "k"), Some(Value::from("v2")));
    assert_eq!(store.read(newer, "k"), Some(Value::from("v3")));
}

#[test]
fn vacuum_drops_fully_deleted_keys() {
    let store = create_store();
    commit_one(&store, "gone", 1);
    let deleter = store.begin();
    store.delete(deleter, "gone");
    assert!(store.commit(deleter));
    commit_one(&store, "kept", 1);

    let stats = store.vacuum();

    assert_eq!(stats.keys_removed, 1);
    assert!(store.history("gone").is_empty());
    assert_eq!(store.key_count(), 1);
    let reader = store.begin();
    assert_eq!(store.read(reader, "gone"), None);
}

#[test]
fn tombstone_floor_dropped_without_changing_reads() {
    let store = create_store();
    commit_one(&store, "k", 1);
    let deleter = store.begin();
    store.delete(deleter, "k");
    assert!(store.commit(deleter));
    let between = store.begin();
    commit_one(&store, "k", 3);

    store.vacuum();

    assert_eq!(store.read(between, "k"), None);
    assert_eq!(versions_of(&store, "k"), vec![3]);
}

#[test]
fn vacuum_purges_finished_transactions() {
    let store = create_store();
    let committed = store.begin();
    assert!(store.commit(committed));
    let aborted = store.begin();
    assert!(store.abort(aborted));
    let active = store.begin();

    store.vacuum();

    assert_eq!(store.status(committed), None);
    assert_eq!(store.status(aborted), None);
    assert_eq!(store.status(active), Some(TransactionStatus::Active));
    assert!(!store.commit(committed));
    assert!(store.commit(active));
}

#[test]
fn vacuum_does_not_disturb_conflict_detection() {
    let store = create_store();
    commit_one(&store, "k", 0);
    let loser = store.begin();
    store.write(loser, "k", 1);
    for i in 0..3 {
        commit_one(&store, "k", i + 10);
    }

    store.vacuum();

    assert!(!store.commit(loser));
}

#[test]
fn auto_vacuum_bounds_chain_length() {
    let store = create_auto_vacuum_store(4);
    for i in 0..40 {
        commit_one(&store, "k", i);
    }
    assert!(versions_of(&store, "k").len() <= 4);
}

#[test]
fn auto_vacuum_respects_long_reader() {
    let store = create_auto_vacuum_store(2);
    commit_one(&store, "k", "original");
    let reader = store.begin();
    for i in 0..10 {
        commit_one(&store, "k", i);
    }

    assert_eq!(store.read(reader, "k"), Some(Value::from("original")));
    assert_eq!(store.status(reader), Some(TransactionStatus::Active));
}

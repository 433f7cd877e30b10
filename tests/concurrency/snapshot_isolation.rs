//! Snapshot Isolation Tests
//!
//! Tests the snapshot isolation guarantees:
//! - Point-in-time consistency
//! - Repeatable reads
//! - Read-your-writes semantics

use crate::common::*;

// ============================================================================
// Point-in-Time Consistency
// ============================================================================

#[test]
fn snapshot_sees_only_commits_before_begin() {
    let store = create_store();
    commit_one(&store, "k", 1);

    let reader = store.begin();
    commit_one(&store, "k", 2);
    commit_one(&store, "other", "late");

    assert_eq!(store.read(reader, "k"), Some(Value::Int(1)));
    assert_eq!(store.read(reader, "other"), None);
}

#[test]
fn snapshot_of_empty_store_sees_nothing() {
    let store = create_store();
    let reader = store.begin();
    commit_one(&store, "k", 1);

    assert_eq!(store.read(reader, "k"), None);
}

#[test]
fn multi_key_commit_is_visible_atomically() {
    let store = create_store();
    let before = store.begin();
    let version = commit_values(&store, [("a", 1), ("b", 2), ("c", 3)]);
    let after = store.begin();

    for key in ["a", "b", "c"] {
        assert_eq!(store.read(before, key), None);
        assert!(store.read(after, key).is_some());
        assert_eq!(versions_of(&store, key), vec![version]);
    }
}

#[test]
fn begin_captures_current_version() {
    let store = create_store();
    assert_eq!(store.current_version(), 0);
    commit_one(&store, "k", 1);
    commit_one(&store, "k", 2);

    let txn = store.begin();
    store.write(txn, "k", 3);
    assert_eq!(store.try_commit(txn), Ok(3));
}

// ============================================================================
// Repeatable Reads
// ============================================================================

#[test]
fn repeated_reads_return_same_value() {
    let store = create_store();
    commit_one(&store, "k", "v1");
    let reader = store.begin();

    let first = store.read(reader, "k");
    commit_one(&store, "k", "v2");
    let second = store.read(reader, "k");
    store.vacuum();
    let third = store.read(reader, "k");

    assert_eq!(first, Some(Value::from("v1")));
    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn deleted_key_still_visible_to_older_snapshot() {
    let store = create_store();
    commit_one(&store, "k", 10);
    let reader = store.begin();

    let deleter = store.begin();
    store.delete(deleter, "k");
    assert!(store.commit(deleter));

    assert_eq!(store.read(reader, "k"), Some(Value::Int(10)));
    let fresh = store.begin();
    assert_eq!(store.read(fresh, "k"), None);
}

#[test]
fn key_recreated_after_delete() {
    let store = create_store();
    commit_one(&store, "k", 1);
    let deleter = store.begin();
    store.delete(deleter, "k");
    assert!(store.commit(deleter));
    let between = store.begin();
    commit_one(&store, "k", 3);

    assert_eq!(store.read(between, "k"), None);
    let fresh = store.begin();
    assert_eq!(store.read(fresh, "k"), Some(Value::Int(3)));
    assert_eq!(versions_of(&store, "k"), vec![3, 2, 1]);
}

// ============================================================================
// Read-Your-Writes
// ============================================================================

#[test]
fn own_write_visible_before_commit() {
    let store = create_store();
    commit_one(&store, "k", 1);
    let txn = store.begin();
    let other = store.begin();

    store.write(txn, "k", 2);
    assert_eq!(store.read(txn, "k"), Some(Value::Int(2)));
    assert_eq!(store.read(other, "k"), Some(Value::Int(1)));
}

#[test]
fn last_buffered_write_wins() {
    let store = create_store();
    let txn = store.begin();
    store.write(txn, "k", 1);
    store.write(txn, "k", 2);
    store.write(txn, "k", 3);
    assert_eq!(store.read(txn, "k"), Some(Value::Int(3)));
    assert!(store.commit(txn));

    assert_eq!(versions_of(&store, "k").len(), 1);
    let reader = store.begin();
    assert_eq!(store.read(reader, "k"), Some(Value::Int(3)));
}

#[test]
fn write_after_delete_restores_key() {
    let store = create_store();
    commit_one(&store, "k", 1);
    let txn = store.begin();
    store.delete(txn, "k");
    assert_eq!(store.read(txn, "k"), None);
    store.write(txn, "k", 5);
    assert_eq!(store.read(txn, "k"), Some(Value::Int(5)));
    assert!(store.commit(txn));

    let reader = store.begin();
    assert_eq!(store.read(reader, "k"), Some(Value::Int(5)));
}

#[test]
fn uncommitted_writes_never_visible_to_others() {
    let store = create_store();
    let writer = store.begin();
    store.write(writer, "k", "dirty");

    let reader = store.begin();
    assert_eq!(store.read(reader, "k"), None);

    assert!(store.abort(writer));
    let later = store.begin();
    assert_eq!(store.read(later, "k"), None);
}

//! Conflict Detection Tests
//!
//! Tests first-committer-wins on the write set:
//! - Concurrent writers of one key: the later committer aborts
//! - Disjoint write sets never conflict
//! - Read sets are never validated, so write skew is allowed

use crate::common::*;

// ============================================================================
// First-Committer-Wins
// ============================================================================

#[test]
fn second_writer_of_same_key_aborts() {
    let store = create_store();
    commit_one(&store, "x", 1);

    let t2 = store.begin();
    let t3 = store.begin();
    store.write(t2, "x", 2);
    store.write(t3, "x", 3);

    assert!(store.commit(t2));
    assert!(!store.commit(t3));
    assert!(is_aborted(&store, t3));
    assert_eq!(versions_of(&store, "x"), vec![2, 1]);

    let reader = store.begin();
    assert_eq!(store.read(reader, "x"), Some(Value::Int(2)));
}

#[test]
fn conflict_error_names_the_keys() {
    let store = create_store();
    let loser = store.begin();
    store.write(loser, "b", 0);
    store.write(loser, "a", 0);
    store.write(loser, "untouched", 0);

    commit_values(&store, [("a", 1), ("b", 1)]);

    match store.try_commit(loser) {
        Err(StoreError::WriteConflict { txn, keys }) => {
            assert_eq!(txn, loser);
            assert_eq!(keys, vec![Key::from("a"), Key::from("b")]);
        }
        other => panic!("expected write conflict, got {:?}", other),
    }
    assert!(store.history("untouched").is_empty());
}

#[test]
fn delete_conflicts_with_concurrent_write() {
    let store = create_store();
    commit_one(&store, "k", 1);

    let deleter = store.begin();
    let writer = store.begin();
    store.delete(deleter, "k");
    store.write(writer, "k", 2);

    assert!(store.commit(writer));
    assert!(!store.commit(deleter));

    let reader = store.begin();
    assert_eq!(store.read(reader, "k"), Some(Value::Int(2)));
}

#[test]
fn conflicting_commit_installs_nothing() {
    let store = create_store();
    let loser = store.begin();
    store.write(loser, "shared", "loser");
    store.write(loser, "private", "loser");

    commit_one(&store, "shared", "winner");
    let version_before = store.current_version();

    assert!(!store.commit(loser));
    assert_eq!(store.current_version(), version_before);
    assert!(store.history("private").is_empty());
}

#[test]
fn aborted_transaction_rejects_further_operations() {
    let store = create_store();
    let loser = store.begin();
    store.write(loser, "k", 1);
    commit_one(&store, "k", 2);
    assert!(!store.commit(loser));

    assert!(!store.commit(loser));
    assert!(!store.abort(loser));
    assert!(matches!(
        store.try_write(loser, "k", 3),
        Err(StoreError::TransactionNotActive { .. })
    ));
}

// ============================================================================
// Non-Conflicts
// ============================================================================

#[test]
fn disjoint_write_sets_both_commit() {
    let store = create_store();
    let t1 = store.begin();
    let t2 = store.begin();
    store.write(t1, "a", 1);
    store.write(t2, "b", 2);

    assert!(store.commit(t1));
    assert!(store.commit(t2));
}

#[test]
fn sequential_writers_never_conflict() {
    let store = create_store();
    for i in 0..10 {
        let txn = store.begin();
        store.write(txn, "k", i);
        assert!(store.commit(txn), "commit {} should succeed", i);
    }
    assert_eq!(versions_of(&store, "k").len(), 10);
}

#[test]
fn read_only_transaction_always_commits() {
    let store = create_store();
    commit_one(&store, "k", 1);
    let reader = store.begin();
    assert_eq!(store.read(reader, "k"), Some(Value::Int(1)));

    commit_one(&store, "k", 2);
    assert!(store.commit(reader));
}

#[test]
fn write_skew_is_allowed() {
    let store = create_store();
    commit_values(&store, [("alice_on_call", true), ("bob_on_call", true)]);

    let t1 = store.begin();
    let t2 = store.begin();

    // Each sees both on call and takes itself off
    assert_eq!(store.read(t1, "bob_on_call"), Some(Value::Bool(true)));
    assert_eq!(store.read(t2, "alice_on_call"), Some(Value::Bool(true)));
    store.write(t1, "alice_on_call", false);
    store.write(t2, "bob_on_call", false);

    assert!(store.commit(t1));
    assert!(store.commit(t2));

    let reader = store.begin();
    assert_eq!(store.read(reader, "alice_on_call"), Some(Value::Bool(false)));
    assert_eq!(store.read(reader, "bob_on_call"), Some(Value::Bool(false)));
}

// ============================================================================
// Under Real Threads
// ============================================================================

#[test]
fn exactly_one_of_many_concurrent_writers_wins() {
    let store = create_store();
    commit_one(&store, "contested", 0);

    let txns: Vec<TxnId> = (0..16)
        .map(|i| {
            let txn = store.begin();
            store.write(txn, "contested", i);
            txn
        })
        .collect();

    let shared = std::sync::Arc::clone(&store);
    let txns_for_threads = txns.clone();
    let outcomes = run_concurrent(16, move |i| shared.commit(txns_for_threads[i]));

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(versions_of(&store, "contested").len(), 2);
    assert_eq!(store.metrics().total_conflicts, 15);
}

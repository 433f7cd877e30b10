//! Transaction context for OCC
//!
//! This module implements the per-transaction data structure for optimistic
//! concurrency control. TransactionContext tracks the snapshot watermark,
//! the keys read, and the writes and deletes buffered until commit.

use rustc_hash::{FxHashMap, FxHashSet};
use snapkv_core::{Key, Result, StoreError, TxnId, Value};
use snapkv_storage::{StoredValue, VersionedStore};
use std::fmt;

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Committed` (validation passed, writes installed)
/// - `Active` → `Aborted` (user abort or write-write conflict)
///
/// Terminal states (no transitions allowed):
/// - `Committed`
/// - `Aborted`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction committed successfully
    Committed {
        /// Version all of its writes were installed at
        version: u64,
    },
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

impl TransactionStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Active)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Active => write!(f, "Active"),
            TransactionStatus::Committed { .. } => write!(f, "Committed"),
            TransactionStatus::Aborted { .. } => write!(f, "Aborted"),
        }
    }
}

/// Summary of pending operations that would be discarded on abort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperations {
    /// Number of pending put operations
    pub puts: usize,
    /// Number of pending delete operations
    pub deletes: usize,
}

impl PendingOperations {
    /// Total number of pending operations
    pub fn total(&self) -> usize {
        self.puts + self.deletes
    }

    /// Check if there are no pending operations
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Result of installing a transaction's writes
///
/// All keys in a transaction get the same commit version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyResult {
    /// Version assigned to all writes in this transaction
    pub commit_version: u64,
    /// Number of puts applied
    pub puts_applied: usize,
    /// Number of deletes applied
    pub deletes_applied: usize,
}

/// Transaction context for OCC with snapshot isolation
///
/// # Read-Your-Writes Semantics
///
/// When reading a key, the transaction checks in order:
/// 1. **write_set**: Returns uncommitted write from this transaction
/// 2. **delete_set**: Returns None for uncommitted delete
/// 3. **snapshot**: Returns the newest committed entry at or before
///    `start_version`, and records the key in `read_set`
///
/// # Read-Set Tracking
///
/// The read set is bookkeeping only. Commit validates the write set alone,
/// so this is snapshot isolation, not serializability: write skew is
/// allowed.
#[derive(Debug)]
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: TxnId,

    /// Highest committed version visible to this transaction
    ///
    /// Fixed at begin and never changed.
    pub start_version: u64,

    /// Keys read from the snapshot
    pub read_set: FxHashSet<Key>,

    /// Keys written with their new values (buffered)
    ///
    /// These writes are not visible to other transactions until commit.
    pub write_set: FxHashMap<Key, Value>,

    /// Keys to delete (buffered)
    ///
    /// A deleted key returns None when read within this transaction.
    pub delete_set: FxHashSet<Key>,

    /// Current transaction status
    pub status: TransactionStatus,
}

impl TransactionContext {
    /// Create an active transaction reading at `start_version`
    pub fn new(txn_id: TxnId, start_version: u64) -> Self {
        TransactionContext {
            txn_id,
            start_version,
            read_set: FxHashSet::default(),
            write_set: FxHashMap::default(),
            delete_set: FxHashSet::default(),
            status: TransactionStatus::Active,
        }
    }

    /// Check if transaction is still active
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Return an error unless the transaction is active
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(StoreError::TransactionNotActive {
                txn: self.txn_id,
                state: self.status.to_string(),
            })
        }
    }

    /// Read a key with read-your-writes semantics
    pub fn get(&mut self, key: &Key, store: &VersionedStore) -> Result<Option<Value>> {
        self.ensure_active()?;

        if let Some(value) = self.write_set.get(key) {
            return Ok(Some(value.clone()));
        }
        if self.delete_set.contains(key) {
            return Ok(None);
        }

        self.read_set.insert(key.clone());
        Ok(store
            .get_at_version(key, self.start_version)
            .and_then(StoredValue::value)
            .cloned())
    }

    /// Buffer a write, replacing any pending write or delete of the key
    pub fn put(&mut self, key: Key, value: Value) -> Result<()> {
        self.ensure_active()?;
        self.delete_set.remove(&key);
        self.write_set.insert(key, value);
        Ok(())
    }

    /// Buffer a delete, replacing any pending write of the key
    pub fn delete(&mut self, key: Key) -> Result<()> {
        self.ensure_active()?;
        self.write_set.remove(&key);
        self.delete_set.insert(key);
        Ok(())
    }

    /// Keys this transaction would modify on commit
    pub fn written_keys(&self) -> impl Iterator<Item = &Key> {
        self.write_set.keys().chain(self.delete_set.iter())
    }

    /// Summary of buffered operations
    pub fn pending_operations(&self) -> PendingOperations {
        PendingOperations {
            puts: self.write_set.len(),
            deletes: self.delete_set.len(),
        }
    }

    /// Install all buffered writes and deletes at `commit_version`
    ///
    /// Drains the write and delete sets. Must only be called after
    /// validation has passed.
    pub fn apply_writes(&mut self, store: &mut VersionedStore, commit_version: u64) -> ApplyResult {
        let puts_applied = self.write_set.len();
        let deletes_applied = self.delete_set.len();

        for (key, value) in self.write_set.drain() {
            store.append(key, StoredValue::live(commit_version, value));
        }
        for key in self.delete_set.drain() {
            store.append(key, StoredValue::tombstone(commit_version));
        }

        ApplyResult {
            commit_version,
            puts_applied,
            deletes_applied,
        }
    }

    /// Transition `Active` → `Committed`
    pub fn mark_committed(&mut self, version: u64) -> Result<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Committed { version };
        self.discard_buffers();
        Ok(())
    }

    /// Transition `Active` → `Aborted`, discarding all buffered operations
    pub fn mark_aborted(&mut self, reason: impl Into<String>) -> Result<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Aborted {
            reason: reason.into(),
        };
        self.discard_buffers();
        Ok(())
    }

    fn discard_buffers(&mut self) {
        self.read_set = FxHashSet::default();
        self.write_set = FxHashMap::default();
        self.delete_set = FxHashSet::default();
    }
}

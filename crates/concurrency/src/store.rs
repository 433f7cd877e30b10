//! Snapshot-isolated transactional store
//!
//! `TransactionalStore` ties the pieces together: one `parking_lot::Mutex`
//! guards the version chains, the active transactions and the version
//! counters. Every operation takes that lock for its whole duration, so
//! `begin` snapshots a consistent watermark and `commit` validates and
//! installs atomically.
//!
//! No operation ever waits on another transaction. Conflicts are found
//! optimistically at commit time (first-committer-wins), so there are no
//! per-key locks and no deadlocks; the cost is that a losing transaction's
//! work is discarded.
//!
//! # Two API layers
//!
//! - `begin`, `read`, `write`, `delete`, `commit`, `abort` never fail
//!   loudly: an unknown or finished transaction id yields `None`, a no-op
//!   or `false`.
//! - `try_read`, `try_write`, `try_delete`, `try_commit`, `try_abort`
//!   report why with a `StoreError`.
//!
//! # Example
//!
//! ```
//! use snapkv_concurrency::TransactionalStore;
//! use snapkv_core::Value;
//!
//! let store = TransactionalStore::new();
//! let t1 = store.begin();
//! store.write(t1, "x", Value::Int(1));
//! assert!(store.commit(t1));
//!
//! let t2 = store.begin();
//! assert_eq!(store.read(t2, "x"), Some(Value::Int(1)));
//! ```

use crate::config::{RetentionPolicy, RetryConfig, StoreConfig};
use crate::manager::TransactionManager;
use crate::metrics::{MetricsRecorder, TransactionMetrics};
use crate::transaction::{PendingOperations, TransactionContext, TransactionStatus};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use snapkv_core::{Key, Result, StoreError, TxnId, Value};
use snapkv_storage::{StoredValue, VacuumStats, VersionedStore};
use std::collections::VecDeque;
use std::thread;
use tracing::{debug, warn};

/// How many finished transactions keep a queryable final status
pub const FINISHED_STATUS_CAPACITY: usize = 1024;

/// Final statuses of the most recently finished transactions
///
/// Once full, the oldest entry is evicted for each new one; an evicted id
/// reads as unknown.
#[derive(Debug)]
struct FinishedTransactions {
    statuses: FxHashMap<TxnId, TransactionStatus>,
    order: VecDeque<TxnId>,
    capacity: usize,
}

impl FinishedTransactions {
    fn with_capacity(capacity: usize) -> Self {
        FinishedTransactions {
            statuses: FxHashMap::default(),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn record(&mut self, txn: TxnId, status: TransactionStatus) {
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.statuses.remove(&evicted);
            }
        }
        self.order.push_back(txn);
        self.statuses.insert(txn, status);
    }

    fn get(&self, txn: &TxnId) -> Option<&TransactionStatus> {
        self.statuses.get(txn)
    }

    fn clear(&mut self) {
        self.statuses.clear();
        self.order.clear();
    }
}

/// Everything guarded by the store lock
struct StoreInner {
    manager: TransactionManager,
    storage: VersionedStore,
    /// Active transactions only
    active: FxHashMap<TxnId, TransactionContext>,
    finished: FinishedTransactions,
    commits_since_vacuum: u64,
}

/// Active transaction `txn`, or the reason it is not one
fn active_mut<'a>(
    active: &'a mut FxHashMap<TxnId, TransactionContext>,
    finished: &FinishedTransactions,
    txn: TxnId,
) -> Result<&'a mut TransactionContext> {
    match active.get_mut(&txn) {
        Some(context) => Ok(context),
        None => Err(match finished.get(&txn) {
            Some(status) => StoreError::TransactionNotActive {
                txn,
                state: status.to_string(),
            },
            None => StoreError::TransactionNotFound(txn),
        }),
    }
}

impl StoreInner {
    fn transaction_mut(&mut self, txn: TxnId) -> Result<&mut TransactionContext> {
        active_mut(&mut self.active, &self.finished, txn)
    }

    /// Move `txn` out of the active set once it has reached a terminal state
    fn retire(&mut self, txn: TxnId) {
        if self.active.get(&txn).is_some_and(|context| !context.is_active()) {
            if let Some(context) = self.active.remove(&txn) {
                self.finished.record(txn, context.status);
            }
        }
    }

    /// Oldest snapshot any active transaction can still read
    fn low_watermark(&self) -> u64 {
        self.active
            .values()
            .map(|txn| txn.start_version)
            .min()
            .unwrap_or_else(|| self.manager.current_version())
    }

    fn vacuum(&mut self) -> VacuumStats {
        let stats = self.storage.vacuum(self.low_watermark());
        self.finished.clear();
        self.commits_since_vacuum = 0;
        stats
    }
}

/// In-memory MVCC key-value store with snapshot isolation
///
/// Share it between threads with `Arc<TransactionalStore>`.
pub struct TransactionalStore {
    inner: Mutex<StoreInner>,
    config: StoreConfig,
    metrics: MetricsRecorder,
}

impl TransactionalStore {
    /// Create a store with the default configuration
    pub fn new() -> Self {
        Self::build(StoreConfig::default())
    }

    /// Create a store with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        TransactionalStore {
            inner: Mutex::new(StoreInner {
                manager: TransactionManager::default(),
                storage: VersionedStore::new(),
                active: FxHashMap::default(),
                finished: FinishedTransactions::with_capacity(FINISHED_STATUS_CAPACITY),
                commits_since_vacuum: 0,
            }),
            config,
            metrics: MetricsRecorder::default(),
        }
    }

    /// Configuration this store was built with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Transaction lifecycle
    // ========================================================================

    /// Start a new transaction
    ///
    /// The transaction snapshots the highest committed version at this
    /// instant and never sees anything committed later.
    pub fn begin(&self) -> TxnId {
        let mut inner = self.inner.lock();
        let txn_id = inner.manager.next_txn_id();
        let start_version = inner.manager.current_version();
        inner
            .active
            .insert(txn_id, TransactionContext::new(txn_id, start_version));
        drop(inner);

        self.metrics.record_start();
        debug!(target: "snapkv::txn", txn = %txn_id, start_version, "Transaction started");
        txn_id
    }

    /// Read `key` as seen by transaction `txn`
    ///
    /// Returns the transaction's own pending write if there is one,
    /// otherwise the newest value committed at or before its snapshot.
    /// Returns `None` for unknown or finished transactions.
    pub fn read(&self, txn: TxnId, key: impl Into<Key>) -> Option<Value> {
        self.try_read(txn, key).ok().flatten()
    }

    /// Checked form of [`read`](Self::read)
    pub fn try_read(&self, txn: TxnId, key: impl Into<Key>) -> Result<Option<Value>> {
        let key = key.into();
        let mut guard = self.inner.lock();
        let StoreInner {
            active,
            finished,
            storage,
            ..
        } = &mut *guard;
        active_mut(active, finished, txn)?.get(&key, storage)
    }

    /// Stage a write; no-op for unknown or finished transactions
    pub fn write(&self, txn: TxnId, key: impl Into<Key>, value: impl Into<Value>) {
        if let Err(e) = self.try_write(txn, key, value) {
            debug!(target: "snapkv::txn", txn = %txn, error = %e, "Write ignored");
        }
    }

    /// Checked form of [`write`](Self::write)
    pub fn try_write(&self, txn: TxnId, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        self.inner.lock().transaction_mut(txn)?.put(key, value)
    }

    /// Stage a delete; no-op for unknown or finished transactions
    pub fn delete(&self, txn: TxnId, key: impl Into<Key>) {
        if let Err(e) = self.try_delete(txn, key) {
            debug!(target: "snapkv::txn", txn = %txn, error = %e, "Delete ignored");
        }
    }

    /// Checked form of [`delete`](Self::delete)
    pub fn try_delete(&self, txn: TxnId, key: impl Into<Key>) -> Result<()> {
        let key = key.into();
        self.inner.lock().transaction_mut(txn)?.delete(key)
    }

    /// Commit a transaction
    ///
    /// Returns `false` if the transaction is unknown, already finished, or
    /// lost a write-write conflict (in which case it is now aborted).
    pub fn commit(&self, txn: TxnId) -> bool {
        self.try_commit(txn).is_ok()
    }

    /// Checked form of [`commit`](Self::commit); returns the commit version
    pub fn try_commit(&self, txn: TxnId) -> Result<u64> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let context = active_mut(&mut inner.active, &inner.finished, txn)?;

        let outcome = inner.manager.commit(context, &mut inner.storage);
        inner.retire(txn);
        match outcome {
            Ok(applied) => {
                self.metrics.record_commit();
                debug!(
                    target: "snapkv::txn",
                    txn = %txn,
                    commit_version = applied.commit_version,
                    puts = applied.puts_applied,
                    deletes = applied.deletes_applied,
                    "Transaction committed"
                );
                self.maybe_auto_vacuum(inner);
                Ok(applied.commit_version)
            }
            Err(e) => {
                let err = e.into_store_error(txn);
                if let StoreError::WriteConflict { keys, .. } = &err {
                    self.metrics.record_conflict();
                    warn!(
                        target: "snapkv::txn",
                        txn = %txn,
                        conflicts = keys.len(),
                        "Transaction aborted on write-write conflict"
                    );
                }
                Err(err)
            }
        }
    }

    /// Abort a transaction, discarding its pending writes
    ///
    /// Returns `false` if the transaction is unknown or already finished.
    pub fn abort(&self, txn: TxnId) -> bool {
        self.try_abort(txn).is_ok()
    }

    /// Checked form of [`abort`](Self::abort)
    pub fn try_abort(&self, txn: TxnId) -> Result<()> {
        self.abort_with_reason(txn, "User requested")
    }

    fn abort_with_reason(&self, txn: TxnId, reason: &str) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let context = active_mut(&mut inner.active, &inner.finished, txn)?;
        let discarded = context.pending_operations().total();
        inner.manager.abort(context, reason)?;
        inner.retire(txn);
        drop(guard);

        self.metrics.record_abort();
        debug!(target: "snapkv::txn", txn = %txn, discarded, reason, "Transaction aborted");
        Ok(())
    }

    // ========================================================================
    // Closure transactions
    // ========================================================================

    /// Run `f` inside a new transaction
    ///
    /// Commits if `f` returns `Ok`, aborts if it returns `Err` or panics. A
    /// commit conflict is returned as `StoreError::WriteConflict`.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TxnHandle<'_>) -> Result<T>,
    {
        let mut handle = TxnHandle {
            store: self,
            id: self.begin(),
        };
        match f(&mut handle) {
            Ok(value) => {
                self.try_commit(handle.id)?;
                Ok(value)
            }
            Err(e) => {
                // The closure may have failed because the txn is already gone
                let _ = self.try_abort(handle.id);
                Err(e)
            }
        }
    }

    /// Run `f` in a transaction, retrying from a fresh snapshot on conflict
    ///
    /// Only `WriteConflict` is retried, with exponential backoff per
    /// `retry`. Any other error is returned immediately. Pass
    /// `store.config().retry.clone()` to use the configured defaults.
    pub fn transaction_with_retry<T, F>(&self, retry: &RetryConfig, mut f: F) -> Result<T>
    where
        F: FnMut(&mut TxnHandle<'_>) -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            match self.transaction(|txn| f(txn)) {
                Err(e) if e.is_conflict() && attempt < retry.max_retries => {
                    let delay = retry.calculate_delay(attempt);
                    debug!(
                        target: "snapkv::txn",
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying transaction after conflict"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Status of a transaction, or `None` if unknown
    ///
    /// A finished transaction's status stays visible until it falls out of
    /// the last [`FINISHED_STATUS_CAPACITY`] finished ones or a vacuum runs.
    pub fn status(&self, txn: TxnId) -> Option<TransactionStatus> {
        let inner = self.inner.lock();
        match inner.active.get(&txn) {
            Some(context) => Some(context.status.clone()),
            None => inner.finished.get(&txn).cloned(),
        }
    }

    /// Buffered operations of an active transaction
    pub fn pending_operations(&self, txn: TxnId) -> Option<PendingOperations> {
        self.inner
            .lock()
            .active
            .get(&txn)
            .map(TransactionContext::pending_operations)
    }

    /// Highest committed version (the watermark new transactions read at)
    pub fn current_version(&self) -> u64 {
        self.inner.lock().manager.current_version()
    }

    /// Every retained entry of `key`, newest first
    pub fn history(&self, key: impl Into<Key>) -> Vec<StoredValue> {
        let key = key.into();
        self.inner.lock().storage.history(&key)
    }

    /// Number of keys with at least one retained entry
    pub fn key_count(&self) -> usize {
        self.inner.lock().storage.key_count()
    }

    /// Number of transactions currently active
    pub fn active_transactions(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// Transaction counters
    pub fn metrics(&self) -> TransactionMetrics {
        self.metrics.snapshot()
    }

    // ========================================================================
    // Retention
    // ========================================================================

    /// Drop versions no active snapshot can observe
    ///
    /// Also forgets the statuses of finished transactions; their ids then
    /// read as unknown, which every operation already treats as failure.
    pub fn vacuum(&self) -> VacuumStats {
        self.inner.lock().vacuum()
    }

    fn maybe_auto_vacuum(&self, inner: &mut StoreInner) {
        if let RetentionPolicy::AutoVacuum { every_commits } = self.config.retention {
            inner.commits_since_vacuum += 1;
            if inner.commits_since_vacuum >= every_commits {
                inner.vacuum();
            }
        }
    }
}

impl Default for TransactionalStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle passed to closure transactions
///
/// Thin wrapper over the store's checked operations for one transaction id,
/// so closures can use `?`.
pub struct TxnHandle<'a> {
    store: &'a TransactionalStore,
    id: TxnId,
}

impl TxnHandle<'_> {
    /// Id of the underlying transaction
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Read with read-your-writes semantics
    pub fn get(&mut self, key: impl Into<Key>) -> Result<Option<Value>> {
        self.store.try_read(self.id, key)
    }

    /// Stage a write
    pub fn put(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        self.store.try_write(self.id, key, value)
    }

    /// Stage a delete
    pub fn delete(&mut self, key: impl Into<Key>) -> Result<()> {
        self.store.try_delete(self.id, key)
    }
}

impl Drop for TxnHandle<'_> {
    fn drop(&mut self) {
        // Unwinding out of the closure skips both commit and abort
        if thread::panicking() {
            let _ = self.store.abort_with_reason(self.id, "Closure panicked");
        }
    }
}

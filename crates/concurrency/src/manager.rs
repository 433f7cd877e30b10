//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. Validation (first-committer-wins)
//! 2. Version allocation
//! 3. Storage application (visibility)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. validate_write_set() - Check for write-write conflicts
//! 2. IF conflicts: mark_aborted() and return error
//! 3. allocate_version() - Increment global version
//! 4. apply_writes() - Append every write at the commit version
//! 5. publish() - Advance the snapshot watermark
//! 6. mark_committed() - Change state to Committed
//! ```
//!
//! The manager is not synchronized. It lives inside the store lock, which
//! makes the whole sequence atomic with respect to every other operation.

use crate::transaction::{ApplyResult, TransactionContext};
use crate::validation::{validate_write_set, ValidationResult};
use snapkv_core::{StoreError, TxnId};
use snapkv_storage::VersionedStore;
use thiserror::Error;

/// Error type for commit failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// Transaction aborted due to write-write conflicts
    #[error("Commit failed: {} conflict(s)", .0.conflict_count())]
    ValidationFailed(ValidationResult),

    /// Transaction was not in correct state for commit
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl CommitError {
    /// Convert into the public error type for transaction `txn`
    pub fn into_store_error(self, txn: TxnId) -> StoreError {
        match self {
            CommitError::ValidationFailed(result) => StoreError::WriteConflict {
                txn,
                keys: result.conflicting_keys(),
            },
            CommitError::InvalidState(state) => StoreError::TransactionNotActive { txn, state },
        }
    }
}

/// Owns the version counters and drives the commit protocol
///
/// `global_version` is incremented once per commit. All keys in a
/// transaction get the same commit version. `committed_version` is the
/// watermark new transactions snapshot from.
#[derive(Debug)]
pub struct TransactionManager {
    /// Global version counter
    ///
    /// Monotonically increasing. Each committed transaction increments by 1.
    global_version: u64,

    /// Highest committed version (snapshot watermark)
    committed_version: u64,

    /// Next transaction ID
    next_txn_id: u64,
}

impl TransactionManager {
    /// Create a new transaction manager starting at `initial_version`
    pub fn new(initial_version: u64) -> Self {
        TransactionManager {
            global_version: initial_version,
            committed_version: initial_version,
            next_txn_id: 1,
        }
    }

    /// Get the snapshot watermark
    pub fn current_version(&self) -> u64 {
        self.committed_version
    }

    /// Get the last allocated version
    pub fn global_version(&self) -> u64 {
        self.global_version
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&mut self) -> TxnId {
        let id = TxnId::from_raw(self.next_txn_id);
        self.next_txn_id += 1;
        id
    }

    /// Allocate next commit version (increment global version)
    pub fn allocate_version(&mut self) -> u64 {
        self.global_version += 1;
        self.global_version
    }

    /// Make `version` visible to transactions that begin from now on
    pub fn publish(&mut self, version: u64) {
        debug_assert!(version >= self.committed_version);
        self.committed_version = version;
    }

    /// Commit a transaction atomically
    ///
    /// # Returns
    /// - Ok(ApplyResult) on success, carrying the commit version
    /// - Err(CommitError) if the transaction is not active or validation
    ///   fails; on validation failure the transaction is left `Aborted`
    ///   and `store` is untouched
    pub fn commit(
        &mut self,
        txn: &mut TransactionContext,
        store: &mut VersionedStore,
    ) -> std::result::Result<ApplyResult, CommitError> {
        if !txn.is_active() {
            return Err(CommitError::InvalidState(txn.status.to_string()));
        }

        let validation = validate_write_set(txn, store);
        if !validation.is_valid() {
            txn.mark_aborted(format!(
                "Write-write conflict on {} key(s)",
                validation.conflict_count()
            ))
            .map_err(|e| CommitError::InvalidState(e.to_string()))?;
            return Err(CommitError::ValidationFailed(validation));
        }

        let commit_version = self.allocate_version();
        let applied = txn.apply_writes(store, commit_version);
        self.publish(commit_version);
        txn.mark_committed(commit_version)
            .map_err(|e| CommitError::InvalidState(e.to_string()))?;

        Ok(applied)
    }

    /// Explicitly abort a transaction
    ///
    /// All buffered operations are discarded. Storage is never touched.
    pub fn abort(&self, txn: &mut TransactionContext, reason: impl Into<String>) -> snapkv_core::Result<()> {
        txn.mark_aborted(reason)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}

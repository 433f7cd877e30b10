//! Error types for SnapKV
//!
//! This module defines all error types surfaced by the store.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::{Key, TxnId};
use thiserror::Error;

/// Result type alias for SnapKV operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for the transactional store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No transaction with this id is known to the store
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TxnId),

    /// The transaction exists but has already committed or aborted
    #[error("Transaction {txn} is not active (state: {state})")]
    TransactionNotActive {
        /// Transaction that was referenced
        txn: TxnId,
        /// Terminal state it is in
        state: String,
    },

    /// Commit lost a write-write race (first-committer-wins)
    #[error("Write-write conflict: {txn} aborted on {} key(s)", .keys.len())]
    WriteConflict {
        /// Transaction that was aborted
        txn: TxnId,
        /// Keys that moved past the transaction's snapshot
        keys: Vec<Key>,
    },

    /// Configuration could not be parsed or is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Caller-defined failure raised inside a closure transaction
    #[error("Transaction aborted: {0}")]
    Aborted(String),
}

impl StoreError {
    /// Create an aborted error with a caller-supplied reason
    pub fn aborted(reason: impl Into<String>) -> Self {
        StoreError::Aborted(reason.into())
    }

    /// Check if this error is a write-write conflict
    ///
    /// Conflicts are the only retryable failure: rerunning the transaction
    /// from a fresh snapshot may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::WriteConflict { .. })
    }
}

//! Concurrency layer for SnapKV
//!
//! This crate implements optimistic concurrency control (OCC) with:
//! - TransactionContext: read/write/delete set tracking
//! - Snapshot isolation
//! - Write-write conflict detection at commit time (first-committer-wins)
//! - TransactionalStore: the single-lock store tying it together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod manager;
pub mod metrics;
pub mod store;
pub mod transaction;
pub mod validation;

pub use config::{RetentionPolicy, RetryConfig, StoreConfig};
pub use manager::{CommitError, TransactionManager};
pub use metrics::TransactionMetrics;
pub use store::{TransactionalStore, TxnHandle, FINISHED_STATUS_CAPACITY};
pub use transaction::{ApplyResult, PendingOperations, TransactionContext, TransactionStatus};
pub use validation::{validate_write_set, ConflictType, ValidationResult};

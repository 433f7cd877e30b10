//! SnapKV - In-memory MVCC key-value store with snapshot isolation
//!
//! Each key maps to a chain of immutable versions. A transaction reads the
//! newest version at or below the watermark it captured at `begin`, buffers
//! its writes privately, and installs them atomically at commit under a
//! freshly allocated version. Two transactions that write the same key
//! concurrently cannot both commit: the first to commit wins.
//!
//! # Quick Start
//!
//! ```
//! use snapkv::{TransactionalStore, Value};
//!
//! let store = TransactionalStore::new();
//!
//! let t1 = store.begin();
//! store.write(t1, "user:123", "Alice");
//! assert!(store.commit(t1));
//!
//! let t2 = store.begin();
//! assert_eq!(store.read(t2, "user:123"), Some(Value::from("Alice")));
//! ```
//!
//! # Architecture
//!
//! - `snapkv-core`: keys, values, transaction ids, errors
//! - `snapkv-storage`: version chains and the unsynchronized versioned map
//! - `snapkv-concurrency`: transaction contexts, validation, the version
//!   manager and the thread-safe [`TransactionalStore`]

pub use snapkv_concurrency::{
    CommitError, ConflictType, PendingOperations, RetentionPolicy, RetryConfig, StoreConfig,
    TransactionMetrics, TransactionStatus, TransactionalStore, TxnHandle, ValidationResult,
    FINISHED_STATUS_CAPACITY,
};
pub use snapkv_core::{Key, Result, StoreError, TxnId, Value, VersionedValue};
pub use snapkv_storage::{StoredValue, VacuumStats};

//! Storage layer for SnapKV
//!
//! This crate implements the multi-version storage backend:
//! - StoredValue: chain entry, either a live value or a tombstone
//! - VersionChain: append-only, newest-first history of one key
//! - VersionedStore: FxHashMap of key to chain, with snapshot reads and vacuum
//!
//! Nothing here is synchronized. `snapkv-concurrency` owns a
//! `VersionedStore` behind its single store lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod stored_value;
pub mod versioned;

pub use chain::VersionChain;
pub use stored_value::StoredValue;
pub use versioned::{VacuumStats, VersionedStore};

//! Core types for SnapKV
//!
//! This crate defines the foundational types used throughout the system:
//! - Key: String key addressing one version chain
//! - TxnId: Opaque transaction identifier
//! - Value: Unified value enum for all stored data
//! - VersionedValue: Immutable `(version, value)` pair
//! - StoreError: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{Result, StoreError};
pub use types::{Key, TxnId};
pub use value::{Value, VersionedValue};

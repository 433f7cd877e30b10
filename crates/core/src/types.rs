//! Core identifier types for SnapKV
//!
//! This module defines:
//! - Key: Owned string key addressing one version chain
//! - TxnId: Opaque transaction identifier handed out by `begin`

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Key addressing one version chain in the store
///
/// Keys are plain UTF-8 strings. They order lexicographically and can be
/// looked up by `&str` through `Borrow<str>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    /// Create a new key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a transaction
///
/// Allocated from a monotonic counter owned by the store, so ids are never
/// reused within one store instance. Callers treat it as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Wrap a raw id
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

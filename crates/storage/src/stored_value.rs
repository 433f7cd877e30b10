//! Storage-layer chain entry with tombstone support
//!
//! The core `VersionedValue` always carries a value. Deletion is a storage
//! concern, so this module provides `StoredValue`, which is either a live
//! `VersionedValue` or a tombstone that only records the version at which
//! the key was deleted.

use serde::{Deserialize, Serialize};
use snapkv_core::{Value, VersionedValue};

/// One entry of a key's version chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredValue {
    /// Value installed by a committed write
    Live(VersionedValue),
    /// Deletion installed by a committed delete
    Tombstone {
        /// Commit version of the delete
        version: u64,
    },
}

impl StoredValue {
    /// Create a live entry
    pub fn live(version: u64, value: Value) -> Self {
        StoredValue::Live(VersionedValue::new(version, value))
    }

    /// Create a tombstone entry
    pub fn tombstone(version: u64) -> Self {
        StoredValue::Tombstone { version }
    }

    /// Commit version of this entry
    #[inline]
    pub fn version(&self) -> u64 {
        match self {
            StoredValue::Live(vv) => vv.version(),
            StoredValue::Tombstone { version } => *version,
        }
    }

    /// The value, or `None` for a tombstone
    #[inline]
    pub fn value(&self) -> Option<&Value> {
        match self {
            StoredValue::Live(vv) => Some(vv.value()),
            StoredValue::Tombstone { .. } => None,
        }
    }

    /// Check if this entry is a tombstone
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, StoredValue::Tombstone { .. })
    }

    /// Get the inner VersionedValue for live entries
    pub fn versioned(&self) -> Option<&VersionedValue> {
        match self {
            StoredValue::Live(vv) => Some(vv),
            StoredValue::Tombstone { .. } => None,
        }
    }
}

impl From<VersionedValue> for StoredValue {
    fn from(vv: VersionedValue) -> Self {
        StoredValue::Live(vv)
    }
}

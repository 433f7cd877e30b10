//! Transaction validation for OCC
//!
//! Key rules:
//! - First-committer-wins based on the WRITE-SET: a key this transaction
//!   writes or deletes must not have gained a version after its snapshot
//! - The read set is never consulted
//! - Write skew is ALLOWED (do not try to prevent it)

use crate::transaction::TransactionContext;
use snapkv_core::Key;
use snapkv_storage::VersionedStore;

/// Types of conflicts that can occur during transaction validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// Write-write conflict: another transaction committed this key after
    /// our snapshot was taken
    WriteWriteConflict {
        /// The key that has a conflict
        key: Key,
        /// Snapshot version of the validating transaction
        start_version: u64,
        /// Latest committed version of the key at validation time
        current_version: u64,
    },
}

impl ConflictType {
    /// Key the conflict was detected on
    pub fn key(&self) -> &Key {
        match self {
            ConflictType::WriteWriteConflict { key, .. } => key,
        }
    }
}

/// Result of transaction validation
///
/// Accumulates all conflicts found during validation.
/// A transaction commits only if is_valid() returns true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Conflicting keys in sorted order
    pub fn conflicting_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.conflicts.iter().map(|c| c.key().clone()).collect();
        keys.sort();
        keys
    }
}

/// Validate a transaction's writes and deletes against current storage
///
/// For each key the transaction would modify, the latest committed version
/// must not exceed the transaction's `start_version`. Version chains are
/// ordered, so checking the newest entry covers the whole chain.
pub fn validate_write_set(txn: &TransactionContext, store: &VersionedStore) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for key in txn.written_keys() {
        if let Some(current_version) = store.latest_version(key) {
            if current_version > txn.start_version {
                result.conflicts.push(ConflictType::WriteWriteConflict {
                    key: key.clone(),
                    start_version: txn.start_version,
                    current_version,
                });
            }
        }
    }

    result
}

//! Multi-version key map
//!
//! `VersionedStore` maps every key to its `VersionChain`. It has no
//! synchronization of its own: the transactional layer owns it behind the
//! store lock, so every method here takes `&self` or `&mut self` directly.

use crate::chain::VersionChain;
use crate::stored_value::StoredValue;
use rustc_hash::FxHashMap;
use snapkv_core::Key;
use tracing::info;

/// Result of a vacuum pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VacuumStats {
    /// Low watermark the pass was run against
    pub low_watermark: u64,
    /// Number of chains inspected
    pub keys_scanned: usize,
    /// Number of entries dropped across all chains
    pub versions_removed: usize,
    /// Number of keys whose chain became empty and was dropped
    pub keys_removed: usize,
}

/// Key to version chain map for MVCC
#[derive(Debug, Default)]
pub struct VersionedStore {
    /// HashMap with FxHash for O(1) lookups, storing version chains
    data: FxHashMap<Key, VersionChain>,
}

impl VersionedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot read: newest entry of `key` at or before `max_version`
    pub fn get_at_version(&self, key: &Key, max_version: u64) -> Option<&StoredValue> {
        self.data
            .get(key)
            .and_then(|chain| chain.get_at_version(max_version))
    }

    /// Latest entry of `key`, regardless of snapshot
    pub fn latest(&self, key: &Key) -> Option<&StoredValue> {
        self.data.get(key).and_then(VersionChain::latest)
    }

    /// Version of the latest entry of `key` (None if the key has no chain)
    pub fn latest_version(&self, key: &Key) -> Option<u64> {
        self.data.get(key).and_then(VersionChain::latest_version)
    }

    /// Append a committed entry to `key`'s chain, creating it if needed
    pub fn append(&mut self, key: Key, value: StoredValue) {
        if let Some(chain) = self.data.get_mut(&key) {
            chain.push(value);
        } else {
            self.data.insert(key, VersionChain::new(value));
        }
    }

    /// Full history of `key`, newest first
    pub fn history(&self, key: &Key) -> Vec<StoredValue> {
        self.data
            .get(key)
            .map(|chain| chain.history().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of keys with a chain
    pub fn key_count(&self) -> usize {
        self.data.len()
    }

    /// Total number of entries across all chains
    pub fn total_versions(&self) -> usize {
        self.data.values().map(VersionChain::version_count).sum()
    }

    /// Check if the store holds no chains
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Vacuum every chain against `low_watermark`
    ///
    /// The caller must guarantee no live snapshot is older than
    /// `low_watermark`. Chains left empty are removed from the map.
    pub fn vacuum(&mut self, low_watermark: u64) -> VacuumStats {
        let mut stats = VacuumStats {
            low_watermark,
            keys_scanned: self.data.len(),
            ..VacuumStats::default()
        };

        self.data.retain(|_, chain| {
            stats.versions_removed += chain.vacuum(low_watermark);
            !chain.is_empty()
        });
        stats.keys_removed = stats.keys_scanned - self.data.len();

        info!(
            target: "snapkv::storage",
            low_watermark,
            keys_scanned = stats.keys_scanned,
            versions_removed = stats.versions_removed,
            keys_removed = stats.keys_removed,
            "Vacuum completed"
        );

        stats
    }
}

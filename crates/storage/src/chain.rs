//! Per-key version chains
//!
//! A `VersionChain` holds every committed entry of one key, newest first.
//! Versions are strictly decreasing from front to back. Entries are only
//! added at the front; the back is trimmed only by `vacuum`.

use crate::stored_value::StoredValue;
use std::collections::VecDeque;

/// Version chain for MVCC
#[derive(Debug, Clone)]
pub struct VersionChain {
    /// Versions stored newest-first for efficient snapshot reads
    /// VecDeque provides O(1) push_front for new versions
    versions: VecDeque<StoredValue>,
}

impl VersionChain {
    /// Create a new version chain with a single version
    pub fn new(value: StoredValue) -> Self {
        let mut versions = VecDeque::with_capacity(4);
        versions.push_front(value);
        Self { versions }
    }

    /// Add a new version (must be newer than existing versions)
    #[inline]
    pub fn push(&mut self, value: StoredValue) {
        debug_assert!(
            self.latest_version().map_or(true, |v| value.version() > v),
            "version chain must be strictly increasing"
        );
        self.versions.push_front(value);
    }

    /// Get the newest entry at or before `max_version`
    ///
    /// This is the snapshot read: anything committed after `max_version`
    /// is skipped.
    pub fn get_at_version(&self, max_version: u64) -> Option<&StoredValue> {
        self.versions
            .iter()
            .find(|sv| sv.version() <= max_version)
    }

    /// Get the latest entry
    #[inline]
    pub fn latest(&self) -> Option<&StoredValue> {
        self.versions.front()
    }

    /// Version of the latest entry
    #[inline]
    pub fn latest_version(&self) -> Option<u64> {
        self.versions.front().map(StoredValue::version)
    }

    /// Drop entries no snapshot at or above `low_watermark` can observe
    ///
    /// Keeps every entry newer than the watermark plus the newest entry at or
    /// below it. If that floor entry is a tombstone it is dropped too, since
    /// a missing entry and a tombstone read the same. Returns the number of
    /// entries removed.
    pub fn vacuum(&mut self, low_watermark: u64) -> usize {
        let before = self.versions.len();

        if let Some(floor) = self
            .versions
            .iter()
            .position(|sv| sv.version() <= low_watermark)
        {
            self.versions.truncate(floor + 1);
            if self.versions.back().map_or(false, StoredValue::is_tombstone) {
                self.versions.pop_back();
            }
        }

        before - self.versions.len()
    }

    /// Number of versions stored
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Get version history, newest first
    pub fn history(&self) -> impl Iterator<Item = &StoredValue> {
        self.versions.iter()
    }

    /// Check if the version chain is empty
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

//! Transaction metrics
//!
//! Counters are updated with Relaxed ordering. They are purely
//! observational and do not synchronize any other memory operations;
//! approximate counts are acceptable.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time transaction statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionMetrics {
    /// Transactions begun but not yet committed or aborted
    pub active_count: u64,
    /// Total transactions started
    pub total_started: u64,
    /// Total transactions committed
    pub total_committed: u64,
    /// Total transactions aborted (explicitly or by conflict)
    pub total_aborted: u64,
    /// Aborts caused by write-write conflicts
    pub total_conflicts: u64,
    /// committed / started
    pub commit_rate: f64,
}

#[derive(Debug, Default)]
pub(crate) struct MetricsRecorder {
    active_count: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_aborted: AtomicU64,
    total_conflicts: AtomicU64,
}

impl MetricsRecorder {
    pub(crate) fn record_start(&self) {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.finish();
        self.total_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abort(&self) {
        self.finish();
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.record_abort();
        self.total_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            total_conflicts: self.total_conflicts.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }

    fn finish(&self) {
        // Saturating decrement to prevent underflow
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
    }
}

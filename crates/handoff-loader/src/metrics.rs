//! Loader statistics.
//!
//! Every queue in the loader drops on overflow instead of blocking. These
//! counters make the drops visible without adding backpressure.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the loader and its callers.
///
/// All updates are relaxed atomic increments, safe from the audio thread.
#[derive(Debug, Default)]
pub struct LoaderMetrics {
    /// Requests accepted into the request queue
    submitted: AtomicU64,
    /// Requests rejected because the request queue was full
    rejected: AtomicU64,
    /// Requests discarded by the latest-only policy
    collapsed: AtomicU64,
    /// Objects constructed by the worker
    built: AtomicU64,
    /// Built objects that reported themselves invalid
    invalid: AtomicU64,
    /// Built objects dropped because the finished queue was full
    finished_dropped: AtomicU64,
    /// Objects accepted into the retire queue
    retired: AtomicU64,
    /// Retire attempts rejected because the retire queue was full
    retire_rejected: AtomicU64,
    /// Retired objects destroyed by the worker
    destroyed: AtomicU64,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_collapsed(&self, count: u64) {
        self.collapsed.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_built(&self, valid: bool) {
        self.built.fetch_add(1, Ordering::Relaxed);
        if !valid {
            self.invalid.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_finished_dropped(&self) {
        self.finished_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_retired(&self) {
        self.retired.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_retire_rejected(&self) {
        self.retire_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_destroyed(&self, count: u64) {
        self.destroyed.fetch_add(count, Ordering::Relaxed);
    }

    /// Take a snapshot of current metrics.
    pub fn snapshot(&self) -> LoaderMetricsSnapshot {
        LoaderMetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            collapsed: self.collapsed.load(Ordering::Relaxed),
            built: self.built.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            finished_dropped: self.finished_dropped.load(Ordering::Relaxed),
            retired: self.retired.load(Ordering::Relaxed),
            retire_rejected: self.retire_rejected.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        for counter in [
            &self.submitted,
            &self.rejected,
            &self.collapsed,
            &self.built,
            &self.invalid,
            &self.finished_dropped,
            &self.retired,
            &self.retire_rejected,
            &self.destroyed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Snapshot of loader metrics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderMetricsSnapshot {
    pub submitted: u64,
    pub rejected: u64,
    pub collapsed: u64,
    pub built: u64,
    pub invalid: u64,
    pub finished_dropped: u64,
    pub retired: u64,
    pub retire_rejected: u64,
    pub destroyed: u64,
}

impl LoaderMetricsSnapshot {
    /// Total values lost to full queues.
    pub fn dropped(&self) -> u64 {
        self.rejected + self.finished_dropped + self.retire_rejected
    }

    /// Retired objects not yet destroyed by the worker.
    pub fn pending_destruction(&self) -> u64 {
        self.retired.saturating_sub(self.destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = LoaderMetrics::new();

        metrics.record_submitted();
        metrics.record_submitted();
        metrics.record_rejected();
        metrics.record_collapsed(3);
        metrics.record_built(true);
        metrics.record_built(false);
        metrics.record_finished_dropped();
        metrics.record_retired();
        metrics.record_retired();
        metrics.record_retire_rejected();
        metrics.record_destroyed(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submitted, 2);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.collapsed, 3);
        assert_eq!(snapshot.built, 2);
        assert_eq!(snapshot.invalid, 1);
        assert_eq!(snapshot.finished_dropped, 1);
        assert_eq!(snapshot.retired, 2);
        assert_eq!(snapshot.retire_rejected, 1);
        assert_eq!(snapshot.destroyed, 1);
        assert_eq!(snapshot.dropped(), 3);
        assert_eq!(snapshot.pending_destruction(), 1);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = LoaderMetrics::new();
        metrics.record_submitted();
        metrics.record_destroyed(4);

        metrics.reset();

        assert_eq!(metrics.snapshot(), LoaderMetricsSnapshot::default());
    }
}

//! Run statistics with atomic counters.
//!
//! [`CycleSnapshot`] summarizes one walk-convert-write pass; [`RunStats`]
//! accumulates across cycles for a long-lived watcher, with relaxed atomics
//! because the numbers are informational.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Summary of one walk-convert-write cycle.
///
/// # Examples
///
/// ```
/// use dc_pipeline::CycleSnapshot;
///
/// let snapshot = CycleSnapshot {
///     discovered: 10,
///     converted: 8,
///     failed: 2,
/// };
/// assert!((snapshot.success_rate() - 80.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSnapshot {
    /// Files discovered by the walk.
    pub discovered: u64,
    /// Files converted and written successfully.
    pub converted: u64,
    /// Files that failed (conversion or output write).
    pub failed: u64,
}

impl CycleSnapshot {
    /// Returns the fraction of discovered files converted, as a percentage.
    ///
    /// Returns 100.0 for an empty cycle.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Statistics display only
    pub fn success_rate(&self) -> f64 {
        if self.discovered == 0 {
            return 100.0;
        }
        (self.converted as f64 / self.discovered as f64) * 100.0
    }
}

/// Atomic counters accumulated across watch cycles.
///
/// Uses relaxed ordering; the values are for display and reporting, not
/// for coordination.
///
/// # Examples
///
/// ```
/// use dc_pipeline::{CycleSnapshot, RunStats};
///
/// let stats = RunStats::new();
/// stats.record_cycle(&CycleSnapshot { discovered: 3, converted: 3, failed: 0 });
///
/// let snap = stats.snapshot();
/// assert_eq!(snap.cycles, 1);
/// assert_eq!(snap.converted, 3);
/// ```
#[derive(Debug, Default)]
pub struct RunStats {
    cycles: AtomicU64,
    discovered: AtomicU64,
    converted: AtomicU64,
    failed: AtomicU64,
}

impl RunStats {
    /// Creates new statistics with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one cycle's results into the running totals.
    pub fn record_cycle(&self, cycle: &CycleSnapshot) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.discovered.fetch_add(cycle.discovered, Ordering::Relaxed);
        self.converted.fetch_add(cycle.converted, Ordering::Relaxed);
        self.failed.fetch_add(cycle.failed, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            converted: self.converted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.cycles.store(0, Ordering::Relaxed);
        self.discovered.store(0, Ordering::Relaxed);
        self.converted.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`RunStats`].
///
/// Safe to store, serialize, and send between threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Completed watch cycles.
    pub cycles: u64,
    /// Total files discovered across all cycles.
    pub discovered: u64,
    /// Total successful conversions across all cycles.
    pub converted: u64,
    /// Total failures across all cycles.
    pub failed: u64,
}

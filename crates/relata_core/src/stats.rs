//! Transaction statistics.
//!
//! Counters for what a client transaction did during its lifetime.
//!
//! # Usage
//!
//! ```rust,ignore
//! let stats = tx.stats().snapshot();
//! println!("Loaded: {}", stats.objects_loaded);
//! println!("Commits: {}", stats.commits);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Client transaction statistics.
///
/// Counters are monotonically increasing.
#[derive(Debug, Default)]
pub struct TransactionStats {
    /// Objects loaded from the data source.
    objects_loaded: AtomicU64,
    /// Objects created with `new_object`.
    objects_created: AtomicU64,
    /// Virtual relation end-points loaded lazily.
    end_points_loaded: AtomicU64,
    /// Queries executed (typed and custom).
    queries: AtomicU64,
    /// Successful commits.
    commits: AtomicU64,
    /// Commits aborted by validation or persistence errors.
    failed_commits: AtomicU64,
    /// Rollbacks.
    rollbacks: AtomicU64,
}

impl TransactionStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_loaded(&self, count: usize) {
        self.objects_loaded
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_created(&self) {
        self.objects_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_end_point_loaded(&self) {
        self.end_points_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_commit(&self) {
        self.failed_commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollback(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of objects loaded from the data source.
    pub fn objects_loaded(&self) -> u64 {
        self.objects_loaded.load(Ordering::Relaxed)
    }

    /// Returns the number of objects created.
    pub fn objects_created(&self) -> u64 {
        self.objects_created.load(Ordering::Relaxed)
    }

    /// Returns the number of successful commits.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Returns the number of failed commits.
    pub fn failed_commits(&self) -> u64 {
        self.failed_commits.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            objects_loaded: self.objects_loaded(),
            objects_created: self.objects_created(),
            end_points_loaded: self.end_points_loaded.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            commits: self.commits(),
            failed_commits: self.failed_commits(),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of transaction statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Objects loaded from the data source.
    pub objects_loaded: u64,
    /// Objects created.
    pub objects_created: u64,
    /// Virtual end-points loaded.
    pub end_points_loaded: u64,
    /// Queries executed.
    pub queries: u64,
    /// Successful commits.
    pub commits: u64,
    /// Failed commits.
    pub failed_commits: u64,
    /// Rollbacks.
    pub rollbacks: u64,
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing roster activity.
#[derive(Default)]
pub struct RosterMetrics {
    students_created: AtomicU64,
    students_updated: AtomicU64,
    students_deleted: AtomicU64,
}

impl RosterMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created student document.
    pub fn record_created(&self) {
        self.students_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a write to an existing student document, field updates and
    /// class-list rewrites alike.
    pub fn record_updated(&self) {
        self.students_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a hard delete.
    pub fn record_deleted(&self) {
        self.students_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            students_created: self.students_created.load(Ordering::Relaxed),
            students_updated: self.students_updated.load(Ordering::Relaxed),
            students_deleted: self.students_deleted.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of roster counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Students created since startup.
    pub students_created: u64,
    /// Existing students written since startup.
    pub students_updated: u64,
    /// Students hard-deleted since startup.
    pub students_deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_kind_of_write() {
        let metrics = RosterMetrics::new();
        metrics.record_created();
        metrics.record_created();
        metrics.record_updated();
        metrics.record_deleted();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.students_created, 2);
        assert_eq!(snapshot.students_updated, 1);
        assert_eq!(snapshot.students_deleted, 1);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        let metrics = RosterMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.students_created, 0);
        assert_eq!(snapshot.students_updated, 0);
        assert_eq!(snapshot.students_deleted, 0);
    }
}

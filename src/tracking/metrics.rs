use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the location write path
#[derive(Clone, Default)]
pub struct TrackingMetrics {
    /// Updates whose spatial write committed
    accepted: Arc<AtomicU64>,

    /// Updates rejected by validation
    rejected: Arc<AtomicU64>,

    /// Spatial writes that failed (request answered with 500)
    spatial_failures: Arc<AtomicU64>,

    /// Freshness writes that failed after a committed spatial write
    freshness_failures: Arc<AtomicU64>,
}

impl TrackingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spatial_failure(&self) {
        self.spatial_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_freshness_failure(&self) {
        self.freshness_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            spatial_failures: self.spatial_failures.load(Ordering::Relaxed),
            freshness_failures: self.freshness_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of tracking counters at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub spatial_failures: u64,
    pub freshness_failures: u64,
}

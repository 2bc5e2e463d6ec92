mod metrics;

pub use metrics::{MetricsSnapshot, TrackingMetrics};

use crate::config::TrackingConfig;
use crate::report::PositionReport;
use crate::store::{PositionStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Result of writing one position report
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// Spatial entry committed (freshness may or may not have been written)
    Success,
    /// Spatial write failed; nothing was written for this report
    StoreFailure(StoreError),
}

impl TrackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TrackOutcome::Success)
    }
}

/// Orchestrates the write path for validated position reports.
///
/// Write order per report:
/// 1. Spatial index upsert. Failure ends the request; the freshness record
///    is not touched so it never outlives the position it describes.
/// 2. Freshness record with TTL, best-effort. Failure is logged and counted
///    but the outcome stays `Success`.
///
/// One attempt per write; retries belong to the store adapter.
#[derive(Clone)]
pub struct LocationTracker {
    store: Arc<dyn PositionStore>,
    freshness_ttl: Duration,
    freshness_key_prefix: String,
    metrics: TrackingMetrics,
}

impl LocationTracker {
    pub fn new(store: Arc<dyn PositionStore>, config: &TrackingConfig) -> Self {
        Self {
            store,
            freshness_ttl: config.freshness_ttl(),
            freshness_key_prefix: config.freshness_key_prefix.clone(),
            metrics: TrackingMetrics::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn PositionStore> {
        &self.store
    }

    pub fn metrics(&self) -> &TrackingMetrics {
        &self.metrics
    }

    pub fn freshness_ttl(&self) -> Duration {
        self.freshness_ttl
    }

    /// Key of the freshness record for `agent_id`
    pub fn freshness_key(&self, agent_id: &str) -> String {
        format!("{}:{}:last_seen", self.freshness_key_prefix, agent_id)
    }

    pub async fn track(&self, report: &PositionReport) -> TrackOutcome {
        let agent_id = report.agent_id();

        if let Err(e) = self
            .store
            .upsert_position(agent_id, report.longitude(), report.latitude())
            .await
        {
            error!(
                agent_id = %agent_id,
                backend = self.store.backend(),
                error = %e,
                "Spatial index update failed"
            );
            self.metrics.record_spatial_failure();
            return TrackOutcome::StoreFailure(e);
        }
        self.metrics.record_accepted();

        let key = self.freshness_key(agent_id);
        let last_seen = report.received_at().timestamp();
        match self
            .store
            .set_with_expiry(&key, last_seen, self.freshness_ttl)
            .await
        {
            Ok(()) => {
                debug!(
                    agent_id = %agent_id,
                    longitude = report.longitude(),
                    latitude = report.latitude(),
                    last_seen,
                    "Position recorded"
                );
            }
            Err(e) => {
                warn!(
                    agent_id = %agent_id,
                    key = %key,
                    backend = self.store.backend(),
                    error = %e,
                    "Freshness update failed; position kept"
                );
                self.metrics.record_freshness_failure();
            }
        }

        TrackOutcome::Success
    }
}

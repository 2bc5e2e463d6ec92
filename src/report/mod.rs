use chrono::{DateTime, Utc};
use serde::Deserialize;

mod validation;

pub use validation::{validate, ValidationError};

/// Raw location update as sent by a courier.
///
/// Every field is optional at decode time so that a missing field is
/// reported by name instead of as a generic decode failure.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LocationUpdate {
    pub courier_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A validated position report.
///
/// Only obtainable through [`validate`], so coordinates are always finite
/// and within WGS84 bounds and the agent id is non-empty.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionReport {
    agent_id: String,
    latitude: f64,
    longitude: f64,
    received_at: DateTime<Utc>,
}

impl PositionReport {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Server-side ingestion time (never supplied by the caller)
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl LocationUpdate {
    /// Validates the update, stamping it with `received_at`.
    pub fn validate(self, received_at: DateTime<Utc>) -> Result<PositionReport, ValidationError> {
        validation::validate(self, received_at)
    }
}

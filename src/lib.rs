// Location update validation
pub mod report;

// Write-path orchestration and counters
pub mod tracking;

// Position store boundary and adapters
pub mod store;

// HTTP API
pub mod api;

// Process configuration
pub mod config;

pub use report::{LocationUpdate, PositionReport, ValidationError};
pub use store::{PositionStore, StoreError};
pub use tracking::{LocationTracker, TrackOutcome};

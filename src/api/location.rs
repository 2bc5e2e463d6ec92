use crate::report::LocationUpdate;
use crate::tracking::{LocationTracker, TrackOutcome};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed message returned when the spatial write fails
pub const STORE_FAILURE_MESSAGE: &str = "Failed to update location";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub tracker: LocationTracker,
    /// Reported in the `server` field of success responses
    pub server_name: String,
    pub max_body_bytes: usize,
}

/// Success response for a location update
#[derive(Serialize)]
struct LocationResponse {
    status: &'static str,
    server: String,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create router with the location ingestion endpoint
pub fn create_location_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/location", post(update_location))
        .with_state(state)
}

/// POST /location - Record a courier's current position
async fn update_location(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LocationResponse>, AppError> {
    if body.len() > state.max_body_bytes {
        state.tracker.metrics().record_rejected();
        return Err(AppError::PayloadTooLarge);
    }

    let update: LocationUpdate = serde_json::from_slice(&body).map_err(|e| {
        state.tracker.metrics().record_rejected();
        warn!(error = %e, "Rejected malformed location update");
        AppError::Validation(e.to_string())
    })?;

    let report = update.validate(Utc::now()).map_err(|e| {
        state.tracker.metrics().record_rejected();
        warn!(error = %e, "Rejected invalid location update");
        AppError::Validation(e.to_string())
    })?;

    debug!(agent_id = %report.agent_id(), "Ingesting location update");

    match state.tracker.track(&report).await {
        TrackOutcome::Success => Ok(Json(LocationResponse {
            status: "success",
            server: state.server_name.clone(),
        })),
        TrackOutcome::StoreFailure(_) => Err(AppError::StoreFailure),
    }
}

/// Application error types
enum AppError {
    Validation(String),
    PayloadTooLarge,
    StoreFailure,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
            }
            AppError::StoreFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                STORE_FAILURE_MESSAGE.to_string(),
            ),
        };
        let body = Json(ErrorResponse {
            error: error_message,
        });
        (status, body).into_response()
    }
}

use super::location::AppState;
use crate::tracking::MetricsSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: StoreHealth,
    metrics: MetricsSnapshot,
}

#[derive(Serialize)]
struct StoreHealth {
    backend: &'static str,
    reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn create_health_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// GET /health - Store reachability and write-path counters
///
/// 200 when the store answers a ping, 503 otherwise. Read-only.
async fn health(State(state): State<Arc<AppState>>) -> Response {
    let store = state.tracker.store();
    let ping = store.ping().await;

    let (status_code, status) = if ping.is_ok() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status,
        store: StoreHealth {
            backend: store.backend(),
            reachable: ping.is_ok(),
            error: ping.err().map(|e| e.to_string()),
        },
        metrics: state.tracker.metrics().snapshot(),
    };
    (status_code, Json(body)).into_response()
}

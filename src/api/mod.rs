// HTTP surface: location ingestion and health

mod health;
mod location;

pub use health::create_health_router;
pub use location::{create_location_router, AppState, STORE_FAILURE_MESSAGE};

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Full application router (`POST /location`, `GET /health`) with request tracing
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .merge(create_location_router(Arc::clone(&state)))
        .merge(create_health_router(state))
        .layer(TraceLayer::new_for_http())
}

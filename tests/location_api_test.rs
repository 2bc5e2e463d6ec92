// Integration tests for POST /location
//
// The router is driven in-process with tower's oneshot. The in-memory store
// stands in for Redis so each test can read back the spatial index and the
// freshness records after the request.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use geotrack::api::{create_router, AppState, STORE_FAILURE_MESSAGE};
use geotrack::config::{StoreConfig, TrackingConfig};
use geotrack::store::{InMemoryPositionStore, RedisPositionStore};
use geotrack::tracking::LocationTracker;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn create_test_app(store: Arc<InMemoryPositionStore>) -> Router {
    create_test_app_with(store, TrackingConfig::default(), 64 * 1024)
}

fn create_test_app_with(
    store: Arc<InMemoryPositionStore>,
    tracking: TrackingConfig,
    max_body_bytes: usize,
) -> Router {
    let state = AppState {
        tracker: LocationTracker::new(store, &tracking),
        server_name: "geotrack-test".to_string(),
        max_body_bytes,
    };
    create_router(state)
}

async fn post_location(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/location")
                .header("Content-Type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

/// Valid update → 200, spatial entry and freshness record written
#[tokio::test]
async fn test_valid_update_returns_200_and_records_position() {
    let store = Arc::new(InMemoryPositionStore::new());
    let app = create_test_app(store.clone());

    let before = chrono::Utc::now().timestamp();
    let (status, json) = post_location(
        app,
        json!({"courier_id": "c1", "latitude": 37.7749, "longitude": -122.4194}).to_string(),
    )
    .await;
    let after = chrono::Utc::now().timestamp();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["server"], "geotrack-test");

    assert_eq!(store.position("c1"), Some((-122.4194, 37.7749)));

    let last_seen = store.get("courier:c1:last_seen").unwrap();
    assert!(last_seen >= before && last_seen <= after);
    let ttl = store.ttl("courier:c1:last_seen").unwrap();
    assert!(ttl > Duration::from_secs(55) && ttl <= Duration::from_secs(60));
}

/// Latitude out of range → 400, nothing written
#[tokio::test]
async fn test_latitude_out_of_range_returns_400() {
    let store = Arc::new(InMemoryPositionStore::new());
    let app = create_test_app(store.clone());

    let (status, json) = post_location(
        app,
        json!({"courier_id": "c1", "latitude": 200, "longitude": 0}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("latitude"), "unexpected error: {}", error);
    assert!(error.contains("out of range"), "unexpected error: {}", error);

    assert_eq!(store.position_count(), 0);
    assert_eq!(store.expiring_count(), 0);
}

/// Longitude out of range → 400, nothing written
#[tokio::test]
async fn test_longitude_out_of_range_returns_400() {
    let store = Arc::new(InMemoryPositionStore::new());
    let app = create_test_app(store.clone());

    let (status, json) = post_location(
        app,
        json!({"courier_id": "c1", "latitude": 0, "longitude": 180.5}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("longitude"));
    assert_eq!(store.position_count(), 0);
}

/// Each missing field → 400 naming the field, nothing written
#[tokio::test]
async fn test_missing_fields_return_400() {
    let cases = [
        (json!({"latitude": 1.0, "longitude": 1.0}), "courier_id"),
        (json!({"courier_id": "c1", "longitude": 1.0}), "latitude"),
        (json!({"courier_id": "c1", "latitude": 1.0}), "longitude"),
    ];

    for (body, field) in cases {
        let store = Arc::new(InMemoryPositionStore::new());
        let app = create_test_app(store.clone());

        let (status, json) = post_location(app, body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "field {}", field);
        assert_eq!(json["error"], format!("{} is required", field));
        assert_eq!(store.position_count(), 0);
        assert_eq!(store.expiring_count(), 0);
    }
}

/// Empty courier id → 400
#[tokio::test]
async fn test_empty_courier_id_returns_400() {
    let store = Arc::new(InMemoryPositionStore::new());
    let app = create_test_app(store.clone());

    let (status, _) = post_location(
        app,
        json!({"courier_id": "", "latitude": 1.0, "longitude": 1.0}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.position_count(), 0);
}

/// Malformed JSON and wrong types → 400
#[tokio::test]
async fn test_malformed_body_returns_400() {
    let store = Arc::new(InMemoryPositionStore::new());

    let (status, json) = post_location(create_test_app(store.clone()), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, _) = post_location(
        create_test_app(store.clone()),
        json!({"courier_id": "c1", "latitude": "north", "longitude": 0}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(store.position_count(), 0);
}

/// Body over the configured limit → 413
#[tokio::test]
async fn test_oversized_body_returns_413() {
    let store = Arc::new(InMemoryPositionStore::new());
    let app = create_test_app_with(store.clone(), TrackingConfig::default(), 16);

    let (status, json) = post_location(
        app,
        json!({"courier_id": "c1", "latitude": 1.0, "longitude": 1.0}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"], "payload too large");
    assert_eq!(store.position_count(), 0);
}

/// Same update twice leaves the same final state as once
#[tokio::test]
async fn test_repeated_update_is_idempotent() {
    let store = Arc::new(InMemoryPositionStore::new());
    let body = json!({"courier_id": "c1", "latitude": 10.5, "longitude": 20.25}).to_string();

    let (first, _) = post_location(create_test_app(store.clone()), body.clone()).await;
    let (second, _) = post_location(create_test_app(store.clone()), body).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(store.position_count(), 1);
    assert_eq!(store.position("c1"), Some((20.25, 10.5)));
}

/// Concurrent updates for distinct couriers do not interfere
#[tokio::test]
async fn test_concurrent_updates_for_distinct_couriers() {
    let store = Arc::new(InMemoryPositionStore::new());
    let app = create_test_app(store.clone());

    let requests = (0..20).map(|i| {
        let app = app.clone();
        let body = json!({
            "courier_id": format!("courier_{}", i),
            "latitude": i as f64,
            "longitude": -(i as f64) * 2.0,
        })
        .to_string();
        async move { post_location(app, body).await.0 }
    });
    let statuses = futures::future::join_all(requests).await;

    assert!(statuses.iter().all(|s| *s == StatusCode::OK));
    assert_eq!(store.position_count(), 20);
    for i in 0..20 {
        let id = format!("courier_{}", i);
        assert_eq!(store.position(&id), Some((-(i as f64) * 2.0, i as f64)));
    }
}

/// Spatial write failure → 500 with the fixed message, no freshness record
#[tokio::test]
async fn test_spatial_failure_returns_500() {
    let store = Arc::new(InMemoryPositionStore::new());
    store.set_spatial_failure(true);
    let app = create_test_app(store.clone());

    let (status, json) = post_location(
        app,
        json!({"courier_id": "c1", "latitude": 1.0, "longitude": 1.0}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], STORE_FAILURE_MESSAGE);
    assert_eq!(store.get("courier:c1:last_seen"), None);
}

/// Freshness write failure is swallowed → still 200
#[tokio::test]
async fn test_freshness_failure_still_returns_200() {
    let store = Arc::new(InMemoryPositionStore::new());
    store.set_expiring_failure(true);
    let app = create_test_app(store.clone());

    let (status, json) = post_location(
        app,
        json!({"courier_id": "c1", "latitude": 1.0, "longitude": 2.0}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(store.position("c1"), Some((2.0, 1.0)));
    assert_eq!(store.get("courier:c1:last_seen"), None);
}

/// Freshness record disappears once the TTL elapses without further updates
#[tokio::test]
async fn test_freshness_record_expires() {
    let store = Arc::new(InMemoryPositionStore::new());
    let tracking = TrackingConfig {
        freshness_ttl_seconds: 1,
        ..TrackingConfig::default()
    };
    let app = create_test_app_with(store.clone(), tracking, 64 * 1024);

    let (status, _) = post_location(
        app,
        json!({"courier_id": "c1", "latitude": 1.0, "longitude": 1.0}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.get("courier:c1:last_seen").is_some());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(store.get("courier:c1:last_seen"), None);
}

/// Redis unreachable: requests fail with 500 instead of hanging or panicking
#[tokio::test]
async fn test_unreachable_redis_returns_500() {
    // Nothing listens on port 1
    let config = StoreConfig {
        addr: "127.0.0.1:1".to_string(),
        timeout_ms: 300,
        ..StoreConfig::default()
    };
    let store = Arc::new(RedisPositionStore::new(&config).unwrap());
    let state = AppState {
        tracker: LocationTracker::new(store, &TrackingConfig::default()),
        server_name: "geotrack-test".to_string(),
        max_body_bytes: 64 * 1024,
    };
    let app = create_router(state);

    let (status, json) = post_location(
        app,
        json!({"courier_id": "c1", "latitude": 1.0, "longitude": 1.0}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to update location");
}

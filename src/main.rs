use anyhow::{Context, Result};
use geotrack::api::{create_router, AppState};
use geotrack::config::{self, StoreBackend};
use geotrack::store::{InMemoryPositionStore, PositionStore, RedisPositionStore};
use geotrack::tracking::LocationTracker;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geotrack=info,tower_http=info".into()),
        )
        .init();

    info!("geotrack starting...");

    let config = config::from_env().context("Failed to load configuration")?;

    info!(
        backend = ?config.store.backend,
        store_addr = %config.store.addr,
        store_db = config.store.db,
        store_timeout_ms = config.store.timeout_ms,
        geo_key = %config.store.geo_key,
        freshness_ttl_seconds = config.tracking.freshness_ttl_seconds,
        port = config.server.port,
        "Configuration loaded"
    );

    let store: Arc<dyn PositionStore> = match config.store.backend {
        StoreBackend::Redis => Arc::new(
            RedisPositionStore::new(&config.store)
                .context("Failed to initialize Redis position store")?,
        ),
        StoreBackend::Memory => {
            warn!("Using in-memory position store; positions are lost on restart");
            Arc::new(InMemoryPositionStore::new())
        }
    };

    // Unreachable store is not fatal: requests report store failures until it recovers
    match store.ping().await {
        Ok(()) => info!(backend = store.backend(), addr = %config.store.addr, "Connected to position store"),
        Err(e) => warn!(
            backend = store.backend(),
            addr = %config.store.addr,
            error = %e,
            "Failed to connect to position store; starting degraded"
        ),
    }

    let tracker = LocationTracker::new(Arc::clone(&store), &config.tracking);
    let state = AppState {
        tracker,
        server_name: config.server.server_name.clone(),
        max_body_bytes: config.server.max_body_bytes,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.server.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.server.port))?;
    info!(port = config.server.port, "geotrack listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    // Last handle to the store; dropping it closes the underlying connection
    drop(store);
    info!("geotrack stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl_c signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

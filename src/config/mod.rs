mod env;
pub use env::apply_env_overrides;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Upper bound for the freshness window (one day)
pub const MAX_FRESHNESS_TTL_SECONDS: u64 = 86_400;

/// Complete geotrack configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeotrackConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Identifier reported in the `server` field of success responses
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_server_name() -> String {
    "geotrack".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            server_name: default_server_name(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Which position store implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Position store connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// host:port of the Redis server
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub db: i64,
    /// Upper bound for every store round trip, connection setup included
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Name of the geo collection holding courier positions
    #[serde(default = "default_geo_key")]
    pub geo_key: String,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Redis
}

fn default_addr() -> String {
    "localhost:6379".to_string()
}

fn default_timeout_ms() -> u64 {
    500
}

fn default_geo_key() -> String {
    "courier_locations".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            addr: default_addr(),
            password: None,
            db: 0,
            timeout_ms: default_timeout_ms(),
            geo_key: default_geo_key(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Freshness record configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_freshness_ttl")]
    pub freshness_ttl_seconds: u64,
    #[serde(default = "default_freshness_key_prefix")]
    pub freshness_key_prefix: String,
}

fn default_freshness_ttl() -> u64 {
    60
}

fn default_freshness_key_prefix() -> String {
    "courier".to_string()
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            freshness_ttl_seconds: default_freshness_ttl(),
            freshness_key_prefix: default_freshness_key_prefix(),
        }
    }
}

impl TrackingConfig {
    pub fn freshness_ttl(&self) -> Duration {
        Duration::from_secs(self.freshness_ttl_seconds)
    }

    /// Reset a freshness TTL outside `1..=MAX_FRESHNESS_TTL_SECONDS` to the default.
    pub fn enforce_ttl_bounds(&mut self) {
        let ttl = self.freshness_ttl_seconds;
        if ttl == 0 || ttl > MAX_FRESHNESS_TTL_SECONDS {
            warn!(
                freshness_ttl_seconds = ttl,
                max = MAX_FRESHNESS_TTL_SECONDS,
                "Freshness TTL out of range; using default"
            );
            self.freshness_ttl_seconds = default_freshness_ttl();
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<GeotrackConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: GeotrackConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}

/// Build the process configuration: defaults, then the optional TOML file
/// named by `GEOTRACK_CONFIG`, then environment overrides.
pub fn from_env() -> Result<GeotrackConfig> {
    let mut config = match std::env::var("GEOTRACK_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => GeotrackConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config.tracking.enforce_ttl_bounds();
    Ok(config)
}

use super::GeotrackConfig;
use std::str::FromStr;
use tracing::warn;

/// Apply environment overrides on top of `config`.
///
/// `lookup` resolves a variable name to its value (normally `std::env::var`).
/// Values that fail to parse are logged and ignored; the existing value stands.
pub fn apply_env_overrides<F>(config: &mut GeotrackConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("REDIS_ADDR") {
        if !v.is_empty() {
            config.store.addr = v;
        }
    }
    if let Some(v) = lookup("REDIS_PASSWORD") {
        config.store.password = if v.is_empty() { None } else { Some(v) };
    }
    override_parsed(&lookup, "REDIS_DB", &mut config.store.db);
    override_parsed(&lookup, "GEOTRACK_STORE_BACKEND", &mut config.store.backend);
    override_parsed(&lookup, "GEOTRACK_STORE_TIMEOUT_MS", &mut config.store.timeout_ms);
    if let Some(v) = lookup("GEOTRACK_GEO_KEY") {
        config.store.geo_key = v;
    }

    override_parsed(&lookup, "GEOTRACK_PORT", &mut config.server.port);
    if let Some(v) = lookup("GEOTRACK_SERVER_NAME") {
        config.server.server_name = v;
    }
    override_parsed(&lookup, "GEOTRACK_MAX_BODY_BYTES", &mut config.server.max_body_bytes);

    override_parsed(
        &lookup,
        "GEOTRACK_FRESHNESS_TTL_SECONDS",
        &mut config.tracking.freshness_ttl_seconds,
    );
    if let Some(v) = lookup("GEOTRACK_FRESHNESS_KEY_PREFIX") {
        config.tracking.freshness_key_prefix = v;
    }
}

fn override_parsed<F, T>(lookup: &F, name: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(v) = lookup(name) {
        match v.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(variable = name, value = %v, "Ignoring unparseable environment override"),
        }
    }
}

//! Position store boundary.
//!
//! The tracking service talks to persistence only through [`PositionStore`]:
//! a spatial index (upsert by agent id) and an expiring key store.

mod memory;
mod redis;

pub use self::memory::InMemoryPositionStore;
pub use self::redis::RedisPositionStore;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Errors surfaced by a position store adapter
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No connection to the store could be established
    Unavailable(String),
    /// The store rejected the command or the connection failed mid-command
    Command(String),
    /// The round trip did not complete within the configured deadline
    Timeout(Duration),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Command(msg) => write!(f, "store command failed: {}", msg),
            StoreError::Timeout(d) => write!(f, "store call timed out after {}ms", d.as_millis()),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence contract consumed by the location tracking service.
///
/// Implementations must tolerate concurrent calls. Writes for different
/// agents never interfere; concurrent writes for the same agent resolve by
/// arrival order at the store (last writer wins).
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Insert or overwrite the spatial index entry for `agent_id`.
    async fn upsert_position(
        &self,
        agent_id: &str,
        longitude: f64,
        latitude: f64,
    ) -> Result<(), StoreError>;

    /// Set `key` to `value`, expiring after `ttl`. Overwrites unconditionally
    /// and resets any existing expiry.
    async fn set_with_expiry(&self, key: &str, value: i64, ttl: Duration)
        -> Result<(), StoreError>;

    /// Reachability probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

//! In-process position store.
//!
//! Backs local development runs (`GEOTRACK_STORE_BACKEND=memory`) and tests.
//! Expiry is enforced on read: an expired freshness record is evicted the
//! first time it is looked up. Failure switches let callers simulate an
//! unhealthy store per operation.

use super::{PositionStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

struct ExpiringValue {
    value: i64,
    expires_at: Instant,
}

pub struct InMemoryPositionStore {
    /// agent_id -> (longitude, latitude)
    positions: DashMap<String, (f64, f64)>,
    expiring: DashMap<String, ExpiringValue>,
    fail_spatial: AtomicBool,
    fail_expiring: AtomicBool,
    unreachable: AtomicBool,
}

impl InMemoryPositionStore {
    pub fn new() -> Self {
        Self {
            positions: DashMap::new(),
            expiring: DashMap::new(),
            fail_spatial: AtomicBool::new(false),
            fail_expiring: AtomicBool::new(false),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Current `(longitude, latitude)` for `agent_id`, if any
    pub fn position(&self, agent_id: &str) -> Option<(f64, f64)> {
        self.positions.get(agent_id).map(|entry| *entry)
    }

    /// Value of an expiring key, or None if absent or expired
    pub fn get(&self, key: &str) -> Option<i64> {
        let now = Instant::now();
        let expired = match self.expiring.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.expiring.remove_if(key, |_, v| v.expires_at <= now);
        }
        None
    }

    /// Remaining time to live of an expiring key
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.expiring
            .get(key)
            .and_then(|entry| entry.expires_at.checked_duration_since(Instant::now()))
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn expiring_count(&self) -> usize {
        let now = Instant::now();
        self.expiring.iter().filter(|e| e.expires_at > now).count()
    }

    /// Make every spatial upsert fail until reset
    pub fn set_spatial_failure(&self, fail: bool) {
        self.fail_spatial.store(fail, Ordering::SeqCst);
    }

    /// Make every expiring-key write fail until reset
    pub fn set_expiring_failure(&self, fail: bool) {
        self.fail_expiring.store(fail, Ordering::SeqCst);
    }

    /// Make every operation, ping included, fail as if the store were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store marked unreachable".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryPositionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PositionStore for InMemoryPositionStore {
    async fn upsert_position(
        &self,
        agent_id: &str,
        longitude: f64,
        latitude: f64,
    ) -> Result<(), StoreError> {
        self.check_reachable()?;
        if self.fail_spatial.load(Ordering::SeqCst) {
            return Err(StoreError::Command("injected spatial write failure".to_string()));
        }
        self.positions
            .insert(agent_id.to_string(), (longitude, latitude));
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        self.check_reachable()?;
        if self.fail_expiring.load(Ordering::SeqCst) {
            return Err(StoreError::Command("injected expiring write failure".to_string()));
        }
        let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| {
            StoreError::Command(format!("ttl of {}s is not representable", ttl.as_secs()))
        })?;
        self.expiring
            .insert(key.to_string(), ExpiringValue { value, expires_at });
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

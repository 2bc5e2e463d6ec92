use super::{PositionStore, StoreError};
use crate::config::StoreConfig;
use ::redis::aio::{ConnectionManager, ConnectionManagerConfig};
use ::redis::{Client, Cmd, FromRedisValue, RedisError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Redis-backed position store.
///
/// Positions live in a single geo set (`GEOADD <geo_key> lon lat agent_id`);
/// freshness records are plain string keys written with a millisecond TTL.
///
/// The connection is opened lazily on first use and shared by all callers.
/// A store that is down at startup therefore does not prevent the process
/// from booting; each call fails with [`StoreError`] until Redis is
/// reachable. Connection attempts are never retried in-process: a refused
/// connect surfaces as `Unavailable` on the request that triggered it, and
/// the next request tries again.
pub struct RedisPositionStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    addr: String,
    geo_key: String,
    timeout: Duration,
}

impl RedisPositionStore {
    /// Build the adapter from configuration. Does not touch the network.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = connection_url(config);
        let client = Client::open(url.as_str())
            .map_err(|e| StoreError::Unavailable(format!("invalid redis address: {}", e)))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            addr: config.addr.clone(),
            geo_key: config.geo_key.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        self.connection
            .get_or_try_init(|| async {
                debug!(addr = %self.addr, "Opening Redis connection");
                let config = ConnectionManagerConfig::new().set_number_of_retries(0);
                let manager = ConnectionManager::new_with_config(self.client.clone(), config)
                    .await
                    .map_err(classify)?;
                info!(addr = %self.addr, "Redis connection established");
                Ok::<_, StoreError>(manager)
            })
            .await
            .cloned()
    }

    /// Run one command, bounded by the configured timeout (connect included).
    async fn run<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, StoreError> {
        let call = async {
            let mut conn = self.connection().await?;
            let value: T = cmd.query_async(&mut conn).await.map_err(classify)?;
            Ok::<T, StoreError>(value)
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl PositionStore for RedisPositionStore {
    async fn upsert_position(
        &self,
        agent_id: &str,
        longitude: f64,
        latitude: f64,
    ) -> Result<(), StoreError> {
        let cmd = geoadd_cmd(&self.geo_key, agent_id, longitude, latitude);
        // Reply is the number of newly added members; 0 on overwrite
        let _added: i64 = self.run(&cmd).await?;
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        let cmd = set_px_cmd(key, value, ttl)?;
        let _: () = self.run(&cmd).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let _pong: String = self.run(&ping_cmd()).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// `GEOADD <geo_key> <lon> <lat> <agent_id>`
fn geoadd_cmd(geo_key: &str, agent_id: &str, longitude: f64, latitude: f64) -> Cmd {
    let mut cmd = ::redis::cmd("GEOADD");
    cmd.arg(geo_key).arg(longitude).arg(latitude).arg(agent_id);
    cmd
}

/// `SET <key> <value> PX <ttl_ms>`
fn set_px_cmd(key: &str, value: i64, ttl: Duration) -> Result<Cmd, StoreError> {
    let ttl_ms = u64::try_from(ttl.as_millis())
        .map_err(|_| StoreError::Command(format!("ttl of {}s is too large", ttl.as_secs())))?
        .max(1);
    let mut cmd = ::redis::cmd("SET");
    cmd.arg(key).arg(value).arg("PX").arg(ttl_ms);
    Ok(cmd)
}

fn ping_cmd() -> Cmd {
    ::redis::cmd("PING")
}

fn classify(e: RedisError) -> StoreError {
    if e.is_connection_refusal() || e.is_io_error() || e.is_connection_dropped() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Command(e.to_string())
    }
}

/// `redis://[:password@]host:port/db`
fn connection_url(config: &StoreConfig) -> String {
    match config.password.as_deref() {
        Some(password) if !password.is_empty() => format!(
            "redis://:{}@{}/{}",
            urlencoding::encode(password),
            config.addr,
            config.db
        ),
        _ => format!("redis://{}/{}", config.addr, config.db),
    }
}

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use redis::{aio::MultiplexedConnection, IntoConnectionInfo};
use tracing::{info, warn};

use crate::config::RedisConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Optional key-value cache. Holds `pool_size` multiplexed connections and
/// hands them out round-robin.
#[derive(Clone)]
pub struct Cache {
    conns: Arc<Vec<MultiplexedConnection>>,
    next: Arc<AtomicUsize>,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("connections", &self.conns.len())
            .finish()
    }
}

impl Cache {
    pub async fn connect(cfg: &RedisConfig) -> anyhow::Result<Self> {
        let mut info = (cfg.host.as_str(), cfg.port)
            .into_connection_info()
            .context("redis connection info")?;
        info.redis.db = cfg.db;
        info.redis.password = cfg.password.clone().filter(|p| !p.is_empty());

        let client = redis::Client::open(info).context("create redis client")?;

        let size = cfg.pool_size.max(1);
        let mut conns = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = tokio::time::timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection())
                .await
                .context("redis connect timed out")?
                .context("redis connect")?;
            conns.push(conn);
        }

        let cache = Self {
            conns: Arc::new(conns),
            next: Arc::new(AtomicUsize::new(0)),
        };
        cache.ping().await?;
        info!(host = %cfg.host, port = cfg.port, db = cfg.db, pool_size = size, "cache connected");
        Ok(cache)
    }

    /// Connects, or logs a warning and returns `None`. The cache is never
    /// required for the service to run.
    pub async fn connect_optional(cfg: &RedisConfig) -> Option<Self> {
        match Self::connect(cfg).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "cache unavailable; continuing without it");
                None
            }
        }
    }

    pub fn connection(&self) -> MultiplexedConnection {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.conns.len();
        self.conns[i].clone()
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.connection();
        let pong: String = tokio::time::timeout(
            CONNECT_TIMEOUT,
            redis::cmd("PING").query_async::<_, String>(&mut conn),
        )
        .await
        .context("redis ping timed out")?
        .context("redis ping")?;
        if pong != "PONG" {
            anyhow::bail!("unexpected PING reply: {pong}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_cache_is_not_fatal() {
        let cfg = RedisConfig {
            host: "127.0.0.1".into(),
            // nothing listens on the discard port in test environments
            port: 9,
            pool_size: 2,
            ..RedisConfig::default()
        };
        assert!(Cache::connect_optional(&cfg).await.is_none());
    }
}

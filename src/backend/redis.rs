//! Redis storage backend for server-side session carts.

use super::CartBackend;
use crate::error::{Error, Result};
use deadpool_redis::{redis::AsyncCommands, Config as PoolConfig, Pool, Runtime};
use std::time::Duration;

const DEFAULT_POOL_SIZE: usize = 8;

/// Where the carts live and how long an untouched one is kept.
#[derive(Clone, Debug, PartialEq)]
pub struct RedisConfig {
    /// `redis://[user:pass@]host:port/db`
    pub url: String,
    pub pool_size: usize,
    /// Abandoned carts expire this long after their last write.
    /// `None` keeps them forever.
    pub cart_ttl: Option<Duration>,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RedisConfig {
            url: url.into(),
            pool_size: DEFAULT_POOL_SIZE,
            cart_ttl: None,
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_cart_ttl(mut self, ttl: Duration) -> Self {
        self.cart_ttl = Some(ttl);
        self
    }

    /// Expiry in whole seconds. Redis rejects `EX 0`, so sub-second TTLs round up.
    fn ttl_seconds(&self) -> Option<u64> {
        self.cart_ttl.map(|ttl| ttl.as_secs().max(1))
    }
}

/// Pooled Redis backend. Every cart is one string value under its storage key.
///
/// # Example
///
/// ```no_run
/// # use cart_kit::backend::{RedisBackend, RedisConfig, CartBackend};
/// # use std::time::Duration;
/// # async fn example() -> cart_kit::error::Result<()> {
/// let config = RedisConfig::new("redis://localhost:6379/0")
///     .with_cart_ttl(Duration::from_secs(7 * 24 * 3600));
/// let backend = RedisBackend::new(config).await?;
///
/// backend.set("cart:42", b"[]".to_vec()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
    ttl_seconds: Option<u64>,
}

impl RedisBackend {
    /// # Errors
    /// Returns `Error::BackendError` if the URL cannot back a pool.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = PoolConfig::from_url(config.url.as_str());
        cfg.pool = Some(deadpool_redis::PoolConfig::new(config.pool_size));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::BackendError(format!("Failed to create Redis pool: {}", e)))?;

        info!(
            "✓ Redis cart backend ready (pool size: {}, ttl: {:?})",
            config.pool_size, config.cart_ttl
        );

        Ok(RedisBackend {
            pool,
            ttl_seconds: config.ttl_seconds(),
        })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }
}

impl CartBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET {} failed: {}", key, e)))?;

        debug!(
            "✓ Redis GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.connection().await?;
        let size = value.len();

        let written = match self.ttl_seconds {
            Some(seconds) => conn.set_ex::<_, _, ()>(key, value, seconds).await,
            None => conn.set::<_, _, ()>(key, value).await,
        };
        written.map_err(|e| Error::BackendError(format!("Redis SET {} failed: {}", key, e)))?;

        debug!("✓ Redis SET {} ({} bytes, ttl {:?})", key, size, self.ttl_seconds);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL {} failed: {}", key, e)))?;

        debug!("✓ Redis DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        conn.exists(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis EXISTS {} failed: {}", key, e)))
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let pong: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong == "PONG")
    }
}

use std::sync::Arc;
use std::time::Duration;

use error_stack::{Report, ResultExt};
use fred::prelude::*;
use router_env::logger;

use crate::errors::{RedisError, RedisResult};

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub pool_size: usize,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            pool_size: 5,
        }
    }
}

/// Thin wrapper around a `fred` connection pool implementing §4.2's
/// semantic contract. Cloning is cheap (`RedisPool` is internally
/// `Arc`-backed); one instance is shared across the whole process.
#[derive(Clone)]
pub struct KvStore {
    pool: RedisPool,
}

impl KvStore {
    pub async fn connect(settings: &RedisSettings) -> RedisResult<Self> {
        let config = RedisConfig::from_url(&format!("redis://{}:{}", settings.host, settings.port))
            .change_context(RedisError::NotInitialized)?;
        let pool = Builder::from_config(config)
            .build_pool(settings.pool_size)
            .change_context(RedisError::NotInitialized)?;
        pool.init().await.change_context(RedisError::NotInitialized)?;
        logger::info!(host = %settings.host, port = settings.port, "connected to redis");
        Ok(Self { pool })
    }

    /// `Get(key) → (value, found)`.
    pub async fn get(&self, key: &str) -> RedisResult<Option<String>> {
        self.pool
            .get::<Option<String>, _>(key)
            .await
            .map_err(|e| Report::new(RedisError::Command(e.to_string())))
    }

    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> RedisResult<()> {
        let expiry = Expiration::EX(ttl.as_secs() as i64);
        self.pool
            .set::<(), _, _>(key, value, Some(expiry), None, false)
            .await
            .map_err(|e| Report::new(RedisError::Command(e.to_string())))
    }

    /// Single-write semantics for idempotency and token consumption:
    /// succeeds only if `key` did not already exist.
    pub async fn set_if_not_exists_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> RedisResult<bool> {
        let expiry = Expiration::EX(ttl.as_secs() as i64);
        let result: Option<String> = self
            .pool
            .set(key, value, Some(expiry), Some(SetOptions::NX), true)
            .await
            .map_err(|e| Report::new(RedisError::Command(e.to_string())))?;
        Ok(result.is_some())
    }

    /// `Increment(key, window) → count`: a fixed-window counter that
    /// stamps its own TTL on first increment (§4.2's "fixed-window atomic
    /// counter" option).
    pub async fn increment(&self, key: &str, window: Duration) -> RedisResult<i64> {
        let count: i64 = self
            .pool
            .incr(key)
            .await
            .map_err(|e| Report::new(RedisError::Command(e.to_string())))?;
        if count == 1 {
            let _: () = self
                .pool
                .expire(key, window.as_secs() as i64)
                .await
                .map_err(|e| Report::new(RedisError::Command(e.to_string())))?;
        }
        Ok(count)
    }

    pub async fn delete(&self, key: &str) -> RedisResult<()> {
        self.pool
            .del::<(), _>(key)
            .await
            .map_err(|e| Report::new(RedisError::Command(e.to_string())))
    }
}

/// A repository-backed fallback so rate-limiting and idempotency stay
/// correct, if slower, with no Redis configured (§4.2).
pub enum KvBackend {
    Redis(Arc<KvStore>),
    None,
}

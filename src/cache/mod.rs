//! Redis-backed token cache
//!
//! Only the provider token cache can live here; token mappings always stay in
//! SQLite because callbacks must find them after a Redis flush.

pub mod cache;
pub mod error;
pub mod keys;

pub use cache::{Cache, RedisCache, RedisTokenCache};
pub use error::CacheError;

use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use std::time::Duration;
use tracing::{info, warn};

pub type RedisPool = Pool<RedisConnectionManager>;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub redis_url: String,
    pub max_connections: u32,
    pub min_idle: u32,
    pub connection_timeout: Duration,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl CacheConfig {
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            ..Default::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 10,
            min_idle: 1,
            // A slow cache must not eat into the provider call budget
            connection_timeout: Duration::from_secs(2),
            max_lifetime: Duration::from_secs(300),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Build the pool. An unreachable server is only logged: lookups then miss
/// and every request logs in afresh.
pub async fn init_cache_pool(config: CacheConfig) -> Result<RedisPool, CacheError> {
    info!(
        "Initializing Redis token cache pool: max_connections={}, min_idle={}",
        config.max_connections, config.min_idle
    );

    let manager = RedisConnectionManager::new(config.redis_url.as_str())
        .map_err(|e| CacheError::ConnectionError(format!("invalid Redis URL: {}", e)))?;

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(config.min_idle)
        .connection_timeout(config.connection_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .test_on_check_out(false)
        .build_unchecked(manager);

    match ping(&pool).await {
        Ok(()) => info!("Redis token cache reachable"),
        Err(e) => warn!("Redis token cache unreachable, continuing without it: {}", e),
    }

    Ok(pool)
}

async fn ping(pool: &RedisPool) -> Result<(), CacheError> {
    let mut conn = pool.get().await?;
    let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
    Ok(())
}

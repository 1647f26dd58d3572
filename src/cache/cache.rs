//! Generic cache trait and Redis implementation
//!
//! Values are stored as JSON. A pool that cannot hand out a connection is
//! treated as a miss on read and a no-op on write, so a Redis outage only
//! costs a fresh provider login.

use super::error::{CacheError, CacheResult};
use super::keys::token_cache_key;
use super::RedisPool;
use crate::database::error::DbResult;
use crate::database::repository::TokenCacheStore;
use crate::database::token_cache_repository::TokenCacheEntry;
use async_trait::async_trait;
use bb8::PooledConnection;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

type RedisConnection<'a> = PooledConnection<'a, RedisConnectionManager>;

/// Generic cache trait supporting any serializable type
#[async_trait]
pub trait Cache<T: Serialize + DeserializeOwned + Send + Sync + 'static> {
    /// Get a value from cache by key
    async fn get(&self, key: &str) -> CacheResult<Option<T>>;

    /// Store a value without expiry
    async fn set(&self, key: &str, value: &T) -> CacheResult<()>;
}

/// Redis implementation of the Cache trait
#[derive(Clone)]
pub struct RedisCache {
    pool: RedisPool,
}

impl RedisCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn get_connection(&self) -> CacheResult<RedisConnection<'_>> {
        self.pool.get().await.map_err(|e| {
            warn!("Failed to get Redis connection: {}", e);
            CacheError::from(e)
        })
    }
}

#[async_trait]
impl<T: Serialize + DeserializeOwned + Send + Sync + 'static> Cache<T> for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        let mut conn = match self.get_connection().await {
            Ok(conn) => conn,
            Err(_) => return Ok(None),
        };

        let result: Option<String> = conn.get(key).await.map_err(|e| {
            warn!("Redis GET failed for key '{}': {}", key, e);
            e
        })?;

        match result {
            Some(json_str) => {
                let value: T = serde_json::from_str(&json_str).map_err(|e| {
                    warn!("Failed to deserialize cache value for key '{}': {}", key, e);
                    e
                })?;
                debug!("Cache hit for key: {}", key);
                Ok(Some(value))
            }
            None => {
                debug!("Cache miss for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &T) -> CacheResult<()> {
        let mut conn = match self.get_connection().await {
            Ok(conn) => conn,
            Err(_) => return Ok(()),
        };

        let json_str = serde_json::to_string(value).map_err(|e| {
            warn!("Failed to serialize value for key '{}': {}", key, e);
            e
        })?;

        let _: () = conn.set(key, json_str).await.map_err(|e| {
            warn!("Redis SET failed for key '{}': {}", key, e);
            e
        })?;

        debug!("Cache set for key: {}", key);
        Ok(())
    }
}

/// Provider token cache kept in Redis
pub struct RedisTokenCache {
    cache: RedisCache,
}

impl RedisTokenCache {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            cache: RedisCache::new(pool),
        }
    }
}

#[async_trait]
impl TokenCacheStore for RedisTokenCache {
    async fn get_token_cache(&self, credentials_hash: &str) -> DbResult<Option<TokenCacheEntry>> {
        let key = token_cache_key(credentials_hash);
        Ok(Cache::<TokenCacheEntry>::get(&self.cache, &key).await?)
    }

    async fn upsert_token_cache(&self, entry: &TokenCacheEntry) -> DbResult<()> {
        let key = token_cache_key(&entry.credentials_hash);
        Ok(Cache::<TokenCacheEntry>::set(&self.cache, &key, entry).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    // These tests require a running Redis instance
    // Run with: REDIS_URL=redis://localhost:6379 cargo test --features cache

    async fn setup() -> RedisTokenCache {
        let config = super::super::CacheConfig {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            ..Default::default()
        };
        let pool = super::super::init_cache_pool(config).await.unwrap();
        RedisTokenCache::new(pool)
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_token_cache_round_trip() {
        let store = setup().await;
        let entry = TokenCacheEntry {
            credentials_hash: format!("test-{}", Utc::now().timestamp_nanos_opt().unwrap_or(0)),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            access_refreshed_at: Utc::now(),
        };

        assert!(store
            .get_token_cache(&entry.credentials_hash)
            .await
            .unwrap()
            .is_none());

        store.upsert_token_cache(&entry).await.unwrap();
        let stored = store.get_token_cache(&entry.credentials_hash).await.unwrap();
        assert_eq!(stored, Some(entry));
    }
}

use crate::database::error::{DatabaseError, DbResult};
use crate::database::repository::TokenCacheStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use tracing::debug;

/// Cached provider tokens for one set of credentials
#[derive(Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCacheEntry {
    pub credentials_hash: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_refreshed_at: DateTime<Utc>,
}

impl fmt::Debug for TokenCacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCacheEntry")
            .field("credentials_hash", &self.credentials_hash)
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("access_refreshed_at", &self.access_refreshed_at)
            .finish()
    }
}

/// Token cache backed by the `token_cache` table
pub struct TokenCacheRepository {
    pool: SqlitePool,
}

impl TokenCacheRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenCacheStore for TokenCacheRepository {
    async fn get_token_cache(&self, credentials_hash: &str) -> DbResult<Option<TokenCacheEntry>> {
        sqlx::query_as::<_, TokenCacheEntry>(
            "SELECT credentials_hash, access_token, refresh_token, access_refreshed_at
             FROM token_cache WHERE credentials_hash = ?1",
        )
        .bind(credentials_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn upsert_token_cache(&self, entry: &TokenCacheEntry) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO token_cache (credentials_hash, access_token, refresh_token, access_refreshed_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (credentials_hash) DO UPDATE SET
                 access_token = excluded.access_token,
                 refresh_token = excluded.refresh_token,
                 access_refreshed_at = excluded.access_refreshed_at",
        )
        .bind(&entry.credentials_hash)
        .bind(&entry.access_token)
        .bind(&entry.refresh_token)
        .bind(entry.access_refreshed_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        debug!("Token cache upserted for {}", entry.credentials_hash);
        Ok(())
    }
}

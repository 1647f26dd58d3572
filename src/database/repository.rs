use crate::database::error::DbResult;
use crate::database::token_cache_repository::TokenCacheEntry;
use crate::database::token_mapping_repository::TokenMapping;
use async_trait::async_trait;

/// Storage for provider tokens keyed by credential hash
///
/// Writes are last-write-wins; concurrent refreshes at worst cost an extra
/// login.
#[async_trait]
pub trait TokenCacheStore: Send + Sync {
    /// Find the cached tokens for a credential hash
    async fn get_token_cache(&self, credentials_hash: &str) -> DbResult<Option<TokenCacheEntry>>;

    /// Insert or replace the entry for `entry.credentials_hash`
    async fn upsert_token_cache(&self, entry: &TokenCacheEntry) -> DbResult<()>;
}

/// Storage for gateway id to platform token mappings
#[async_trait]
pub trait TokenMappingStore: Send + Sync {
    /// Persist a new mapping. A second mapping for the same gateway id is a
    /// unique constraint violation.
    async fn create_mapping(&self, mapping: &TokenMapping) -> DbResult<()>;

    /// Find the mapping for a gateway id
    async fn get_mapping(&self, gateway_id: &str) -> DbResult<Option<TokenMapping>>;
}

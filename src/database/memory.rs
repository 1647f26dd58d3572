//! In-process store implementing both store traits.

use crate::database::error::{DatabaseError, DatabaseErrorKind, DbResult};
use crate::database::repository::{TokenCacheStore, TokenMappingStore};
use crate::database::token_cache_repository::TokenCacheEntry;
use crate::database::token_mapping_repository::TokenMapping;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    token_cache: RwLock<HashMap<String, TokenCacheEntry>>,
    mappings: RwLock<HashMap<String, TokenMapping>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mapping_count(&self) -> usize {
        self.mappings.read().await.len()
    }
}

#[async_trait]
impl TokenCacheStore for MemoryStore {
    async fn get_token_cache(&self, credentials_hash: &str) -> DbResult<Option<TokenCacheEntry>> {
        Ok(self.token_cache.read().await.get(credentials_hash).cloned())
    }

    async fn upsert_token_cache(&self, entry: &TokenCacheEntry) -> DbResult<()> {
        self.token_cache
            .write()
            .await
            .insert(entry.credentials_hash.clone(), entry.clone());
        Ok(())
    }
}

#[async_trait]
impl TokenMappingStore for MemoryStore {
    async fn create_mapping(&self, mapping: &TokenMapping) -> DbResult<()> {
        let mut mappings = self.mappings.write().await;
        if mappings.contains_key(&mapping.gateway_id) {
            return Err(DatabaseError::new(
                DatabaseErrorKind::UniqueConstraintViolation {
                    entity: "token_mapping".to_string(),
                    value: mapping.gateway_id.clone(),
                },
            ));
        }
        mappings.insert(mapping.gateway_id.clone(), mapping.clone());
        Ok(())
    }

    async fn get_mapping(&self, gateway_id: &str) -> DbResult<Option<TokenMapping>> {
        Ok(self.mappings.read().await.get(gateway_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_token_cache_upsert_replaces() {
        let store = MemoryStore::new();
        let mut entry = TokenCacheEntry {
            credentials_hash: "h".to_string(),
            access_token: "a1".to_string(),
            refresh_token: "r1".to_string(),
            access_refreshed_at: Utc::now(),
        };
        store.upsert_token_cache(&entry).await.unwrap();

        entry.access_token = "a2".to_string();
        store.upsert_token_cache(&entry).await.unwrap();

        let stored = store.get_token_cache("h").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "a2");
    }

    #[tokio::test]
    async fn test_mapping_is_created_once() {
        let store = MemoryStore::new();
        let mapping = TokenMapping {
            gateway_id: "gw".to_string(),
            token: "tok".to_string(),
            merchant_private_key: "k".to_string(),
        };
        store.create_mapping(&mapping).await.unwrap();
        let error = store.create_mapping(&mapping).await.unwrap_err();
        assert!(error.is_constraint_violation());
        assert_eq!(store.mapping_count().await, 1);
    }
}

use crate::database::error::{DatabaseError, DbResult};
use crate::database::repository::TokenMappingStore;
use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use tracing::debug;

/// Link between a provider gateway id and the platform transaction
#[derive(Clone, FromRow, PartialEq, Eq)]
pub struct TokenMapping {
    pub gateway_id: String,
    /// Platform transaction token
    pub token: String,
    /// Only used to sign callbacks
    pub merchant_private_key: String,
}

impl fmt::Debug for TokenMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMapping")
            .field("gateway_id", &self.gateway_id)
            .field("token", &self.token)
            .field("merchant_private_key", &"***")
            .finish()
    }
}

/// Mappings backed by the `token_mapping` table
pub struct TokenMappingRepository {
    pool: SqlitePool,
}

impl TokenMappingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenMappingStore for TokenMappingRepository {
    async fn create_mapping(&self, mapping: &TokenMapping) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO token_mapping (gateway_id, token, merchant_private_key)
             VALUES (?1, ?2, ?3)",
        )
        .bind(&mapping.gateway_id)
        .bind(&mapping.token)
        .bind(&mapping.merchant_private_key)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::from_sqlx(e).with_context(format!("gateway_id={}", mapping.gateway_id))
        })?;

        debug!(
            "Token mapping created: gateway_id={}, token={}",
            mapping.gateway_id, mapping.token
        );
        Ok(())
    }

    async fn get_mapping(&self, gateway_id: &str) -> DbResult<Option<TokenMapping>> {
        sqlx::query_as::<_, TokenMapping>(
            "SELECT gateway_id, token, merchant_private_key
             FROM token_mapping WHERE gateway_id = ?1",
        )
        .bind(gateway_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{init_pool, PoolConfig};

    fn mapping(gateway_id: &str, token: &str) -> TokenMapping {
        TokenMapping {
            gateway_id: gateway_id.to_string(),
            token: token.to_string(),
            merchant_private_key: "merchant-key".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_mapping() {
        let pool = init_pool(":memory:", Some(PoolConfig::in_memory())).await.unwrap();
        let repo = TokenMappingRepository::new(pool);

        repo.create_mapping(&mapping("gw_1", "tok_1")).await.unwrap();

        let stored = repo.get_mapping("gw_1").await.unwrap().unwrap();
        assert_eq!(stored, mapping("gw_1", "tok_1"));
        assert!(repo.get_mapping("gw_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_gateway_id_is_rejected() {
        let pool = init_pool(":memory:", Some(PoolConfig::in_memory())).await.unwrap();
        let repo = TokenMappingRepository::new(pool);

        repo.create_mapping(&mapping("gw_1", "tok_1")).await.unwrap();
        let error = repo.create_mapping(&mapping("gw_1", "tok_2")).await.unwrap_err();
        assert!(error.is_constraint_violation());

        let stored = repo.get_mapping("gw_1").await.unwrap().unwrap();
        assert_eq!(stored.token, "tok_1");
    }

    #[test]
    fn test_debug_hides_private_key() {
        assert!(!format!("{:?}", mapping("gw", "tok")).contains("merchant-key"));
    }
}

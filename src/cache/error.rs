use crate::database::error::{DatabaseError, DatabaseErrorKind};
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    #[error("Redis command failed: {0}")]
    CommandError(#[from] redis::RedisError),

    #[error("Cache value serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<bb8::RunError<redis::RedisError>> for CacheError {
    fn from(err: bb8::RunError<redis::RedisError>) -> Self {
        CacheError::ConnectionError(err.to_string())
    }
}

impl From<CacheError> for DatabaseError {
    fn from(err: CacheError) -> Self {
        let kind = match &err {
            CacheError::ConnectionError(message) => DatabaseErrorKind::ConnectionError {
                message: message.clone(),
            },
            CacheError::CommandError(e) => DatabaseErrorKind::QueryError {
                message: e.to_string(),
            },
            CacheError::SerializationError(e) => DatabaseErrorKind::SerializationError {
                message: e.to_string(),
            },
        };
        DatabaseError::new(kind).with_context("redis")
    }
}

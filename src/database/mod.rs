pub mod error;
pub mod memory;
pub mod repository;
pub mod token_cache_repository;
pub mod token_mapping_repository;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error as log_error, info};

use self::error::{DatabaseError, DatabaseErrorKind};

pub use memory::MemoryStore;
pub use repository::{TokenCacheStore, TokenMappingStore};
pub use token_cache_repository::{TokenCacheEntry, TokenCacheRepository};
pub use token_mapping_repository::{TokenMapping, TokenMappingRepository};

const SCHEMA: &str = include_str!("../../migrations/schema.sql");

/// Database pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl PoolConfig {
    /// A single long-lived connection, as an in-memory database only exists
    /// for as long as its connection does.
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            min_connections: 1,
            idle_timeout: None,
            max_lifetime: None,
            ..Default::default()
        }
    }
}

fn connect_options(database_path: &str) -> Result<SqliteConnectOptions, DatabaseError> {
    if database_path == ":memory:" {
        return SqliteConnectOptions::from_str("sqlite::memory:").map_err(DatabaseError::from_sqlx);
    }

    Ok(SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal))
}

/// Initialize the SQLite pool and apply the schema
pub async fn init_pool(
    database_path: &str,
    config: Option<PoolConfig>,
) -> Result<SqlitePool, DatabaseError> {
    let config = config.unwrap_or_default();

    info!(
        "Initializing database pool: path={}, max_connections={}, connection_timeout={:?}",
        database_path, config.max_connections, config.connection_timeout
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connection_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect_with(connect_options(database_path)?)
        .await
        .map_err(|e| {
            log_error!("Failed to initialize database pool: {}", e);
            DatabaseError::from_sqlx(e)
        })?;

    migrate(&pool).await?;

    info!("Database pool initialized successfully");
    Ok(pool)
}

/// Apply the schema. Every statement is idempotent.
pub async fn migrate(pool: &SqlitePool) -> Result<(), DatabaseError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await.map_err(|e| {
        log_error!("Failed to run init migration: {}", e);
        DatabaseError::new(DatabaseErrorKind::MigrationError {
            message: e.to_string(),
        })
    })?;
    Ok(())
}

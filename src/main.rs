use http::HeaderName;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use stbl_connect::api::{self, AppState};
use stbl_connect::config::Config;
use stbl_connect::database::repository::TokenCacheStore;
use stbl_connect::database::{self, PoolConfig, TokenCacheRepository, TokenMappingRepository};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[cfg(feature = "cache")]
async fn token_cache_store(
    config: &Config,
    pool: sqlx::SqlitePool,
) -> anyhow::Result<Arc<dyn TokenCacheStore>> {
    use stbl_connect::cache::{init_cache_pool, CacheConfig, RedisTokenCache};

    match &config.redis {
        Some(redis) => {
            let redis_pool = init_cache_pool(CacheConfig::new(redis.url.as_str())).await?;
            tracing::info!("Token cache backed by Redis");
            Ok(Arc::new(RedisTokenCache::new(redis_pool)))
        }
        None => Ok(Arc::new(TokenCacheRepository::new(pool))),
    }
}

#[cfg(not(feature = "cache"))]
async fn token_cache_store(
    config: &Config,
    pool: sqlx::SqlitePool,
) -> anyhow::Result<Arc<dyn TokenCacheStore>> {
    if config.redis.is_some() {
        tracing::warn!("REDIS_URL is set but the cache feature is disabled; using SQLite");
    }
    Ok(Arc::new(TokenCacheRepository::new(pool)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;

    tracing::info!("Starting STBL connect");
    tracing::info!("Provider: {}", config.gateway.base_url);
    tracing::info!("Provider sandbox: {}", config.gateway.sandbox_base_url);
    if let Some(callback_url) = &config.gateway.callback_url {
        tracing::info!("Provider callback URL: {}", callback_url);
    }

    let pool_config = if config.database.path == ":memory:" {
        PoolConfig::in_memory()
    } else {
        PoolConfig {
            max_connections: config.database.max_connections,
            ..Default::default()
        }
    };
    let pool = database::init_pool(&config.database.path, Some(pool_config)).await?;

    let token_cache = token_cache_store(&config, pool.clone()).await?;
    let mappings = Arc::new(TokenMappingRepository::new(pool));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(config, token_cache, mappings)?;

    let request_id = HeaderName::from_static("x-request-id");
    let app = api::router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id)),
    );

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

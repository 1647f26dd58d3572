use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

use crate::connect::callback::SIGN_KEY_LENGTH;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub gateway: GatewayConfig,
    pub business: BusinessConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Provider endpoints
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub sandbox_base_url: String,
    /// Public URL the provider calls back, informational only
    pub callback_url: Option<String>,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn base_url_for(&self, sandbox: bool) -> &str {
        if sandbox {
            &self.sandbox_base_url
        } else {
            &self.base_url
        }
    }
}

/// Platform endpoint and callback signing
#[derive(Clone)]
pub struct BusinessConfig {
    pub url: String,
    pub sign_key: String,
    pub callback_currency: String,
}

impl std::fmt::Debug for BusinessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessConfig")
            .field("url", &self.url)
            .field("sign_key", &"***")
            .field("callback_currency", &self.callback_currency)
            .finish()
    }
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .context("PORT not set")?
                .parse()
                .context("PORT must be a valid number")?,
        };

        let database = DatabaseConfig {
            path: env::var("DATABASE_PATH").context("DATABASE_PATH not set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
        };

        let redis = optional_var("REDIS_URL").map(|url| RedisConfig { url });

        let request_timeout_secs: u64 = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid number")?;

        let gateway = GatewayConfig {
            base_url: trim_url(env::var("BASE_URL").context("BASE_URL not set")?),
            sandbox_base_url: trim_url(
                env::var("SANDBOX_BASE_URL").context("SANDBOX_BASE_URL not set")?,
            ),
            callback_url: optional_var("CALLBACK_URL").map(trim_url),
            request_timeout: Duration::from_secs(request_timeout_secs),
        };

        let business = BusinessConfig {
            url: trim_url(env::var("BUSINESS_URL").context("BUSINESS_URL not set")?),
            sign_key: env::var("SIGN_KEY").context("SIGN_KEY not set")?,
            callback_currency: optional_var("CALLBACK_CURRENCY")
                .unwrap_or_else(|| "ARS".to_string()),
        };

        let config = Config {
            server,
            database,
            redis,
            gateway,
            business,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port < 1024 {
            return Err(anyhow!(
                "Port must be at least 1024, got {}",
                self.server.port
            ));
        }

        if self.database.path.trim().is_empty() {
            return Err(anyhow!("DATABASE_PATH cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow!("DATABASE_MAX_CONNECTIONS must be greater than 0"));
        }

        let urls = [
            ("BASE_URL", Some(&self.gateway.base_url)),
            ("SANDBOX_BASE_URL", Some(&self.gateway.sandbox_base_url)),
            ("CALLBACK_URL", self.gateway.callback_url.as_ref()),
            ("BUSINESS_URL", Some(&self.business.url)),
            ("REDIS_URL", self.redis.as_ref().map(|redis| &redis.url)),
        ];
        for (name, url) in urls {
            let Some(url) = url else { continue };
            if url.is_empty() {
                return Err(anyhow!("{} cannot be empty", name));
            }
            let valid_schemes: &[&str] = if name == "REDIS_URL" {
                &["redis://", "rediss://"]
            } else {
                &["http://", "https://"]
            };
            if !valid_schemes.iter().any(|scheme| url.starts_with(scheme)) {
                return Err(anyhow!(
                    "{} must start with one of {:?}, got {}",
                    name,
                    valid_schemes,
                    url
                ));
            }
        }

        if self.business.sign_key.len() != SIGN_KEY_LENGTH {
            return Err(anyhow!(
                "SIGN_KEY must be exactly {} bytes, got {}",
                SIGN_KEY_LENGTH,
                self.business.sign_key.len()
            ));
        }

        if self.business.callback_currency.trim().is_empty() {
            return Err(anyhow!("CALLBACK_CURRENCY cannot be empty"));
        }

        if self.gateway.request_timeout.is_zero() {
            return Err(anyhow!("REQUEST_TIMEOUT_SECS must be greater than 0"));
        }

        Ok(())
    }
}

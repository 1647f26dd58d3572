//! Provider authentication and the access-token cache
//!
//! Access tokens live for 15 minutes. A cached token is reused while more than
//! a minute of its lifetime remains; after that it is refreshed with the cached
//! refresh token, and if the refresh fails the credentials are used to log in
//! from scratch.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::{debug, info, warn};

use super::error::{GatewayError, GatewayResult};
use super::read_body;
use crate::connect::mask::secure_struct;
use crate::connect::InteractionLogs;
use crate::database::repository::TokenCacheStore;
use crate::database::token_cache_repository::TokenCacheEntry;

pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
pub const REFRESH_MARGIN_SECS: i64 = 60;

const TOKEN_OBTAIN_PATH: &str = "/auth/api/v1/external-tokens/token-obtain";
const TOKEN_REFRESH_PATH: &str = "/auth/api/v1/external-tokens/token-refresh";

#[derive(Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    access_token: String,
    refresh_token: String,
}

/// Access and refresh token resolved for one request
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

/// One-way cache key for a login/password pair
pub fn credentials_hash(login: &str, password: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", login, password).as_bytes());
    hex::encode(digest)
}

/// Whether a token refreshed at `refreshed_at` may still be used at `now`
pub fn is_fresh(refreshed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - refreshed_at < Duration::seconds(ACCESS_TOKEN_TTL_SECS - REFRESH_MARGIN_SECS)
}

/// Resolve a usable token pair, hitting the provider only when the cache
/// cannot serve one.
///
/// Fails only when the fresh login fails.
pub async fn resolve_tokens(
    client: &Client,
    store: &dyn TokenCacheStore,
    logs: &mut InteractionLogs,
    base_url: &str,
    login: &str,
    password: &str,
) -> GatewayResult<TokenPair> {
    let hash = credentials_hash(login, password);

    match store.get_token_cache(&hash).await {
        Ok(Some(cached)) => {
            if is_fresh(cached.access_refreshed_at, Utc::now()) {
                debug!("Using cached access token for {}", hash);
                return Ok(TokenPair {
                    access_token: cached.access_token,
                    refresh_token: cached.refresh_token,
                });
            }

            info!("Refreshing expired access token for {}", hash);
            match refresh_access_token(client, logs, base_url, &cached.refresh_token).await {
                Ok(access_token) => {
                    let pair = TokenPair {
                        access_token,
                        refresh_token: cached.refresh_token,
                    };
                    store_tokens(store, &hash, &pair).await;
                    return Ok(pair);
                }
                Err(e) => warn!("Failed to refresh access token: {}", e),
            }
        }
        Ok(None) => debug!("No cached tokens for {}", hash),
        Err(e) => warn!("Failed to fetch auth tokens from the token cache: {}", e),
    }

    info!("Obtaining fresh pair of access and refresh tokens");
    let pair = obtain_fresh_tokens(client, logs, base_url, login, password)
        .await
        .map_err(|e| GatewayError::authentication(e.to_string()))?;
    store_tokens(store, &hash, &pair).await;

    Ok(pair)
}

async fn store_tokens(store: &dyn TokenCacheStore, hash: &str, pair: &TokenPair) {
    let entry = TokenCacheEntry {
        credentials_hash: hash.to_string(),
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
        access_refreshed_at: Utc::now(),
    };
    if let Err(e) = store.upsert_token_cache(&entry).await {
        warn!("Failed to store auth tokens in the token cache: {}", e);
    }
}

/// Log in with the merchant credentials inside a `login` span.
pub async fn obtain_fresh_tokens(
    client: &Client,
    logs: &mut InteractionLogs,
    base_url: &str,
    login: &str,
    password: &str,
) -> GatewayResult<TokenPair> {
    let url = format!("{}{}", base_url, TOKEN_OBTAIN_PATH);
    let span = logs.enter("login");
    span.set_request(
        secure_struct(&AuthRequest {
            username: login,
            password: "***",
        }),
        url.as_str(),
    );

    let response = client
        .post(&url)
        .json(&AuthRequest {
            username: login,
            password,
        })
        .send()
        .await?;
    let status = response.status();
    span.set_status(status.as_u16());

    let body = read_body(response, span).await?;
    if !status.is_success() {
        return Err(GatewayError::UnexpectedStatus(status));
    }

    let auth: AuthResponse = serde_json::from_slice(&body)?;
    Ok(TokenPair {
        access_token: auth.access_token,
        refresh_token: auth.refresh_token,
    })
}

/// Exchange a refresh token for a new access token inside a `refresh_token`
/// span. The provider's refresh token in the reply is ignored; the cached one
/// stays in use.
pub async fn refresh_access_token(
    client: &Client,
    logs: &mut InteractionLogs,
    base_url: &str,
    refresh_token: &str,
) -> GatewayResult<String> {
    let url = format!("{}{}", base_url, TOKEN_REFRESH_PATH);
    let request = RefreshRequest { refresh_token };
    let span = logs.enter("refresh_token");
    span.set_request(secure_struct(&request), url.as_str());

    let response = client.post(&url).json(&request).send().await?;
    let status = response.status();
    span.set_status(status.as_u16());

    let body = read_body(response, span).await?;
    if !status.is_success() {
        return Err(GatewayError::UnexpectedStatus(status));
    }

    let auth: AuthResponse = serde_json::from_slice(&body)?;
    Ok(auth.access_token)
}

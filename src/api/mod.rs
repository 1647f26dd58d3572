//! HTTP surface facing the platform and the provider

pub mod callback;
pub mod health;
pub mod payment;
pub mod payout;
pub mod status;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::Config;
use crate::connect::{ConnectError, InteractionLogs, Payment, Settings};
use crate::database::repository::{TokenCacheStore, TokenMappingStore};
use crate::database::TokenMapping;
use crate::gateway::{GatewayClient, GatewayResult};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: Client,
    pub token_cache: Arc<dyn TokenCacheStore>,
    pub mappings: Arc<dyn TokenMappingStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        token_cache: Arc<dyn TokenCacheStore>,
        mappings: Arc<dyn TokenMappingStore>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.gateway.request_timeout)
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http,
            token_cache,
            mappings,
        })
    }

    /// Authenticate against the provider environment selected by `settings`.
    pub async fn gateway_client(
        &self,
        settings: &Settings,
        logs: &mut InteractionLogs,
    ) -> GatewayResult<GatewayClient> {
        let base_url = self.config.gateway.base_url_for(settings.sandbox);
        GatewayClient::connect(&self.http, self.token_cache.as_ref(), logs, base_url, settings)
            .await
    }

    /// Remember which platform token a gateway id belongs to. Failures are
    /// logged only.
    pub async fn store_mapping(&self, gateway_id: &str, payment: &Payment) {
        let mapping = TokenMapping {
            gateway_id: gateway_id.to_string(),
            token: payment.token.clone(),
            merchant_private_key: payment.merchant_private_key.clone(),
        };
        match self.mappings.create_mapping(&mapping).await {
            Ok(()) => {}
            Err(e) if e.is_constraint_violation() => {
                warn!("Gateway token mapping for {} already exists: {}", gateway_id, e);
            }
            Err(e) => error!("Failed to insert gateway token mapping: {}", e),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/pay", post(payment::pay))
        .route("/payout", post(payout::payout))
        .route("/status", post(status::status))
        .route("/callback/pay", post(callback::payment_callback))
        .route("/callback/payout", post(callback::payout_callback))
        .with_state(state)
}

/// Generic error for provider replies without a usable `detail`
pub const BAD_GATEWAY_RESPONSE: &str = "bad gateway response";

/// Generic error for provider replies missing required fields
pub const INCORRECT_PROVIDER_RESPONSE: &str = "Incorrect provider response";

/// Decode a platform request body, answering 400 with an empty log on failure.
pub(crate) fn decode_request<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Failed to decode gateway connect request: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ConnectError::new(e.to_string(), Vec::new())),
        )
            .into_response()
    })
}

/// `{result:false}` reply carrying the interaction trail
pub(crate) fn error_response(logs: InteractionLogs, message: impl Into<String>) -> Response {
    Json(ConnectError::new(message, logs.into_inner())).into_response()
}

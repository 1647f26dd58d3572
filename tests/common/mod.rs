#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stbl_connect::api::{router, AppState};
use stbl_connect::config::{
    BusinessConfig, Config, DatabaseConfig, GatewayConfig, ServerConfig,
};
use stbl_connect::database::MemoryStore;

pub const SIGN_KEY: &str = "0123456789abcdef0123456789abcdef";
pub const TOKEN_OBTAIN_PATH: &str = "/auth/api/v1/external-tokens/token-obtain";
pub const TOKEN_REFRESH_PATH: &str = "/auth/api/v1/external-tokens/token-refresh";

/// Provider and platform are both served by `server`.
pub fn test_config(server: &MockServer) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3030,
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
            max_connections: 1,
        },
        redis: None,
        gateway: GatewayConfig {
            base_url: server.uri(),
            sandbox_base_url: server.uri(),
            callback_url: None,
            request_timeout: Duration::from_secs(5),
        },
        business: BusinessConfig {
            url: server.uri(),
            sign_key: SIGN_KEY.to_string(),
            callback_currency: "ARS".to_string(),
        },
    }
}

pub fn test_state(server: &MockServer, store: Arc<MemoryStore>) -> AppState {
    AppState::new(test_config(server), store.clone(), store).unwrap()
}

pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_OBTAIN_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1"
        })))
        .mount(server)
        .await;
}

/// POST a raw body to the router and return the status and body.
pub async fn post_raw(state: AppState, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

/// POST JSON to the router and decode the JSON reply.
pub async fn post_json(state: AppState, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, bytes) = post_raw(state, uri, body.to_string()).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub fn log_kinds(reply: &Value) -> Vec<String> {
    reply["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|log| log["kind"].as_str().unwrap().to_string())
        .collect()
}

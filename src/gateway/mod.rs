//! Provider API client
//!
//! A [`GatewayClient`] is built per inbound request from a resolved token pair.
//! Its operations only build and send the provider request; interpreting the
//! status code and body is left to the caller.

pub mod auth;
pub mod callback;
pub mod error;
pub mod payment;
pub mod payout;

use reqwest::{Client, Method, Response};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::connect::mask::{secure_body, secure_struct};
use crate::connect::{to_major_units, ConnectRequest, InteractionLogs, InteractionSpan, Settings};
use crate::database::repository::TokenCacheStore;

use self::auth::{resolve_tokens, TokenPair};
pub use self::error::{GatewayError, GatewayResult};
use self::payment::{CreatePaymentRequest, PaymentAdditionalData};
use self::payout::{CreatePayoutRequest, PayoutAdditionalData};

const PAYMENTS_PATH: &str = "/pay/external-api/v1/payments";
const PAYOUTS_PATH: &str = "/pay/external-api/v1/payouts";

/// Provider error body
#[derive(Debug, Default, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ProviderErrorBody {
    /// Human readable error detail, if the body carried one
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Decode the provider's error detail from a raw body
pub fn provider_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ProviderErrorBody>(body)
        .ok()
        .and_then(|error| error.message())
}

/// The provider sends `null` for fields it has no value for yet; treat that
/// like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a provider response body and record its masked form on the span.
pub async fn read_body(response: Response, span: &mut InteractionSpan) -> GatewayResult<Vec<u8>> {
    let body = response.bytes().await?.to_vec();
    let secured = secure_body(&body);
    debug!("Gateway response body: {}", secured);
    span.set_response(secured);
    Ok(body)
}

/// Authenticated client for one inbound request
pub struct GatewayClient {
    http: Client,
    base_url: String,
    tokens: TokenPair,
}

impl GatewayClient {
    pub fn new(http: Client, base_url: impl Into<String>, tokens: TokenPair) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
        }
    }

    /// Resolve tokens for `settings` and build a client for `base_url`.
    pub async fn connect(
        http: &Client,
        store: &dyn TokenCacheStore,
        logs: &mut InteractionLogs,
        base_url: &str,
        settings: &Settings,
    ) -> GatewayResult<Self> {
        let tokens = resolve_tokens(
            http,
            store,
            logs,
            base_url,
            &settings.login,
            &settings.password,
        )
        .await?;

        Ok(Self::new(http.clone(), base_url, tokens))
    }

    /// Send a request with the bearer token, recording it on `span`.
    pub async fn make_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        span: &mut InteractionSpan,
    ) -> GatewayResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&self.tokens.access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        match body {
            Some(body) => {
                let secured = secure_struct(body);
                debug!("Gateway request body: {}", secured);
                span.set_request(secured, url.as_str());
                request = request.body(serde_json::to_vec(body)?);
            }
            None => span.set_request("", url.as_str()),
        }

        let response = request.send().await?;

        info!("Gateway response status: {}", response.status());
        span.set_status(response.status().as_u16());
        Ok(response)
    }

    pub async fn payment(
        &self,
        request: &ConnectRequest,
        span: &mut InteractionSpan,
    ) -> GatewayResult<Response> {
        let amount = match (
            request.payment.gateway_amount,
            request.payment.gateway_currency.as_ref(),
        ) {
            (Some(amount), Some(_)) => amount,
            _ => {
                return Err(GatewayError::missing_fields(&[
                    "gateway_amount",
                    "gateway_currency",
                ]))
            }
        };

        let payment = CreatePaymentRequest {
            amount: to_major_units(amount),
            transfer_method: "QR_CODE".to_string(),
            bank_name: String::new(),
            external_id: request.payment.token.clone(),
            additional_data: PaymentAdditionalData::default(),
            client_id: String::new(),
        };

        self.make_request(Method::POST, PAYMENTS_PATH, Some(&payment), span)
            .await
    }

    pub async fn payout(
        &self,
        request: &ConnectRequest,
        span: &mut InteractionSpan,
    ) -> GatewayResult<Response> {
        let account_number = request
            .params
            .bank_account
            .as_ref()
            .and_then(|account| account.account_number.as_ref());

        let (amount, account_number) = match (request.payment.gateway_amount, account_number) {
            (Some(amount), Some(account_number)) => (amount, account_number),
            _ => {
                return Err(GatewayError::missing_fields(&[
                    "gateway_amount",
                    "bank_account.account_number",
                ]))
            }
        };

        let payout = CreatePayoutRequest {
            amount: to_major_units(amount),
            transfer_method: "CBU".to_string(),
            bank_card_number: String::new(),
            phone_number: String::new(),
            bank_name: String::new(),
            additional_data: Some(PayoutAdditionalData {
                cbu: account_number.clone(),
                ..Default::default()
            }),
            external_id: request.payment.token.clone(),
        };

        self.make_request(Method::POST, PAYOUTS_PATH, Some(&payout), span)
            .await
    }

    pub async fn payment_status(
        &self,
        gateway_token: Option<&str>,
        span: &mut InteractionSpan,
    ) -> GatewayResult<Response> {
        let gateway_token =
            gateway_token.ok_or_else(|| GatewayError::missing_fields(&["gateway_token"]))?;
        let path = format!("{}/{}", PAYMENTS_PATH, gateway_token);
        self.make_request::<()>(Method::GET, &path, None, span).await
    }

    pub async fn payout_status(
        &self,
        gateway_token: Option<&str>,
        span: &mut InteractionSpan,
    ) -> GatewayResult<Response> {
        let gateway_token =
            gateway_token.ok_or_else(|| GatewayError::missing_fields(&["gateway_token"]))?;
        let path = format!("{}/{}", PAYOUTS_PATH, gateway_token);
        self.make_request::<()>(Method::GET, &path, None, span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::{BankAccount, Payment};

    fn client() -> GatewayClient {
        GatewayClient::new(
            Client::new(),
            "http://127.0.0.1:9",
            TokenPair {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_payment_requires_amount_and_currency() {
        let mut logs = InteractionLogs::new();
        let request = ConnectRequest {
            payment: Payment {
                gateway_amount: Some(1000),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = client().payment(&request, logs.enter("payment")).await;
        assert!(matches!(result, Err(GatewayError::MissingFields { .. })));

        let entries = logs.into_inner();
        assert!(entries[0].request.is_none());
    }

    #[tokio::test]
    async fn test_payout_requires_account_number() {
        let mut logs = InteractionLogs::new();
        let request = ConnectRequest {
            payment: Payment {
                gateway_amount: Some(1000),
                ..Default::default()
            },
            params: crate::connect::Params {
                bank_account: Some(BankAccount::default()),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = client().payout(&request, logs.enter("payout")).await;
        assert!(matches!(result, Err(GatewayError::MissingFields { .. })));
    }

    #[tokio::test]
    async fn test_status_requires_gateway_token() {
        let mut logs = InteractionLogs::new();
        let result = client().payment_status(None, logs.enter("status")).await;
        assert!(matches!(result, Err(GatewayError::MissingFields { .. })));

        let result = client().payout_status(None, logs.enter("status")).await;
        assert!(matches!(result, Err(GatewayError::MissingFields { .. })));
    }

    #[test]
    fn test_provider_error_message() {
        assert_eq!(
            provider_error_message(br#"{"detail":"Insufficient balance"}"#).as_deref(),
            Some("Insufficient balance")
        );
        assert_eq!(
            provider_error_message(br#"{"detail":[{"msg":"field required"}]}"#).as_deref(),
            Some(r#"[{"msg":"field required"}]"#)
        );
        assert_eq!(provider_error_message(br#"{"detail":null}"#), None);
        assert_eq!(provider_error_message(b"<html>502</html>"), None);
    }
}

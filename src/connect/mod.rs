//! Platform ("gateway connect") dialect
//!
//! Request and response shapes exchanged with the business platform, the
//! interaction log returned on every response, log masking and the signed
//! callback tokens.

pub mod callback;
pub mod interaction_log;
pub mod mask;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use interaction_log::{InteractionLog, InteractionLogs, InteractionSpan};

/// Platform status vocabulary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Approved,
    Declined,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Declined => "declined",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider credentials and environment selection
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sandbox: bool,
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("sandbox", &self.sandbox)
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub ip: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub pan: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BankAccount {
    pub requisite_type: String,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub customer: Customer,
    pub card: Card,
    pub bank_account: Option<BankAccount>,
}

/// Payment block of a pay/payout request
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Payment {
    /// Platform transaction token
    pub token: String,
    pub callback_url: String,
    pub merchant_private_key: String,
    pub extra_return_param: Option<String>,
    pub gateway_currency: Option<String>,
    /// Amount in minor units
    pub gateway_amount: Option<i64>,
    pub lead_id: i64,
}

impl fmt::Debug for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payment")
            .field("token", &self.token)
            .field("callback_url", &self.callback_url)
            .field("merchant_private_key", &"***")
            .field("extra_return_param", &self.extra_return_param)
            .field("gateway_currency", &self.gateway_currency)
            .field("gateway_amount", &self.gateway_amount)
            .field("lead_id", &self.lead_id)
            .finish()
    }
}

/// Inbound `/pay` and `/payout` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectRequest {
    pub params: Params,
    pub payment: Payment,
    pub processing_url: String,
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RedirectRequestType {
    GetWithProcessing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedirectRequest {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: RedirectRequestType,
}

impl RedirectRequest {
    pub fn get_with_processing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RedirectRequestType::GetWithProcessing,
        }
    }
}

/// Successful `/pay` and `/payout` reply
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub result: bool,
    pub logs: Vec<InteractionLog>,
    pub redirect_request: RedirectRequest,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_token: Option<String>,
}

/// Failure reply shared by every platform endpoint
#[derive(Debug, Serialize)]
pub struct ConnectError {
    pub result: bool,
    pub error: String,
    pub logs: Vec<InteractionLog>,
}

impl ConnectError {
    pub fn new(error: impl Into<String>, logs: Vec<InteractionLog>) -> Self {
        Self {
            result: false,
            error: error.into(),
            logs,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Pay,
    Payout,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusPayment {
    #[serde(default)]
    pub gateway_token: Option<String>,
    pub operation_type: OperationType,
    #[serde(default)]
    pub token: String,
}

/// Inbound `/status` body
#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub payment: StatusPayment,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub result: bool,
    pub logs: Vec<InteractionLog>,
    pub status: Status,
    /// Amount in minor units
    pub amount: i64,
}

/// Convert a provider amount in major units to minor units.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert a platform amount in minor units to major units.
pub fn to_major_units(amount: i64) -> f64 {
    amount as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minor_unit_conversion_rounds() {
        assert_eq!(to_minor_units(12.34), 1234);
        assert_eq!(to_minor_units(0.29), 29);
        assert_eq!(to_minor_units(1500.0), 150_000);
        assert_eq!(to_major_units(1234), 12.34);
    }

    #[test]
    fn test_connect_request_tolerates_missing_blocks() {
        let request: ConnectRequest = serde_json::from_value(json!({
            "payment": { "token": "tok_1", "gateway_amount": 1000, "gateway_currency": "ARS" },
            "settings": { "login": "user", "password": "secret", "sandbox": true }
        }))
        .unwrap();

        assert_eq!(request.payment.token, "tok_1");
        assert_eq!(request.payment.gateway_amount, Some(1000));
        assert!(request.params.bank_account.is_none());
        assert!(request.settings.sandbox);
    }

    #[test]
    fn test_secrets_hidden_from_debug() {
        let request: ConnectRequest = serde_json::from_value(json!({
            "payment": { "merchant_private_key": "very-secret-key" },
            "settings": { "login": "user", "password": "hunter2" }
        }))
        .unwrap();

        let debug = format!("{:?}", request);
        assert!(!debug.contains("very-secret-key"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_operation_type_parsing() {
        let request: StatusRequest = serde_json::from_value(json!({
            "payment": { "operation_type": "refund", "gateway_token": "g1" }
        }))
        .unwrap();
        assert_eq!(request.payment.operation_type, OperationType::Unsupported);

        let request: StatusRequest = serde_json::from_value(json!({
            "payment": { "operation_type": "payout" }
        }))
        .unwrap();
        assert_eq!(request.payment.operation_type, OperationType::Payout);
    }

    #[test]
    fn test_redirect_serialization() {
        let redirect = RedirectRequest::get_with_processing("https://pay.example/form");
        let json = serde_json::to_value(redirect).unwrap();
        assert_eq!(
            json,
            json!({ "url": "https://pay.example/form", "type": "get_with_processing" })
        );
    }
}

//! Provider payout resources

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::null_as_default;
use crate::connect::Status;

#[derive(Debug, Clone, Serialize)]
pub struct CreatePayoutRequest {
    /// Amount in major units
    pub amount: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub transfer_method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bank_card_number: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone_number: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bank_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<PayoutAdditionalData>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub external_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PayoutAdditionalData {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub customer_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cuit: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cbu: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayoutStatusInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub name: PayoutStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
}

/// Reply to payout creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayoutResponse {
    pub id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub num: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_card_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: PayoutStatusInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub external_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_name: String,
}

/// Reply to a payout status query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayoutStatusResponse {
    pub id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub num: String,
    pub amount: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_card_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: PayoutStatusInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub external_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_name: String,
}

/// Provider payout status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PayoutStatus {
    AwaitingProcessing,
    AwaitingConfirmation,
    PayoutDenied,
    Paid,
    Unknown(String),
}

impl Default for PayoutStatus {
    fn default() -> Self {
        PayoutStatus::Unknown(String::new())
    }
}

impl PayoutStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PayoutStatus::AwaitingProcessing => "AWAITING_PROCESSING",
            PayoutStatus::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            PayoutStatus::PayoutDenied => "PAYOUT_DENIED",
            PayoutStatus::Paid => "PAID",
            PayoutStatus::Unknown(raw) => raw,
        }
    }

    pub fn to_status(&self) -> Status {
        match self {
            PayoutStatus::AwaitingProcessing | PayoutStatus::AwaitingConfirmation => {
                Status::Pending
            }
            PayoutStatus::Paid => Status::Approved,
            PayoutStatus::PayoutDenied => Status::Declined,
            PayoutStatus::Unknown(raw) => {
                warn!("Unhandled payout status: {:?}", raw);
                Status::Pending
            }
        }
    }
}

impl From<String> for PayoutStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AWAITING_PROCESSING" => PayoutStatus::AwaitingProcessing,
            "AWAITING_CONFIRMATION" => PayoutStatus::AwaitingConfirmation,
            "PAYOUT_DENIED" => PayoutStatus::PayoutDenied,
            "PAID" => PayoutStatus::Paid,
            _ => PayoutStatus::Unknown(value),
        }
    }
}

impl From<PayoutStatus> for String {
    fn from(value: PayoutStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

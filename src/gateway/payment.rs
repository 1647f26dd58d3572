//! Provider payment resources

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::null_as_default;
use crate::connect::Status;

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentRequest {
    /// Amount in major units
    pub amount: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub transfer_method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bank_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub external_id: String,
    pub additional_data: PaymentAdditionalData,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentAdditionalData {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cbu: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cuit: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BankCard {
    #[serde(deserialize_with = "null_as_default")]
    pub qr_code_link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Requisites {
    #[serde(deserialize_with = "null_as_default")]
    pub cbu: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bolivia_account_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bolivia_qr_code_link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ecu_account_number: String,
}

/// Status object attached to payment resources
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentStatusInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub name: PaymentStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
}

/// Reply to payment creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentResponse {
    pub id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub transfer_method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_card: BankCard,
    #[serde(deserialize_with = "null_as_default")]
    pub provider_payment_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub provider_requisite: String,
    #[serde(deserialize_with = "null_as_default")]
    pub requisites: Requisites,
    #[serde(deserialize_with = "null_as_default")]
    pub status: PaymentStatusInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub external_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub exchange_rate: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pay_form_link: String,
}

/// Reply to a payment status query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentStatusResponse {
    pub id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub num: String,
    pub amount: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub transfer_method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_card: BankCard,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: PaymentStatusInfo,
}

/// Provider payment status
///
/// Values the provider may add later land in `Unknown` and map to pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    New,
    Canceled,
    Completed,
    AppealApproved,
    AppealRejected,
    AppealConsideration,
    Unknown(String),
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unknown(String::new())
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::New => "NEW",
            PaymentStatus::Canceled => "CANCELED",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::AppealApproved => "APPEAL_APPROVED",
            PaymentStatus::AppealRejected => "APPEAL_REJECTED",
            PaymentStatus::AppealConsideration => "APPEAL_CONSIDERATION",
            PaymentStatus::Unknown(raw) => raw,
        }
    }

    pub fn to_status(&self) -> Status {
        match self {
            PaymentStatus::New | PaymentStatus::AppealConsideration => Status::Pending,
            PaymentStatus::Completed | PaymentStatus::AppealApproved => Status::Approved,
            PaymentStatus::Canceled | PaymentStatus::AppealRejected => Status::Declined,
            PaymentStatus::Unknown(raw) => {
                warn!("Unhandled payment status: {:?}", raw);
                Status::Pending
            }
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NEW" => PaymentStatus::New,
            "CANCELED" => PaymentStatus::Canceled,
            "COMPLETED" => PaymentStatus::Completed,
            "APPEAL_APPROVED" => PaymentStatus::AppealApproved,
            "APPEAL_REJECTED" => PaymentStatus::AppealRejected,
            "APPEAL_CONSIDERATION" => PaymentStatus::AppealConsideration,
            _ => PaymentStatus::Unknown(value),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

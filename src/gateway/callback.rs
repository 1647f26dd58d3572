//! Asynchronous notifications sent by the provider

use serde::Deserialize;

use super::null_as_default;
use super::payment::PaymentStatus;
use super::payout::PayoutStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    /// Amount in major units
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_id: String,
    /// Amount actually paid, when it differs from the requested one
    #[serde(default)]
    pub new_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayoutCallback {
    #[serde(default)]
    pub payout_id: Option<String>,
    #[serde(default)]
    pub payout_status: Option<PayoutStatus>,
    #[serde(default)]
    pub payout_amount: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payout_external_id: String,
}

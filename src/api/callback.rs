//! Provider callbacks relayed to the platform as signed tokens

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;
use tracing::{error, info};

use super::AppState;
use crate::connect::callback::{sign, CallbackPayload, SignError};
use crate::connect::{to_minor_units, Status};
use crate::database::error::DatabaseError;
use crate::database::TokenMapping;
use crate::gateway::callback::{PaymentCallback, PayoutCallback};

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("failed to decode callback body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing fields in gateway callback")]
    MissingFields,

    #[error("failed to load gateway token mapping: {0}")]
    MappingLookup(#[from] DatabaseError),

    #[error("no gateway token mapping for {0}")]
    UnknownMapping(String),

    #[error("failed to create callback token: {0}")]
    Sign(#[from] SignError),

    #[error("failed to send callback: {0}")]
    Relay(#[from] reqwest::Error),

    #[error("platform rejected callback with status {0}")]
    Rejected(reqwest::StatusCode),
}

impl CallbackError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CallbackError::Decode(_)
            | CallbackError::MissingFields
            | CallbackError::MappingLookup(_)
            | CallbackError::UnknownMapping(_) => StatusCode::BAD_REQUEST,
            CallbackError::Sign(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CallbackError::Relay(_) | CallbackError::Rejected(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        error!("Gateway callback failed: {}", self);
        (self.status_code(), self.to_string()).into_response()
    }
}

async fn load_mapping(state: &AppState, gateway_id: &str) -> Result<TokenMapping, CallbackError> {
    state
        .mappings
        .get_mapping(gateway_id)
        .await?
        .ok_or_else(|| CallbackError::UnknownMapping(gateway_id.to_string()))
}

/// Sign `payload` with the mapping's merchant key and post it to the
/// platform's callback endpoint for the mapped token.
pub async fn relay_callback(
    state: &AppState,
    mapping: &TokenMapping,
    payload: CallbackPayload,
) -> Result<(), CallbackError> {
    let business = &state.config.business;
    let token = sign(
        payload.clone(),
        &mapping.merchant_private_key,
        business.sign_key.as_bytes(),
    )?;

    let url = format!(
        "{}/callbacks/v2/gateway_callbacks/{}",
        business.url, mapping.token
    );
    info!(
        "Sending gateway connect callback ({}) status={} amount={}",
        url, payload.status, payload.amount
    );

    let response = state
        .http
        .post(&url)
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?;

    info!("Gateway connect callback response: {}", response.status());
    if !response.status().is_success() {
        return Err(CallbackError::Rejected(response.status()));
    }
    Ok(())
}

fn declined_reason(status: Status, provider_status: &str) -> Option<String> {
    (status == Status::Declined).then(|| provider_status.to_string())
}

/// `POST /callback/pay`
pub async fn payment_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, CallbackError> {
    info!("Received payment gateway callback");
    let callback: PaymentCallback = serde_json::from_slice(&body)?;

    let (Some(gateway_id), Some(provider_status), Some(amount)) =
        (callback.id, callback.status, callback.amount)
    else {
        return Err(CallbackError::MissingFields);
    };

    let mapping = load_mapping(&state, &gateway_id).await?;

    let amount = match callback.new_amount {
        Some(new_amount) => {
            info!("Got callback with updated amount: {:.2}", new_amount);
            new_amount
        }
        None => amount,
    };

    let status = provider_status.to_status();
    let payload = CallbackPayload {
        status,
        currency: state.config.business.callback_currency.clone(),
        amount: to_minor_units(amount),
        reason: declined_reason(status, provider_status.as_str()),
    };

    relay_callback(&state, &mapping, payload).await?;
    Ok(StatusCode::OK)
}

/// `POST /callback/payout`
pub async fn payout_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, CallbackError> {
    info!("Received payout gateway callback");
    let callback: PayoutCallback = serde_json::from_slice(&body)?;

    let (Some(gateway_id), Some(provider_status), Some(amount)) = (
        callback.payout_id,
        callback.payout_status,
        callback.payout_amount,
    ) else {
        return Err(CallbackError::MissingFields);
    };

    let mapping = load_mapping(&state, &gateway_id).await?;

    let status = provider_status.to_status();
    let payload = CallbackPayload {
        status,
        currency: state.config.business.callback_currency.clone(),
        amount: to_minor_units(amount),
        reason: declined_reason(status, provider_status.as_str()),
    };

    relay_callback(&state, &mapping, payload).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            CallbackError::MissingFields.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CallbackError::UnknownMapping("gw".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CallbackError::Sign(SignError::InvalidKeyLength(3)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CallbackError::Rejected(reqwest::StatusCode::FORBIDDEN).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_reason_only_for_declined() {
        assert_eq!(
            declined_reason(Status::Declined, "PAYOUT_DENIED").as_deref(),
            Some("PAYOUT_DENIED")
        );
        assert_eq!(declined_reason(Status::Approved, "PAID"), None);
        assert_eq!(declined_reason(Status::Pending, "NEW"), None);
    }
}

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::StatusCode;
use tracing::{error, info};

use super::{
    decode_request, error_response, AppState, BAD_GATEWAY_RESPONSE, INCORRECT_PROVIDER_RESPONSE,
};
use crate::connect::{ConnectRequest, ConnectResponse, InteractionLogs, RedirectRequest};
use crate::gateway::payment::PaymentResponse;
use crate::gateway::{provider_error_message, read_body};

/// `POST /pay`
///
/// Only a 201 carrying an `id` is a success; the payment form link becomes the
/// redirect and the id is remembered for later callbacks.
pub async fn pay(State(state): State<AppState>, body: Bytes) -> Response {
    let request: ConnectRequest = match decode_request(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!("Payment request for token {}", request.payment.token);

    let mut logs = InteractionLogs::new();
    let client = match state.gateway_client(&request.settings, &mut logs).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initiate gateway client: {}", e);
            return error_response(logs, e.to_string());
        }
    };

    let span = logs.enter("payment");
    let response = match client.payment(&request, span).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to create payment: {}", e);
            return error_response(logs, e.to_string());
        }
    };

    let status = response.status();
    let body = match read_body(response, span).await {
        Ok(body) => body,
        Err(e) => return error_response(logs, e.to_string()),
    };

    if status != StatusCode::CREATED {
        let message =
            provider_error_message(&body).unwrap_or_else(|| BAD_GATEWAY_RESPONSE.to_string());
        return error_response(logs, message);
    }

    let payment: PaymentResponse = match serde_json::from_slice(&body) {
        Ok(payment) => payment,
        Err(e) => {
            return error_response(logs, format!("Failed to deserialize gateway response: {}", e))
        }
    };

    let Some(gateway_id) = payment.id else {
        return error_response(logs, INCORRECT_PROVIDER_RESPONSE);
    };

    state.store_mapping(&gateway_id, &request.payment).await;

    Json(ConnectResponse {
        result: true,
        logs: logs.into_inner(),
        redirect_request: RedirectRequest::get_with_processing(payment.pay_form_link),
        status: payment.status.name.to_status(),
        gateway_token: Some(gateway_id),
    })
    .into_response()
}

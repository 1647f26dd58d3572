use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::StatusCode;
use tracing::{error, warn};

use super::{
    decode_request, error_response, AppState, BAD_GATEWAY_RESPONSE, INCORRECT_PROVIDER_RESPONSE,
};
use crate::connect::{
    to_minor_units, InteractionLogs, OperationType, Status, StatusRequest, StatusResponse,
};
use crate::gateway::payment::PaymentStatusResponse;
use crate::gateway::payout::PayoutStatusResponse;
use crate::gateway::{provider_error_message, read_body};

/// Fields shared by both status replies
struct ProviderStatus {
    id: Option<String>,
    amount: Option<f64>,
    status: Status,
}

fn parse_status(operation: OperationType, body: &[u8]) -> serde_json::Result<ProviderStatus> {
    match operation {
        OperationType::Pay => {
            let reply: PaymentStatusResponse = serde_json::from_slice(body)?;
            Ok(ProviderStatus {
                id: reply.id,
                amount: reply.amount,
                status: reply.status.name.to_status(),
            })
        }
        _ => {
            let reply: PayoutStatusResponse = serde_json::from_slice(body)?;
            Ok(ProviderStatus {
                id: reply.id,
                amount: reply.amount,
                status: reply.status.name.to_status(),
            })
        }
    }
}

/// `POST /status`
pub async fn status(State(state): State<AppState>, body: Bytes) -> Response {
    let request: StatusRequest = match decode_request(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let mut logs = InteractionLogs::new();
    let client = match state.gateway_client(&request.settings, &mut logs).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initiate gateway client: {}", e);
            return error_response(logs, e.to_string());
        }
    };

    let operation = request.payment.operation_type;
    let gateway_token = request.payment.gateway_token.as_deref();
    let span = logs.enter("status");
    let response = match operation {
        OperationType::Pay => client.payment_status(gateway_token, span).await,
        OperationType::Payout => client.payout_status(gateway_token, span).await,
        OperationType::Unsupported => {
            warn!(
                "Unsupported operation type in status request for token {}",
                request.payment.token
            );
            return error_response(logs, "Unsupported operation type");
        }
    };
    let response = match response {
        Ok(response) => response,
        Err(e) => return error_response(logs, e.to_string()),
    };

    let status = response.status();
    let body = match read_body(response, span).await {
        Ok(body) => body,
        Err(e) => return error_response(logs, e.to_string()),
    };

    if status != StatusCode::OK {
        let message =
            provider_error_message(&body).unwrap_or_else(|| BAD_GATEWAY_RESPONSE.to_string());
        return error_response(logs, message);
    }

    let reply = match parse_status(operation, &body) {
        Ok(reply) => reply,
        Err(e) => return error_response(logs, e.to_string()),
    };

    match (reply.id, reply.amount) {
        (Some(_), Some(amount)) => Json(StatusResponse {
            result: true,
            logs: logs.into_inner(),
            status: reply.status,
            amount: to_minor_units(amount),
        })
        .into_response(),
        _ => error_response(logs, INCORRECT_PROVIDER_RESPONSE),
    }
}

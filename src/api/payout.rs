use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::StatusCode;
use tracing::{error, info, warn};

use super::{decode_request, error_response, AppState};
use crate::connect::{ConnectRequest, ConnectResponse, InteractionLogs, RedirectRequest, Status};
use crate::gateway::payout::PayoutResponse;
use crate::gateway::{provider_error_message, read_body};

/// Optimistic reply used whenever the payout may already be in flight.
fn pending_response(logs: InteractionLogs, processing_url: String) -> Response {
    Json(ConnectResponse {
        result: true,
        logs: logs.into_inner(),
        redirect_request: RedirectRequest::get_with_processing(processing_url),
        status: Status::Pending,
        gateway_token: None,
    })
    .into_response()
}

/// `POST /payout`
///
/// Ambiguous provider replies (5xx, an unreadable 201, a 4xx without a
/// `detail`) are answered as pending rather than as failures.
pub async fn payout(State(state): State<AppState>, body: Bytes) -> Response {
    let request: ConnectRequest = match decode_request(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!("Payout request for token {}", request.payment.token);

    let mut logs = InteractionLogs::new();
    let client = match state.gateway_client(&request.settings, &mut logs).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initiate gateway client: {}", e);
            return error_response(logs, e.to_string());
        }
    };

    let span = logs.enter("payout");
    let response = match client.payout(&request, span).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to create payout: {}", e);
            return error_response(logs, e.to_string());
        }
    };

    let status = response.status();
    let body = match read_body(response, span).await {
        Ok(body) => body,
        Err(e) => return error_response(logs, e.to_string()),
    };
    let processing_url = request.processing_url.clone();

    if status == StatusCode::CREATED {
        let payout = match serde_json::from_slice::<PayoutResponse>(&body) {
            Ok(payout) => payout,
            Err(e) => {
                warn!("Unreadable payout response, answering pending: {}", e);
                return pending_response(logs, processing_url);
            }
        };

        let Some(gateway_id) = payout.id else {
            warn!("Payout response without id, answering pending");
            return pending_response(logs, processing_url);
        };

        state.store_mapping(&gateway_id, &request.payment).await;

        return Json(ConnectResponse {
            result: true,
            logs: logs.into_inner(),
            redirect_request: RedirectRequest::get_with_processing(processing_url),
            status: payout.status.name.to_status(),
            gateway_token: Some(gateway_id),
        })
        .into_response();
    }

    if status.is_server_error() {
        warn!("Provider answered {} to payout, answering pending", status);
        return pending_response(logs, processing_url);
    }

    match provider_error_message(&body) {
        Some(message) => error_response(logs, message),
        None => pending_response(logs, processing_url),
    }
}

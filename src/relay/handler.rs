//! `POST /cors-proxy` handler.

use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::{logging::preview, metrics};
use crate::relay::outcome::{ExecutionOutcome, ResponseHeaders};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub curl_param: String,
}

/// Envelope returned for every relay call that got past JSON binding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub execution_time: String,
    pub status_code: u16,
    pub response_body: String,
    pub response_headers: ResponseHeaders,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl From<ExecutionOutcome> for RelayResponse {
    fn from(outcome: ExecutionOutcome) -> Self {
        Self {
            execution_time: outcome.duration_string(),
            status_code: outcome.status_code,
            error: outcome.error.as_ref().map(ToString::to_string),
            error_kind: outcome.error_kind().map(str::to_string),
            response_body: outcome.response_body,
            response_headers: outcome.response_headers,
        }
    }
}

pub(crate) fn bad_request(message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Relay a curl command. Network and parse failures are reported inside a
/// 200 envelope so browsers can always read them.
pub async fn relay_handler(
    State(state): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    let request_id = request_id(&headers);

    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, error = %rejection.body_text(), "Invalid relay request body");
            return bad_request(rejection.body_text());
        }
    };
    if request.curl_param.trim().is_empty() {
        return bad_request("curlParam is required");
    }

    let span = tracing::info_span!("relay", request_id = %request_id, client = %client);
    let outcome = async {
        tracing::info!(
            command = %preview(&request.curl_param, state.relay.config().log_command_chars),
            "Relay request received"
        );
        let outcome = state.relay.relay(&request.curl_param).await;
        match &outcome.error {
            Some(e) => tracing::warn!(kind = e.kind(), error = %e, elapsed = %outcome.duration_string(), "Relay failed"),
            None => tracing::info!(status = outcome.status_code, elapsed = %outcome.duration_string(), "Relay finished"),
        }
        outcome
    }
    .instrument(span)
    .await;

    metrics::record_relay(outcome.label(), outcome.duration);

    Json(RelayResponse::from(outcome)).into_response()
}

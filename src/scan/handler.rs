//! `POST /port-scan` handler.

use std::time::{Duration, Instant};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Instrument;

use crate::config::ScanConfig;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::scan::ports::{all_ports, parse_ports, PortSpecError};
use crate::scan::scheduler::ScanPlan;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanRequest {
    pub host: Option<String>,
    pub ports: String,
    pub scan_all: bool,
    /// Per-probe timeout in milliseconds; non-positive means default.
    pub timeout: i64,
    /// Worker count; non-positive means default.
    pub batch_size: i64,
}

/// Request-level scan validation failures. All map to 400.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid request parameters: {0}")]
    BadRequest(String),

    #[error("host is required")]
    MissingHost,

    #[error("port parse error: {0}")]
    InvalidSpec(#[from] PortSpecError),

    #[error("no ports specified")]
    NoPorts,
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl ScanRequest {
    /// Resolve the request into a runnable plan.
    pub fn into_plan(self, defaults: &ScanConfig) -> Result<ScanPlan, ScanError> {
        let host = self
            .host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or(ScanError::MissingHost)?;

        let ports = if self.scan_all {
            all_ports()
        } else {
            parse_ports(&self.ports)?
        };
        if ports.is_empty() {
            return Err(ScanError::NoPorts);
        }

        let timeout_ms = u64::try_from(self.timeout)
            .ok()
            .filter(|ms| *ms > 0)
            .unwrap_or(defaults.default_timeout_ms);
        let batch_size = usize::try_from(self.batch_size)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(defaults.default_batch_size);

        Ok(ScanPlan {
            host,
            ports,
            timeout: Duration::from_millis(timeout_ms),
            batch_size,
        })
    }
}

pub async fn scan_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Response, ScanError> {
    let request_id = request_id(&headers);
    let Json(request) = payload.map_err(|rejection| ScanError::BadRequest(rejection.body_text()))?;

    let plan = request.into_plan(state.scanner.config()).map_err(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Rejected scan request");
        e
    })?;

    let span = tracing::info_span!("scan", request_id = %request_id, host = %plan.host);
    let start = Instant::now();
    let report = state.scanner.run(plan).instrument(span).await;
    metrics::record_scan(&report.bucket_counts(), start.elapsed());

    Ok(Json(report).into_response())
}

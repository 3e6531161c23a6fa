//! Normalized result of one relay call.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::relay::error::RelayError;

/// Response headers flattened to one value per name.
pub type ResponseHeaders = BTreeMap<String, String>;

/// What came back from the remote origin.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: ResponseHeaders,
    pub body: String,
}

/// Result of a relay call, successful or not.
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// 0 when no response was received.
    pub status_code: u16,
    pub response_body: String,
    pub response_headers: ResponseHeaders,
    pub duration: Duration,
    pub error: Option<RelayError>,
}

impl ExecutionOutcome {
    pub fn from_result(result: Result<RawResponse, RelayError>, duration: Duration) -> Self {
        match result {
            Ok(response) => Self {
                status_code: response.status,
                response_body: response.body,
                response_headers: response.headers,
                duration,
                error: None,
            },
            Err(RelayError::BodyRead { status, headers, message }) => Self {
                status_code: status,
                response_body: String::new(),
                response_headers: headers.clone(),
                duration,
                error: Some(RelayError::BodyRead { status, headers, message }),
            },
            Err(e) => Self {
                status_code: 0,
                response_body: String::new(),
                response_headers: ResponseHeaders::new(),
                duration,
                error: Some(e),
            },
        }
    }

    /// Human readable duration, e.g. `12.5ms`.
    pub fn duration_string(&self) -> String {
        format!("{:?}", self.duration)
    }

    pub fn error_kind(&self) -> Option<&'static str> {
        self.error.as_ref().map(RelayError::kind)
    }

    /// Metrics label: the error kind, or `ok`.
    pub fn label(&self) -> &'static str {
        self.error_kind().unwrap_or("ok")
    }
}

/// `content-type` → `Content-Type`, `x-request-id` → `X-Request-Id`.
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Flatten a header map, joining repeated headers with `", "`.
pub fn flatten_headers(headers: &HeaderMap) -> ResponseHeaders {
    let mut flat = ResponseHeaders::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        flat.insert(canonical_header_name(name.as_str()), joined);
    }
    flat
}

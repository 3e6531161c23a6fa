//! Request ID plumbing.
//!
//! IDs are generated by `SetRequestIdLayer` (UUID v4) before any handler
//! runs and echoed back on the response by `PropagateRequestIdLayer`.

use axum::http::HeaderMap;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The request ID assigned by the request-ID layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id_present() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn test_request_id_missing() {
        assert_eq!(request_id(&HeaderMap::new()), "unknown");
    }
}

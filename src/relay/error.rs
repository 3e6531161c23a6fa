//! Relay failure taxonomy.

use std::error::Error as StdError;

use thiserror::Error;

use crate::relay::outcome::ResponseHeaders;

/// Everything that can go wrong between receiving a curl command and
/// handing back the remote response.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("command must start with 'curl'")]
    InvalidCommand,

    #[error("unable to find a URL in the command")]
    UrlNotFound,

    #[error("URL '{0}' has no scheme; expected something like https://")]
    MissingScheme(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("DNS resolution failed, host not found: {0}")]
    DnsFailure(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("TLS/SSL error: {0}; try adding the --insecure option")]
    TlsFailure(String),

    #[error("HTTP request failed: {0}")]
    TransportFailure(String),

    /// The status line and headers arrived but the body did not.
    #[error("failed to read response body: {message}")]
    BodyRead {
        status: u16,
        headers: ResponseHeaders,
        message: String,
    },
}

impl RelayError {
    /// Stable machine-readable name, used for metrics labels and the
    /// `errorKind` envelope field.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidCommand => "invalid_command",
            RelayError::UrlNotFound => "url_not_found",
            RelayError::MissingScheme(_) => "missing_scheme",
            RelayError::InvalidRequest(_) => "invalid_request",
            RelayError::DnsFailure(_) => "dns_failure",
            RelayError::Timeout(_) => "timeout",
            RelayError::TlsFailure(_) => "tls_failure",
            RelayError::TransportFailure(_) => "transport_failure",
            RelayError::BodyRead { .. } => "body_read",
        }
    }

    /// Classify a transport error returned by the outbound client.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let causes = source_chain(err);
        // The top-level message embeds the target URL; only match on causes
        // so a host like `tls.example.com` cannot skew the result.
        let haystack = if causes.is_empty() { err.to_string() } else { causes.clone() };
        let message = if causes.is_empty() {
            err.to_string()
        } else {
            format!("{}: {}", err, causes)
        };
        classify_message(&haystack, err.is_timeout(), message)
    }
}

/// Join every `source()` below `err` into one string.
fn source_chain(err: &dyn StdError) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

/// Map an error description onto the transport taxonomy.
///
/// Checks run in priority order: DNS, timeout, TLS, then everything else.
pub(crate) fn classify_message(haystack: &str, timed_out: bool, message: String) -> RelayError {
    let lower = haystack.to_lowercase();

    let dns = ["dns error", "failed to lookup address", "no such host", "name or service not known", "nodename nor servname"];
    if dns.iter().any(|needle| lower.contains(needle)) {
        return RelayError::DnsFailure(message);
    }
    if timed_out || lower.contains("timeout") || lower.contains("timed out") {
        return RelayError::Timeout(message);
    }
    if ["tls", "ssl", "certificate", "handshake"].iter().any(|needle| lower.contains(needle)) {
        return RelayError::TlsFailure(message);
    }
    RelayError::TransportFailure(message)
}

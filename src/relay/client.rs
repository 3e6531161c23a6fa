//! Outbound HTTP execution for relay calls.
//!
//! # Responsibilities
//! - Configure a client per call (TLS trust, proxy, timeouts, redirects)
//! - Send the request exactly once, no retries
//! - Capture status, headers and the full body
//! - Classify transport failures
//!
//! # Design Decisions
//! - A fresh client per call so proxy env vars are read at execution time
//!   and per-command TLS/redirect settings never leak between callers

use std::time::{Duration, Instant};

use reqwest::redirect::Policy;

use crate::config::RelayConfig;
use crate::observability::logging::preview;
use crate::relay::builder::build_request;
use crate::relay::command::{parse_command, RequestDescriptor};
use crate::relay::error::RelayError;
use crate::relay::outcome::{flatten_headers, ExecutionOutcome, RawResponse};

/// Executes curl commands on behalf of callers.
#[derive(Debug, Clone)]
pub struct ExecutionClient {
    config: RelayConfig,
}

impl ExecutionClient {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Parse and execute a raw curl command, timing the whole operation.
    /// Never fails: errors are carried inside the outcome.
    pub async fn relay(&self, raw: &str) -> ExecutionOutcome {
        let start = Instant::now();
        let result = match parse_command(raw, self.config.default_timeout_secs) {
            Ok(descriptor) => {
                tracing::info!(
                    method = %descriptor.method,
                    url = %descriptor.url,
                    headers = descriptor.headers.len(),
                    body_len = descriptor.body.as_deref().map_or(0, str::len),
                    insecure = descriptor.insecure_tls,
                    "Parsed curl command"
                );
                self.execute(&descriptor).await
            }
            Err(e) => Err(e),
        };
        ExecutionOutcome::from_result(result, start.elapsed())
    }

    /// Execute a parsed descriptor once.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, RelayError> {
        let request = build_request(descriptor, &self.config.user_agent)?;
        let client = self.build_client(descriptor)?;

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers);
        if let Some(body) = request.body {
            tracing::debug!(bytes = body.len(), "Attaching request body");
            builder = builder.body(body);
        }

        let start = Instant::now();
        let response = builder.send().await.map_err(|e| {
            let err = RelayError::from_transport(&e);
            tracing::warn!(
                kind = err.kind(),
                error = %err,
                elapsed = ?start.elapsed(),
                "Relayed request failed"
            );
            err
        })?;

        let status = response.status().as_u16();
        let headers = flatten_headers(response.headers());
        tracing::debug!(status, headers = headers.len(), elapsed = ?start.elapsed(), "Received response head");

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(status, error = %e, "Failed to read response body");
                return Err(RelayError::BodyRead {
                    status,
                    headers,
                    message: e.to_string(),
                });
            }
        };
        let body = String::from_utf8_lossy(&bytes).into_owned();

        tracing::info!(
            status,
            headers = headers.len(),
            body_len = body.len(),
            elapsed = ?start.elapsed(),
            "Relayed request completed"
        );
        tracing::debug!(body = %preview(&body, self.config.log_preview_chars), "Response body preview");

        Ok(RawResponse { status, headers, body })
    }

    /// Effective total timeout; non-positive values fall back to the default.
    pub fn effective_timeout(&self, descriptor: &RequestDescriptor) -> Duration {
        let secs = if descriptor.timeout_secs > 0 {
            descriptor.timeout_secs
        } else {
            self.config.default_timeout_secs
        };
        Duration::from_secs(secs)
    }

    fn build_client(&self, descriptor: &RequestDescriptor) -> Result<reqwest::Client, RelayError> {
        let redirect = if descriptor.follow_redirects {
            tracing::debug!("Following redirects");
            Policy::default()
        } else {
            Policy::none()
        };

        let mut builder = reqwest::Client::builder()
            .timeout(self.effective_timeout(descriptor))
            .connect_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(self.config.pool_idle_timeout_secs))
            .redirect(redirect);

        if descriptor.insecure_tls {
            tracing::debug!("Skipping TLS certificate verification");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let proxy = if self.config.honor_proxy_env {
            select_proxy(|key| std::env::var(key).ok())
        } else {
            None
        };
        builder = match proxy {
            Some(proxy_url) => match reqwest::Proxy::all(&proxy_url) {
                Ok(proxy) => {
                    tracing::info!(proxy = %proxy_url, "Using upstream proxy");
                    builder.proxy(proxy.no_proxy(reqwest::NoProxy::from_env()))
                }
                Err(e) => {
                    tracing::warn!(proxy = %proxy_url, error = %e, "Ignoring invalid proxy URL");
                    builder.no_proxy()
                }
            },
            None => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| RelayError::TransportFailure(format!("failed to build HTTP client: {}", e)))
    }
}

/// Pick the upstream proxy from `HTTP_PROXY`/`HTTPS_PROXY`.
///
/// `HTTPS_PROXY` wins when both are set and differ; the choice applies to
/// every scheme.
pub fn select_proxy(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let http = get("HTTP_PROXY");
    let https = get("HTTPS_PROXY");

    match (http, https) {
        (Some(http), Some(https)) if http != https => Some(https),
        (Some(http), _) => Some(http),
        (None, https) => https,
    }
}

//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Returns every problem found,
//! not just the first.

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn push(errors: &mut Vec<ValidationError>, field: &'static str, message: impl Into<String>) {
    errors.push(ValidationError {
        field,
        message: message.into(),
    });
}

/// Validate a configuration: `AppConfig → Result<(), Vec<ValidationError>>`.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        push(
            &mut errors,
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        );
    }

    if config.relay.default_timeout_secs == 0 {
        push(&mut errors, "relay.default_timeout_secs", "must be greater than 0");
    }
    if config.relay.connect_timeout_secs == 0 {
        push(&mut errors, "relay.connect_timeout_secs", "must be greater than 0");
    }

    if config.scan.default_timeout_ms == 0 {
        push(&mut errors, "scan.default_timeout_ms", "must be greater than 0");
    }
    if config.scan.default_batch_size == 0 {
        push(&mut errors, "scan.default_batch_size", "must be greater than 0");
    }
    if config.scan.max_concurrency == 0 {
        push(&mut errors, "scan.max_concurrency", "must be greater than 0");
    }

    if config.timeouts.request_secs == Some(0) {
        push(&mut errors, "timeouts.request_secs", "must be greater than 0 when set");
    }

    if config.security.max_body_size == 0 {
        push(&mut errors, "security.max_body_size", "must be greater than 0");
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        push(
            &mut errors,
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Single-port TCP probe.

use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    Open,
    Closed,
    Timeout,
    Error,
}

impl PortStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortStatus::Open => "open",
            PortStatus::Closed => "closed",
            PortStatus::Timeout => "timeout",
            PortStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortProbeResult {
    pub port: u16,
    pub status: PortStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Probe one port. An established connection is the only success
/// criterion; the follow-up write is best effort.
pub async fn probe_port(host: &str, port: u16, connect_timeout: Duration, write_timeout: Duration) -> PortProbeResult {
    let stream = match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::debug!(host, port, error = %e, "Connect failed");
            let (status, error) = classify_connect_error(&e);
            return PortProbeResult { port, status, error };
        }
        Err(_) => {
            tracing::debug!(host, port, "Connect timed out");
            return PortProbeResult {
                port,
                status: PortStatus::Timeout,
                error: Some("connection timed out".to_string()),
            };
        }
    };

    let mut stream = stream;
    match timeout(write_timeout, stream.write_all(&[0u8])).await {
        Ok(Ok(())) => tracing::trace!(host, port, "Connected and wrote probe byte"),
        Ok(Err(e)) => tracing::debug!(host, port, error = %e, "Connected but probe write failed"),
        Err(_) => tracing::debug!(host, port, "Connected but probe write timed out"),
    }

    PortProbeResult {
        port,
        status: PortStatus::Open,
        error: None,
    }
}

/// Bucket a connect error by kind, falling back to its text.
pub fn classify_connect_error(err: &io::Error) -> (PortStatus, Option<String>) {
    match err.kind() {
        io::ErrorKind::TimedOut => return (PortStatus::Timeout, Some("connection timed out".to_string())),
        io::ErrorKind::ConnectionRefused => return (PortStatus::Closed, None),
        _ => {}
    }
    classify_error_text(&err.to_string())
}

fn classify_error_text(message: &str) -> (PortStatus, Option<String>) {
    let lower = message.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        (PortStatus::Timeout, Some("connection timed out".to_string()))
    } else if lower.contains("refused") {
        (PortStatus::Closed, None)
    } else if lower.contains("unreachable") || lower.contains("no route") {
        (PortStatus::Error, Some("network unreachable".to_string()))
    } else {
        (PortStatus::Error, Some(message.to_string()))
    }
}

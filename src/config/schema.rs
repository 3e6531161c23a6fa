//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Fallback User-Agent sent when the relayed command never sets one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Relay (curl proxy) settings.
    pub relay: RelayConfig,

    /// Port scanner settings.
    pub scan: ScanConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Replace the port of the bind address, keeping the host part.
    pub fn set_port(&mut self, port: u16) {
        let host = match self.bind_address.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => self.bind_address.clone(),
        };
        self.bind_address = format!("{}:{}", host, port);
    }

    /// Apply command-line overrides. A port replaces the port of whichever
    /// address wins.
    pub fn apply_overrides(&mut self, bind: Option<&str>, port: Option<u16>) {
        if let Some(bind) = bind {
            self.bind_address = bind.to_string();
        }
        if let Some(port) = port {
            self.set_port(port);
        }
    }
}

/// Settings for relayed HTTP calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Total request timeout when the command has no `--connect-timeout`.
    pub default_timeout_secs: u64,

    /// TCP connect timeout for the outbound client.
    pub connect_timeout_secs: u64,

    /// How long idle pooled connections are kept.
    pub pool_idle_timeout_secs: u64,

    /// User-Agent used when the command does not provide one.
    pub user_agent: String,

    /// Max characters of the response body echoed to debug logs.
    pub log_preview_chars: usize,

    /// Max characters of the incoming command echoed to logs.
    pub log_command_chars: usize,

    /// Route relayed calls through `HTTP_PROXY`/`HTTPS_PROXY` when set.
    pub honor_proxy_env: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            connect_timeout_secs: 30,
            pool_idle_timeout_secs: 90,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_preview_chars: 200,
            log_command_chars: 100,
            honor_proxy_env: true,
        }
    }
}

/// Port scanner settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Per-probe connect timeout used when the request omits one.
    pub default_timeout_ms: u64,

    /// Worker count used when the request omits a batch size.
    pub default_batch_size: usize,

    /// Hard cap on concurrent probes for a single scan.
    pub max_concurrency: usize,

    /// Deadline for the best-effort write after a successful connect.
    pub write_timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 3000,
            default_batch_size: 100,
            max_concurrency: 1000,
            write_timeout_ms: 1000,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Overall inbound request timeout. Unset by default since a full
    /// port sweep can run for many minutes.
    pub request_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

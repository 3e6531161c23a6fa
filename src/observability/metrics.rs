//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relay calls by outcome
//! - `relay_duration_seconds` (histogram): parse + execute latency
//! - `scan_requests_total` (counter): completed scans
//! - `scan_ports_total` (counter): probed ports by status
//! - `scan_duration_seconds` (histogram): whole-scan latency
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_relay(outcome: &'static str, elapsed: Duration) {
    counter!("relay_requests_total", "outcome" => outcome).increment(1);
    histogram!("relay_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record a finished scan. `buckets` pairs each status name with its port count.
pub fn record_scan(buckets: &[(&'static str, usize)], elapsed: Duration) {
    counter!("scan_requests_total").increment(1);
    for (status, count) in buckets {
        counter!("scan_ports_total", "status" => *status).increment(*count as u64);
    }
    histogram!("scan_duration_seconds").record(elapsed.as_secs_f64());
}

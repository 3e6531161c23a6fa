//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! relay + scan handlers produce:
//!     → logging.rs (structured log events, request-id spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log stream
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```

pub mod logging;
pub mod metrics;

//! TCP port scanning subsystem.
//!
//! # Data Flow
//! ```text
//! {"host", "ports" | "scanAll", "timeout", "batchSize"}
//!     → handler.rs (validate, resolve defaults → ScanPlan)
//!     → ports.rs (spec → ordered port list)
//!     → scheduler.rs (bounded worker pool over a shared queue)
//!     → probe.rs (connect, classify)
//!     → scheduler.rs (aggregate into ScanReport)
//! ```

pub mod handler;
pub mod ports;
pub mod probe;
pub mod scheduler;

pub use handler::{ScanError, ScanRequest};
pub use ports::{all_ports, parse_ports, PortSpecError};
pub use probe::{PortProbeResult, PortStatus};
pub use scheduler::{ScanPlan, ScanReport, ScanScheduler};

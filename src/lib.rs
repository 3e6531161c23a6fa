//! HTTP relay and TCP port-scan service.
//!
//! Browser clients post a curl command line to `/cors-proxy` and get the
//! upstream response back inside a JSON envelope, sidestepping CORS. A
//! companion `/port-scan` endpoint probes TCP ports on a host concurrently.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod scan;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

//! HTTP service shell.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, tower layers)
//!     → cors.rs (preflight short-circuit, CORS headers on every response)
//!     → request.rs (request ID lookup for handlers)
//!     → relay / scan / status handlers
//! ```

pub mod cors;
pub mod request;
pub mod server;
pub mod status;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

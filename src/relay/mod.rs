//! Curl-command relay subsystem.
//!
//! # Data Flow
//! ```text
//! {"curlParam": "curl ..."}
//!     → command.rs (normalize, tokenize, extract → RequestDescriptor)
//!     → builder.rs (method/URL/header validation, fallback User-Agent)
//!     → client.rs (per-call client: TLS, proxy, timeout, redirects; send once)
//!     → outcome.rs (status, flattened headers, body, classified error)
//!     → handler.rs (200 envelope, always)
//! ```

pub mod builder;
pub mod client;
pub mod command;
pub mod error;
pub mod handler;
pub mod outcome;

pub use client::ExecutionClient;
pub use command::{parse_command, RequestDescriptor};
pub use error::RelayError;
pub use outcome::ExecutionOutcome;

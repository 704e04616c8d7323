//! Synchronous client core for the open-platform gateway.
//!
//! # Overview
//! Builds signed `HttpRequest` values and parses `HttpResponse` values
//! (host-does-IO pattern). Calls can be sent one at a time or packed into a
//! single batch request whose response is split back into per-call results.
//!
//! # Design
//! - `TopClient` holds only immutable configuration; `Parameters` are
//!   call-local, so one client can serve many threads.
//! - Signing, framing and classification are pure functions in `sign`,
//!   `batch` and `classify`; `client` composes them.
//! - `Transport` is the only place that touches the network.

pub mod batch;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod sign;
pub mod transport;
pub mod types;

pub use batch::{BatchResult, BATCH_SEPARATOR};
pub use client::TopClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse};
pub use params::{ParamValue, Parameters};
pub use transport::{Transport, UreqTransport};
pub use types::{ApiCall, ErrorResponse};

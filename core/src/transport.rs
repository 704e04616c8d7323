//! Executing `HttpRequest`s.
//!
//! # Design
//! `Transport` is the seam between the pure client and the network. Any
//! `Fn(HttpRequest) -> Result<HttpResponse, ApiError>` is a transport, which
//! keeps unit tests free of sockets. `UreqTransport` is the blocking
//! implementation; it applies the configured timeout to the whole call and
//! returns non-2xx statuses as data so the client decides what they mean.

use std::time::Duration;

use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<F> Transport for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, ApiError>,
{
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self(request)
    }
}

/// Blocking transport backed by a `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(url = %request.url, body_len = request.body.len(), "sending request");

        let mut builder = self.agent.post(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        debug!(status, body_len = bytes.len(), "received response");
        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

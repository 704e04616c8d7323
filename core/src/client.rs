//! Request builder and response parser for the gateway.
//!
//! # Design
//! `TopClient` holds only immutable configuration and carries no state
//! between calls. Each call is split into a `build_*` method that produces a
//! signed `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`; `call` and `call_batch` join the two through a
//! `Transport`. The `*_at` builders take the current time explicitly so
//! signatures can be reproduced in tests.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::batch::{self, BatchResult};
use crate::classify::parse_response_body;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, BATCH_CONTENT_TYPE, FORM_CONTENT_TYPE};
use crate::params::Parameters;
use crate::sign::{set_common_params, sign, METHOD_KEY};
use crate::transport::Transport;
use crate::types::ApiCall;

/// Client for the open-platform gateway.
#[derive(Debug, Clone)]
pub struct TopClient {
    config: ClientConfig,
    utc_offset: FixedOffset,
}

impl TopClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let utc_offset = config.utc_offset()?;
        Ok(Self { config, utc_offset })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_call(&self, call: ApiCall) -> Result<HttpRequest, ApiError> {
        self.build_call_at(call, Utc::now())
    }

    /// Build a signed single-call request using `now` for `timestamp`.
    pub fn build_call_at(&self, call: ApiCall, now: DateTime<Utc>) -> Result<HttpRequest, ApiError> {
        let ApiCall { method, mut params } = call;
        params.insert(METHOD_KEY, method.as_str());
        set_common_params(&mut params, &self.config, &self.utc_offset, now);
        sign(&mut params, &self.config.app_secret, "")?;
        let body = params.to_form_body()?;

        debug!(method = %method, params = params.len(), body_len = body.len(), "built call");
        Ok(HttpRequest::post(self.config.api_url.clone(), FORM_CONTENT_TYPE, body))
    }

    pub fn parse_call(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        parse_response_body(&response.body)
    }

    pub fn build_batch(&self, calls: Vec<ApiCall>) -> Result<HttpRequest, ApiError> {
        self.build_batch_at(calls, Utc::now())
    }

    /// Build a batch request. Each call becomes one form-encoded body; the
    /// envelope's common fields and signature (over the joined body) travel
    /// in the query string.
    ///
    /// Form encoding escapes `\r` and `\n`, so no inner body can contain the
    /// separator and the gateway always sees one chunk per call.
    pub fn build_batch_at(&self, calls: Vec<ApiCall>, now: DateTime<Utc>) -> Result<HttpRequest, ApiError> {
        if calls.is_empty() {
            return Err(ApiError::EmptyBatch);
        }

        let mut bodies = Vec::with_capacity(calls.len());
        for ApiCall { method, mut params } in calls {
            params.insert(METHOD_KEY, method);
            bodies.push(params.to_form_body()?);
        }
        let framed = batch::frame(&bodies);

        let mut envelope = Parameters::new();
        set_common_params(&mut envelope, &self.config, &self.utc_offset, now);
        sign(&mut envelope, &self.config.app_secret, &framed)?;

        let mut url = Url::parse(&self.config.batch_url)
            .map_err(|e| ApiError::Config(format!("batch_url is invalid: {e}")))?;
        url.set_query(Some(&envelope.to_form_body()?));

        debug!(calls = bodies.len(), body_len = framed.len(), "built batch");
        Ok(HttpRequest::post(url.into(), BATCH_CONTENT_TYPE, framed))
    }

    /// Split a batch response into one result per submitted call.
    pub fn parse_batch(&self, response: HttpResponse, expected: usize) -> Result<Vec<BatchResult>, ApiError> {
        check_status(&response)?;
        batch::deframe(&response.body, expected)
    }

    /// Build, execute and parse a single call.
    pub fn call<T: Transport + ?Sized>(&self, transport: &T, call: ApiCall) -> Result<Value, ApiError> {
        let request = self.build_call(call)?;
        self.parse_call(transport.execute(request)?)
    }

    /// Build, execute and parse a batch. Results are in submission order.
    pub fn call_batch<T: Transport + ?Sized>(
        &self,
        transport: &T,
        calls: Vec<ApiCall>,
    ) -> Result<Vec<BatchResult>, ApiError> {
        let expected = calls.len();
        let request = self.build_batch(calls)?;
        self.parse_batch(transport.execute(request)?, expected)
    }
}

/// Anything but 200 fails the call.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

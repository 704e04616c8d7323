//! Error types for the gateway client.
//!
//! # Design
//! One enum covers every way a call can fail. `InvalidParameter` is the
//! precondition failure raised before anything is signed; `HttpError` and
//! `Transport` abort the call; `Remote` carries the structured
//! `error_response` envelope the gateway reported. In a batch each slot holds
//! its own `Result`, so a `Remote` or `DeserializationError` in one slot does
//! not affect its siblings.

use thiserror::Error;

use crate::types::ErrorResponse;

/// Errors returned by `TopClient` and the signing/framing helpers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A parameter value is absent or cannot be rendered for signing.
    #[error("invalid parameter `{key}`: {reason}")]
    InvalidParameter { key: String, reason: String },

    /// The client configuration is unusable (empty credentials, bad URL).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A batch call was requested with no calls in it.
    #[error("batch contains no calls")]
    EmptyBatch,

    /// A value could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The transport could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The gateway answered with a non-200 status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body (or an `error_response` inside it) is not valid JSON
    /// of the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The gateway reported a business or protocol error.
    #[error(transparent)]
    Remote(#[from] ErrorResponse),
}

impl ApiError {
    pub(crate) fn invalid_parameter(key: &str, reason: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// The remote error envelope, if this error came from the gateway.
    pub fn remote(&self) -> Option<&ErrorResponse> {
        match self {
            ApiError::Remote(resp) => Some(resp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_renders_envelope() {
        let err = ApiError::from(ErrorResponse {
            code: 15,
            msg: "no permission".to_string(),
            sub_code: "x".to_string(),
            sub_msg: "y".to_string(),
        });
        assert_eq!(err.to_string(), "15: no permission, x: y");
        assert_eq!(err.remote().map(|r| r.code), Some(15));
    }

    #[test]
    fn http_error_carries_status_and_body() {
        let err = ApiError::HttpError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
        assert!(err.remote().is_none());
    }

    #[test]
    fn invalid_parameter_names_the_key() {
        let err = ApiError::invalid_parameter("num_iid", "value is absent");
        assert_eq!(err.to_string(), "invalid parameter `num_iid`: value is absent");
    }
}

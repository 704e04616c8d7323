//! Domain DTOs exchanged with the gateway.
//!
//! # Design
//! `ApiCall` is one logical request: a method name plus opaque parameters.
//! `ErrorResponse` mirrors the gateway's `error_response` envelope; absent
//! string fields decode as empty so a sparse envelope still classifies as an
//! error instead of a decode failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::{ParamValue, Parameters};

/// A single logical API request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: String,
    pub params: Parameters,
}

impl ApiCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Parameters::new(),
        }
    }

    pub fn with_params(method: impl Into<String>, params: Parameters) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Builder-style parameter insertion.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }
}

/// The gateway's error envelope, found under `error_response`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {msg}, {sub_code}: {sub_msg}")]
#[serde(default)]
pub struct ErrorResponse {
    pub code: i32,
    pub msg: String,
    pub sub_code: String,
    pub sub_msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_decodes_full_envelope() {
        let resp: ErrorResponse = serde_json::from_str(
            r#"{"code":15,"msg":"no permission","sub_code":"x","sub_msg":"y"}"#,
        )
        .unwrap();
        assert_eq!(resp.code, 15);
        assert_eq!(resp.to_string(), "15: no permission, x: y");
    }

    #[test]
    fn error_response_defaults_missing_fields() {
        let resp: ErrorResponse = serde_json::from_str(r#"{"code":7,"msg":"App Call Limited"}"#).unwrap();
        assert_eq!(resp.sub_code, "");
        assert_eq!(resp.to_string(), "7: App Call Limited, : ");
    }

    #[test]
    fn error_response_rejects_wrong_code_type() {
        let result: Result<ErrorResponse, _> = serde_json::from_str(r#"{"code":"fifteen"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn api_call_builder_collects_params() {
        let call = ApiCall::new("taobao.item.get").param("num_iid", 42i64).param("fields", "title");
        assert_eq!(call.method, "taobao.item.get");
        assert_eq!(call.params.len(), 2);
        assert_eq!(call.params.get("num_iid"), Some(&ParamValue::Integer(42)));
    }
}

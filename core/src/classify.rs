//! Success/error classification of decoded responses.

use serde_json::Value;

use crate::error::ApiError;
use crate::types::ErrorResponse;

pub const ERROR_RESPONSE_KEY: &str = "error_response";

/// `Ok(())` when `value` has no `error_response` field, otherwise the decoded
/// envelope as `ApiError::Remote`. A `null` envelope is still an error, with
/// every field zero-valued. An envelope that does not decode is a
/// `DeserializationError`.
pub fn classify(value: &Value) -> Result<(), ApiError> {
    let Some(envelope) = value.get(ERROR_RESPONSE_KEY) else {
        return Ok(());
    };
    if envelope.is_null() {
        return Err(ApiError::Remote(ErrorResponse::default()));
    }
    let resp: ErrorResponse = serde_json::from_value(envelope.clone())
        .map_err(|e| ApiError::DeserializationError(format!("invalid {ERROR_RESPONSE_KEY}: {e}")))?;
    Err(ApiError::Remote(resp))
}

/// Decode a single JSON response body and classify it.
pub fn parse_response_body(body: &str) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    classify(&value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_passes_through() {
        let value = json!({"foo": "bar"});
        assert!(classify(&value).is_ok());
        assert_eq!(parse_response_body(r#"{"foo":"bar"}"#).unwrap(), value);
    }

    #[test]
    fn error_envelope_is_classified() {
        let value = json!({"error_response": {"code": 15, "msg": "no permission", "sub_code": "x", "sub_msg": "y"}});
        let err = classify(&value).unwrap_err();
        assert_eq!(err.to_string(), "15: no permission, x: y");
        assert_eq!(err.remote().map(|r| r.sub_code.as_str()), Some("x"));
    }

    #[test]
    fn malformed_envelope_is_a_decode_error() {
        let value = json!({"error_response": "oops"});
        assert!(matches!(classify(&value), Err(ApiError::DeserializationError(_))));
    }

    #[test]
    fn null_envelope_is_a_zero_valued_remote_error() {
        let err = classify(&json!({"error_response": null})).unwrap_err();
        assert_eq!(err.remote(), Some(&ErrorResponse::default()));
        assert_eq!(err.to_string(), "0: , : ");
    }

    #[test]
    fn non_object_values_are_success() {
        assert!(classify(&json!([1, 2, 3])).is_ok());
        assert!(classify(&json!("error_response")).is_ok());
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = parse_response_body("<html>502</html>").unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}

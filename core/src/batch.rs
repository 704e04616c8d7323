//! Batch framing and deframing.
//!
//! # Design
//! A batch is N form-encoded request bodies joined by `BATCH_SEPARATOR`; the
//! response is N JSON documents joined the same way, chunk *i* answering
//! request *i*. Each chunk is decoded and classified on its own so one bad
//! slot does not hide the others.
//!
//! The separator is not escaped inside bodies. Escaping would break
//! compatibility with the gateway, so a body that contains it is sent as-is.

use serde_json::Value;
use tracing::warn;

use crate::classify::classify;
use crate::error::ApiError;

pub const BATCH_SEPARATOR: &str = "\r\n-S-\r\n";

/// Outcome of one slot of a batch call.
pub type BatchResult = Result<Value, ApiError>;

/// Join bodies with the separator between consecutive entries.
pub fn frame<S: AsRef<str>>(bodies: &[S]) -> String {
    let mut framed = String::new();
    for (i, body) in bodies.iter().enumerate() {
        if i > 0 {
            framed.push_str(BATCH_SEPARATOR);
        }
        framed.push_str(body.as_ref());
    }
    framed
}

/// Split a batch response into per-slot results.
///
/// When the gateway answers a batch with one common error instead of one
/// chunk per request, that error is returned as the call's failure. Any
/// other count mismatch is returned as-is.
pub fn deframe(body: &str, expected: usize) -> Result<Vec<BatchResult>, ApiError> {
    let mut results: Vec<BatchResult> = body.split(BATCH_SEPARATOR).map(decode_chunk).collect();

    if results.len() != expected {
        if results.len() == 1 && results[0].is_err() {
            if let Some(Err(err)) = results.pop() {
                return Err(err);
            }
        }
        warn!(expected, received = results.len(), "batch response chunk count mismatch");
    }
    Ok(results)
}

fn decode_chunk(chunk: &str) -> BatchResult {
    let value: Value = serde_json::from_str(chunk).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    classify(&value)?;
    Ok(value)
}

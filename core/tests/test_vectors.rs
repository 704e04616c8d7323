//! Verify signing, request building and batch parsing against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Signatures in the vectors were computed independently of this crate, so
//! a mismatch here means the canonical form drifted.

use chrono::DateTime;
use serde_json::Value;
use top_core::{sign, ApiCall, ApiError, ClientConfig, HttpResponse, Parameters, TopClient};

const API_URL: &str = "http://localhost:3000/router/rest";
const BATCH_URL: &str = "http://localhost:3000/router/batch";

/// Build `Parameters` from a JSON object in a vector.
fn params_from(value: &Value) -> Parameters {
    value
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn client_from(case: &Value) -> TopClient {
    let mut config = ClientConfig::new(case["app_key"].as_str().unwrap(), case["secret"].as_str().unwrap())
        .unwrap()
        .with_api_url(API_URL)
        .with_batch_url(BATCH_URL);
    if let Some(session) = case["session"].as_str() {
        config = config.with_session(session);
    }
    TopClient::new(config).unwrap()
}

// ---------------------------------------------------------------------------
// Sign
// ---------------------------------------------------------------------------

#[test]
fn sign_test_vectors() {
    let raw = include_str!("../../test-vectors/sign.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let params = params_from(&case["params"]);
        let secret = case["secret"].as_str().unwrap();
        let body = case["body"].as_str().unwrap();

        let result = sign::signature(&params, secret, body);
        if let Some(expected_error) = case.get("expected_error") {
            match expected_error.as_str().unwrap() {
                "InvalidParameter" => assert!(
                    matches!(result, Err(ApiError::InvalidParameter { .. })),
                    "{name}: expected InvalidParameter"
                ),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            assert_eq!(result.unwrap(), case["expected_sign"].as_str().unwrap(), "{name}: sign");
        }
    }
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn call_test_vectors() {
    let raw = include_str!("../../test-vectors/call.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let client = client_from(case);
        let now = DateTime::from_timestamp(case["now"].as_i64().unwrap(), 0).unwrap();
        let calls: Vec<ApiCall> = case["calls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| ApiCall::with_params(c["method"].as_str().unwrap(), params_from(&c["params"])))
            .collect();

        let req = if case["batch"].as_bool().unwrap_or(false) {
            client.build_batch_at(calls, now).unwrap()
        } else {
            let call = calls.into_iter().next().unwrap();
            client.build_call_at(call, now).unwrap()
        };

        let expected = &case["expected_request"];
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(
            req.header("content-type"),
            expected["content_type"].as_str(),
            "{name}: content type"
        );
        assert_eq!(req.body, expected["body"].as_str().unwrap(), "{name}: body");
    }
}

// ---------------------------------------------------------------------------
// Batch parse
// ---------------------------------------------------------------------------

fn assert_error_matches(name: &str, err: &ApiError, expected: &Value) {
    if let Some(rendered) = expected["remote"].as_str() {
        assert!(err.remote().is_some(), "{name}: expected remote error, got {err}");
        assert_eq!(err.to_string(), rendered, "{name}: rendered error");
    } else if let Some(status) = expected["http_status"].as_u64() {
        assert!(
            matches!(err, ApiError::HttpError { status: s, .. } if u64::from(*s) == status),
            "{name}: expected HTTP {status}, got {err}"
        );
    } else if expected["decode_error"].as_bool() == Some(true) {
        assert!(
            matches!(err, ApiError::DeserializationError(_)),
            "{name}: expected decode error, got {err}"
        );
    } else {
        panic!("{name}: unknown expected error {expected}");
    }
}

#[test]
fn batch_test_vectors() {
    let raw = include_str!("../../test-vectors/batch.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let client = TopClient::new(ClientConfig::new("key1", "sec1").unwrap()).unwrap();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };
        let expected_count = case["expected_count"].as_u64().unwrap() as usize;
        let result = client.parse_batch(response, expected_count);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_error_matches(name, &err, expected_error);
            continue;
        }

        let slots = result.unwrap();
        let expected_slots = case["expected_slots"].as_array().unwrap();
        assert_eq!(slots.len(), expected_slots.len(), "{name}: slot count");
        for (i, (slot, expected)) in slots.iter().zip(expected_slots).enumerate() {
            match (slot, expected.get("ok")) {
                (Ok(value), Some(ok)) => assert_eq!(value, ok, "{name}: slot {i}"),
                (Err(err), None) => assert_error_matches(name, err, expected),
                (Ok(value), None) => panic!("{name}: slot {i} should fail, got {value}"),
                (Err(err), Some(_)) => panic!("{name}: slot {i} should succeed, got {err}"),
            }
        }
    }
}

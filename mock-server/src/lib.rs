//! In-process emulation of the open-platform gateway.
//!
//! Verifies signatures the same way the real gateway does and answers a
//! handful of test methods:
//! - `test.echo` returns the caller's own parameters under `echo_response`
//! - `test.fail` returns an `error_response` (code 15, `isv.failure`)
//! - `test.malformed` (batch only) returns a chunk that is not JSON

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{RawQuery, State},
    routing::post,
    Json, Router,
};
use md5::{Digest, Md5};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tracing::{debug, warn};

pub const DEFAULT_APP_SECRET: &str = "mock-secret";
pub const SEPARATOR: &str = "\r\n-S-\r\n";

const COMMON_KEYS: [&str; 7] = ["app_key", "timestamp", "format", "v", "sign_method", "session", "sign"];

#[derive(Clone)]
struct Gateway {
    app_secret: Arc<str>,
}

pub fn app(app_secret: &str) -> Router {
    let state = Gateway {
        app_secret: Arc::from(app_secret),
    };
    Router::new()
        .route("/router/rest", post(rest_call))
        .route("/router/batch", post(batch_call))
        .with_state(state)
}

pub async fn run(listener: TcpListener, app_secret: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(app_secret)).await
}

/// Upper-case hex MD5 of `secret + sorted(k + v) + body + secret`, skipping `sign`.
pub fn expected_sign(params: &BTreeMap<String, String>, secret: &str, body: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret);
    for (key, value) in params.iter().filter(|(k, _)| k.as_str() != "sign") {
        hasher.update(key);
        hasher.update(value);
    }
    hasher.update(body);
    hasher.update(secret);
    hex::encode_upper(hasher.finalize())
}

pub fn error_response(code: i32, msg: &str, sub_code: &str, sub_msg: &str) -> Value {
    json!({
        "error_response": {
            "code": code,
            "msg": msg,
            "sub_code": sub_code,
            "sub_msg": sub_msg,
        }
    })
}

fn parse_form(raw: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
}

fn check_signature(params: &BTreeMap<String, String>, secret: &str, body: &str) -> Result<(), Value> {
    for key in ["app_key", "timestamp", "sign"] {
        if !params.contains_key(key) {
            return Err(error_response(
                40,
                "Missing required arguments",
                "isv.missing-parameter",
                &format!("missing {key}"),
            ));
        }
    }
    let expected = expected_sign(params, secret, body);
    if params.get("sign") != Some(&expected) {
        warn!(app_key = ?params.get("app_key"), "signature mismatch");
        return Err(error_response(25, "Invalid signature", "isv.invalid-signature", "sign does not match"));
    }
    Ok(())
}

fn dispatch(params: &BTreeMap<String, String>) -> Value {
    let method = params.get("method").map(String::as_str).unwrap_or_default();
    debug!(method, "dispatching");
    match method {
        "test.echo" => {
            let echoed: Map<String, Value> = params
                .iter()
                .filter(|(k, _)| !COMMON_KEYS.contains(&k.as_str()) && k.as_str() != "method")
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            json!({ "echo_response": echoed })
        }
        "test.fail" => {
            let reason = params.get("reason").map(String::as_str).unwrap_or("failed on request");
            error_response(15, "Remote service error", "isv.failure", reason)
        }
        "" => error_response(40, "Missing required arguments", "isv.missing-parameter", "missing method"),
        other => error_response(22, "Invalid method", "isv.invalid-method", other),
    }
}

async fn rest_call(State(gw): State<Gateway>, body: String) -> Json<Value> {
    let params = parse_form(&body);
    if let Err(err) = check_signature(&params, &gw.app_secret, "") {
        return Json(err);
    }
    Json(dispatch(&params))
}

async fn batch_call(State(gw): State<Gateway>, RawQuery(query): RawQuery, body: String) -> String {
    let envelope = parse_form(query.as_deref().unwrap_or_default());
    if let Err(err) = check_signature(&envelope, &gw.app_secret, &body) {
        return err.to_string();
    }
    let chunks: Vec<String> = body
        .split(SEPARATOR)
        .map(|raw| {
            let params = parse_form(raw);
            match params.get("method").map(String::as_str) {
                Some("test.malformed") => "<html>internal error</html>".to_string(),
                _ => dispatch(&params).to_string(),
            }
        })
        .collect();
    debug!(chunks = chunks.len(), "answered batch");
    chunks.join(SEPARATOR)
}

//! Request signing and common-field injection.
//!
//! The signature is the upper-case hex MD5 of
//! `secret + key1 + value1 + ... + keyN + valueN + body + secret`, keys in
//! byte order, `body` only when non-empty. Common fields are inserted into
//! the same map first, so they are covered by the signature like any other
//! parameter.

use chrono::{DateTime, FixedOffset, Utc};
use md5::{Digest, Md5};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::params::Parameters;

pub const SIGN_KEY: &str = "sign";
pub const METHOD_KEY: &str = "method";

/// Compute the signature and store it under `sign`.
///
/// On failure `params` is left untouched, including any earlier `sign`.
pub fn sign(params: &mut Parameters, secret: &str, body: &str) -> Result<(), ApiError> {
    let signature = signature(params, secret, body)?;
    params.insert(SIGN_KEY, signature);
    Ok(())
}

/// Signature over `params` without modifying them. An existing `sign` entry
/// is not part of the canonical form, so re-signing yields the same value.
pub fn signature(params: &Parameters, secret: &str, body: &str) -> Result<String, ApiError> {
    let pairs = params.canonical_pairs()?;

    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    for (key, value) in pairs.iter().filter(|(key, _)| *key != SIGN_KEY) {
        hasher.update(key.as_bytes());
        hasher.update(value.as_bytes());
    }
    if !body.is_empty() {
        hasher.update(body.as_bytes());
    }
    hasher.update(secret.as_bytes());

    Ok(hex::encode_upper(hasher.finalize()))
}

/// Insert `app_key`, `timestamp`, `format`, `v`, `sign_method` and, when one
/// is configured, `session`.
pub fn set_common_params(params: &mut Parameters, config: &ClientConfig, offset: &FixedOffset, now: DateTime<Utc>) {
    params.insert("app_key", config.app_key.as_str());
    params.insert("timestamp", now.with_timezone(offset).timestamp().to_string());
    params.insert("format", "json");
    params.insert("v", "2.0");
    params.insert("sign_method", "md5");
    if let Some(session) = config.session() {
        params.insert("session", session);
    }
}

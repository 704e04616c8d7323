//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The client
//! builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network; a `Transport` (or the caller) performs the actual
//! I/O. Signing and framing therefore stay pure and testable.

/// Content type of a single call's form body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";
/// Content type of a batch call's framed body.
pub const BATCH_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

/// An HTTP request described as plain data.
///
/// Built by `TopClient::build_*` methods. Every gateway request is a POST.
/// `url` is absolute and already carries any query string.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    pub(crate) fn post(url: String, content_type: &str, body: String) -> Self {
        Self {
            url,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport` after executing an `HttpRequest`, then passed
/// to `TopClient::parse_*` methods.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

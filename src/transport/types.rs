//! Request and response values exchanged with a transport.

use std::borrow::Cow;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

/// A request captured at enqueue time.
///
/// Nothing about it changes between enqueueing and execution.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Target URI, parsed by the transport
    pub uri: String,
    /// Final header set, after precedence rules were applied
    pub headers: HeaderMap,
    /// Encoded request body, if any
    pub body: Option<String>,
}

/// A completed HTTP response.
///
/// The body is read in full before the step completes, so the value can be
/// stored, cloned, and inspected after the chain has moved on.
#[derive(Debug, Clone)]
pub struct ChainResponse {
    /// Response status (any status, including 4xx/5xx)
    pub status: StatusCode,
    /// Final URL after redirects
    pub url: Url,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw response body
    pub body: Vec<u8>,
}

impl ChainResponse {
    /// Creates an empty response with the given status and URL.
    pub fn new(status: StatusCode, url: Url) -> Self {
        Self {
            status,
            url,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a header value as a string, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

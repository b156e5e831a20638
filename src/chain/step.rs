//! Deferred chain steps and the rules for building them.
//!
//! Everything a step needs is captured when it is enqueued: the URI, the
//! final header set, and the encoded body. Execution only dispatches it.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use crate::config::{ChainConfig, FORM_URLENCODED, HEADER_CONTENT_TYPE, HEADER_IDENTITY};
use crate::session::CookieOptions;
use crate::transport::TransportRequest;

/// One unit of deferred work in a chain.
#[derive(Debug, Clone)]
pub enum Step {
    /// Dispatch a request; store the response under `name` if given.
    Request {
        /// Fully built request
        request: TransportRequest,
        /// Result map key; `None` for anonymous steps
        name: Option<String>,
    },
    /// Insert a cookie into the chain's session.
    SetCookie {
        /// Raw cookie string, e.g. `sid=abc; Path=/`
        cookie: String,
        /// Host (or absolute URL) the cookie is scoped to
        hostname: String,
        /// Scheme and path used for scoping
        options: CookieOptions,
    },
}

impl Step {
    /// Name under which the step's response is stored, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Step::Request { name, .. } => name.as_deref(),
            Step::SetCookie { .. } => None,
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Caller headers. `content-type` (POST) and `user-agent` are overwritten.
    pub headers: HeaderMap,
}

impl RequestOptions {
    /// Adds a header, replacing any earlier value for the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Body of a POST step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormData {
    /// Key/value pairs, encoded in order.
    Pairs(Vec<(String, String)>),
    /// A body that is already form-url-encoded.
    Encoded(String),
}

impl FormData {
    /// Returns the `application/x-www-form-urlencoded` body.
    pub fn encode(&self) -> String {
        match self {
            FormData::Pairs(pairs) => url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish(),
            FormData::Encoded(body) => body.clone(),
        }
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        FormData::Pairs(pairs)
    }
}

impl<'a> From<Vec<(&'a str, &'a str)>> for FormData {
    fn from(pairs: Vec<(&'a str, &'a str)>) -> Self {
        FormData::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl<'a, const N: usize> From<[(&'a str, &'a str); N]> for FormData {
    fn from(pairs: [(&'a str, &'a str); N]) -> Self {
        FormData::from(pairs.to_vec())
    }
}

impl From<HashMap<String, String>> for FormData {
    fn from(map: HashMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = map.into_iter().collect();
        // HashMap order is random; sort for a stable body
        pairs.sort();
        FormData::Pairs(pairs)
    }
}

impl From<String> for FormData {
    fn from(body: String) -> Self {
        FormData::Encoded(body)
    }
}

impl From<&str> for FormData {
    fn from(body: &str) -> Self {
        FormData::Encoded(body.to_string())
    }
}

/// Treats an empty name as no name.
pub(crate) fn step_name(name: Option<&str>) -> Option<String> {
    name.filter(|n| !n.is_empty()).map(str::to_string)
}

/// Merges headers for a request step.
///
/// Order: config defaults, caller headers, then (for forms) content type,
/// then the identity header. Later assignments replace earlier ones.
pub(crate) fn merge_headers(
    config: &ChainConfig,
    options: &RequestOptions,
    form: bool,
) -> HeaderMap {
    let mut headers = config.default_headers.clone();
    for name in options.headers.keys() {
        headers.remove(name);
        for value in options.headers.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    if form {
        headers.insert(HEADER_CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
    }
    headers.insert(HEADER_IDENTITY, config.user_agent.clone());
    headers
}

pub(crate) fn get_step(
    config: &ChainConfig,
    uri: String,
    name: Option<&str>,
    options: &RequestOptions,
) -> Step {
    Step::Request {
        request: TransportRequest {
            method: Method::GET,
            uri,
            headers: merge_headers(config, options, false),
            body: None,
        },
        name: step_name(name),
    }
}

pub(crate) fn post_step(
    config: &ChainConfig,
    uri: String,
    data: &FormData,
    name: Option<&str>,
    options: &RequestOptions,
) -> Step {
    Step::Request {
        request: TransportRequest {
            method: Method::POST,
            uri,
            headers: merge_headers(config, options, true),
            body: Some(data.encode()),
        },
        name: step_name(name),
    }
}

//! Configuration constants.
//!
//! This module defines the constants used as defaults throughout the crate.

/// Default User-Agent string sent as the identity header on every request step.
///
/// Mimics a desktop Chrome browser. Callers override it through
/// [`ChainConfig::user_agent`](crate::config::ChainConfig); per-request options
/// can never override it.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Content type forced onto every POST step.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Scheme used when a cookie hostname is given without one.
pub const DEFAULT_COOKIE_SCHEME: &str = "http";

/// Path used when a cookie is scoped to a hostname without an explicit path.
pub const DEFAULT_COOKIE_PATH: &str = "/";

//! Configuration types.
//!
//! This module defines the structs and enums used to configure a chain, the
//! default transport, and logging.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::config::constants::DEFAULT_USER_AGENT;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, Default)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    #[default]
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// What a `set_cookie` step does when the cookie store rejects the cookie.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CookieRejection {
    /// Report success to the chain and keep going.
    #[default]
    Ignore,
    /// Abort the chain with [`ChainError::CookieRejected`](crate::ChainError).
    Fail,
}

/// Per-chain configuration.
///
/// Replaces closed-over constants: the identity header and any default headers
/// are passed in at construction.
///
/// # Examples
///
/// ```
/// use request_chain::{ChainConfig, CookieRejection};
/// use reqwest::header::HeaderValue;
///
/// let config = ChainConfig {
///     user_agent: HeaderValue::from_static("my-agent/1.0"),
///     cookie_rejection: CookieRejection::Fail,
///     ..Default::default()
/// };
/// assert_eq!(config.user_agent, "my-agent/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Identity (User-Agent) header value, forced onto every request step
    pub user_agent: HeaderValue,

    /// Headers applied before any per-request headers
    pub default_headers: HeaderMap,

    /// Behavior when the cookie store rejects a `set_cookie` step
    pub cookie_rejection: CookieRejection,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
            default_headers: HeaderMap::new(),
            cookie_rejection: CookieRejection::Ignore,
        }
    }
}

/// Configuration for the default `reqwest` transport.
///
/// Both deadlines are off by default: a hung request stalls the chain until
/// the peer gives up.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Whole-request timeout in seconds
    pub timeout_seconds: Option<u64>,

    /// TCP connect timeout in seconds
    pub connect_timeout_seconds: Option<u64>,
}

impl TransportConfig {
    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_seconds.map(Duration::from_secs)
    }
}

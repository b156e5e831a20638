//! Error type definitions.
//!
//! This module defines all error types used throughout the crate.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Categories of transport-level request failures.
///
/// Only failures that prevent a response from arriving are represented here.
/// An HTTP error status is a normal response, never a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum TransportErrorKind {
    /// The request could not be built
    Builder,
    /// Redirect policy violated (e.g. too many hops)
    Redirect,
    /// A configured deadline elapsed
    Timeout,
    /// Request-level failure other than connecting
    Request,
    /// TCP/TLS connection could not be established
    Connect,
    /// Reading or writing the body failed
    Body,
    /// The response body could not be decoded
    Decode,
    /// Anything else
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransportErrorKind {
    /// Human-readable description of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Builder => "HTTP request builder error",
            TransportErrorKind::Redirect => "HTTP request redirect error",
            TransportErrorKind::Timeout => "HTTP request timeout error",
            TransportErrorKind::Request => "HTTP request error",
            TransportErrorKind::Connect => "HTTP request connect error",
            TransportErrorKind::Body => "HTTP request body error",
            TransportErrorKind::Decode => "HTTP request decode error",
            TransportErrorKind::Other => "HTTP request other error",
        }
    }
}

/// A failure reported by a [`Transport`](crate::Transport).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The step's URI could not be parsed.
    #[error("Invalid request URI '{uri}': {source}")]
    InvalidUri {
        /// URI as enqueued
        uri: String,
        /// Underlying error
        #[source]
        source: url::ParseError,
    },

    /// The request was dispatched but no response arrived.
    #[error("{kind} for {uri}: {source}")]
    Http {
        /// Failure category
        kind: TransportErrorKind,
        /// URI as enqueued
        uri: String,
        /// Underlying error
        #[source]
        source: ReqwestError,
    },

    /// Failure raised by a custom transport.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns the failure category, if the error came from `reqwest`.
    pub fn kind(&self) -> Option<TransportErrorKind> {
        match self {
            TransportError::Http { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Error types for cookie store operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The hostname could not be turned into a URL to scope the cookie.
    #[error("Invalid cookie host '{host}': {source}")]
    InvalidHost {
        /// Hostname as given
        host: String,
        /// Underlying error
        #[source]
        source: url::ParseError,
    },

    /// The cookie store refused the cookie (parse failure, domain mismatch, ...).
    #[error("Cookie rejected for '{host}': {reason}")]
    Rejected {
        /// Hostname as given
        host: String,
        /// Cookie store's explanation
        reason: String,
    },

    /// The cookie store lock was poisoned by a panicking holder.
    #[error("Cookie store lock poisoned")]
    Poisoned,
}

/// The single error that stops a chain.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A request step failed at the transport level.
    #[error("Step {step} failed: {source}")]
    Transport {
        /// Zero-based index of the failing step
        step: usize,
        /// Name given to the failing step, if any
        name: Option<String>,
        /// Underlying error
        #[source]
        source: TransportError,
    },

    /// A `set_cookie` step was rejected and the chain is configured to fail on it.
    #[error("Step {step} could not set cookie for {hostname}: {source}")]
    CookieRejected {
        /// Zero-based index of the failing step
        step: usize,
        /// Hostname the cookie was meant for
        hostname: String,
        /// Underlying error
        #[source]
        source: SessionError,
    },

    /// `run` was called while the chain was still executing.
    #[error("Chain is already executing")]
    AlreadyExecuting,
}

impl ChainError {
    /// Returns the transport error exactly as the transport reported it.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            ChainError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns the name of the step that failed, if it was named.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            ChainError::Transport { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Returns the zero-based index of the step that failed.
    pub fn step(&self) -> Option<usize> {
        match self {
            ChainError::Transport { step, .. } | ChainError::CookieRejected { step, .. } => {
                Some(*step)
            }
            ChainError::AlreadyExecuting => None,
        }
    }
}

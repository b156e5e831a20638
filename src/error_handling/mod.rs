//! Error handling.
//!
//! This module provides:
//! - Error type definitions for chains, sessions, transports, and initialization
//! - Categorization of `reqwest` failures
//!
//! Only transport-level failures and (optionally) cookie rejections stop a
//! chain. HTTP error statuses are ordinary responses.

mod categorization;
mod types;

// Re-export public API
pub use categorization::categorize_reqwest_error;
pub use types::{
    ChainError, InitializationError, SessionError, TransportError, TransportErrorKind,
};

//! Chain configuration and constants.
//!
//! This module provides:
//! - Configuration constants (identity header, content types)
//! - HTTP header name constants
//! - Configuration types for chains, the transport, and logging

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{ChainConfig, CookieRejection, LogFormat, LogLevel, TransportConfig};

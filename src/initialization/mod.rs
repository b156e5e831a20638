//! Ambient setup.
//!
//! This module provides functions to initialize shared resources:
//! - The logger
//! - HTTP clients and the default transport

mod client;
mod logger;

// Re-export public API
pub use client::{init_session_client, init_transport};
pub use logger::init_logger_with;

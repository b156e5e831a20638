//! HTTP client initialization.
//!
//! This module provides functions to build `reqwest` clients bound to a
//! session's cookie store.

use std::sync::Arc;

use reqwest::ClientBuilder;

use crate::config::TransportConfig;
use crate::session::{Session, WeakSessionStore};
use crate::transport::ReqwestTransport;

/// Builds a `reqwest::Client` whose cookie provider is `session`'s store.
///
/// Creates a client configured with:
/// - The session's cookie store, held weakly (responses write to it, requests
///   read from it; the client does not keep it alive)
/// - Optional whole-request and connect timeouts from `config`
/// - reqwest's default redirect policy
/// - Rustls TLS backend (no native TLS)
///
/// No User-Agent is set on the client: the identity header travels on each
/// request.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_session_client(
    config: &TransportConfig,
    session: &Session,
) -> Result<reqwest::Client, reqwest::Error> {
    let provider = Arc::new(WeakSessionStore(session.downgrade()));
    let mut builder = ClientBuilder::new().cookie_provider(provider);
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout() {
        builder = builder.connect_timeout(connect_timeout);
    }
    builder.build()
}

/// Initializes the default transport, shareable across chains.
pub fn init_transport(config: &TransportConfig) -> Arc<ReqwestTransport> {
    Arc::new(ReqwestTransport::new(config.clone()))
}

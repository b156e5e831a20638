// Shared test helpers for chains running against a mock HTTP server.

use std::sync::Arc;

use request_chain::{ChainConfig, HeaderValue, RequestChain, ReqwestTransport, Session};

/// User-Agent used by integration tests (no commas, so header matchers compare it whole).
pub const TEST_USER_AGENT: &str = "request-chain-test/1.0";

/// Creates a chain over the real `reqwest` transport with the test identity header.
pub fn test_chain(session: Session) -> RequestChain {
    let config = ChainConfig {
        user_agent: HeaderValue::from_static(TEST_USER_AGENT),
        ..Default::default()
    };
    RequestChain::with_config(Arc::new(ReqwestTransport::default()), session, config)
}

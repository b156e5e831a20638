//! Transport capability.
//!
//! The chain never talks HTTP itself. Each request step hands a fully built
//! [`TransportRequest`] and the chain's [`Session`] to a [`Transport`], which
//! answers with a [`ChainResponse`] or a [`TransportError`].
//!
//! A transport must report an error only when no response arrived (connection
//! refused, DNS or TLS failure, ...). A 4xx/5xx status is a normal response.

mod http;
mod types;

use async_trait::async_trait;

use crate::error_handling::TransportError;
use crate::session::Session;

pub use http::ReqwestTransport;
pub use types::{ChainResponse, TransportRequest};

/// Performs one HTTP request against a shared session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request`, reading and storing cookies through `session`.
    async fn perform(
        &self,
        request: &TransportRequest,
        session: &Session,
    ) -> Result<ChainResponse, TransportError>;
}

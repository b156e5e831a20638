//! request_chain library: ordered HTTP request chains over a shared cookie session
//!
//! This library runs a sequence of dependent HTTP requests strictly one after
//! another. Every step shares one cookie [`Session`], so a login in step 1 is
//! visible to step 2. The first transport failure stops the chain; HTTP error
//! statuses do not. Named steps keep their responses for later inspection.
//!
//! # Example
//!
//! ```no_run
//! use request_chain::{FormData, RequestChain};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut chain = RequestChain::default();
//! chain
//!     .get("https://example.com/login", None)
//!     .post(
//!         "https://example.com/login",
//!         FormData::from([("user", "jane"), ("pass", "secret")]),
//!         Some("login"),
//!     )
//!     .get("https://example.com/account", Some("account"));
//!
//! chain
//!     .run_with(|err| match err {
//!         None => println!("chain finished"),
//!         Some(e) => eprintln!("chain stopped: {}", e),
//!     })
//!     .await?;
//!
//! let account = chain.response("account").expect("named step");
//! println!("account page: {} ({} bytes)", account.status, account.body.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

mod chain;
pub mod config;
mod error_handling;
pub mod initialization;
mod session;
mod transport;

// Re-export public API
pub use chain::{ChainStatus, FormData, RequestChain, RequestOptions, Responses, Step};
pub use config::{ChainConfig, CookieRejection, LogFormat, LogLevel, TransportConfig};
pub use error_handling::{
    categorize_reqwest_error, ChainError, InitializationError, SessionError, TransportError,
    TransportErrorKind,
};
pub use session::{CookieOptions, Session};
pub use transport::{ChainResponse, ReqwestTransport, Transport, TransportRequest};

pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest::{Method, StatusCode};

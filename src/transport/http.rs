//! `reqwest`-backed transport.

use std::sync::{Mutex, Weak};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest_cookie_store::CookieStoreMutex;
use url::Url;

use crate::config::TransportConfig;
use crate::error_handling::{categorize_reqwest_error, TransportError};
use crate::initialization::init_session_client;
use crate::session::Session;

use super::{ChainResponse, Transport, TransportRequest};

/// Default transport built on `reqwest`.
///
/// Each client uses the session's cookie store as its cookie provider, so
/// `Set-Cookie` headers on any response (redirect hops included) land in the
/// session. The most recent client is cached and reused for as long as the
/// same session keeps coming in. Neither the cache nor the client hold the
/// session strongly.
pub struct ReqwestTransport {
    config: TransportConfig,
    cached: Mutex<Option<(Weak<CookieStoreMutex>, reqwest::Client)>>,
}

impl ReqwestTransport {
    /// Creates a transport; clients are built lazily per session.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            cached: Mutex::new(None),
        }
    }

    fn client_for(&self, session: &Session) -> Result<reqwest::Client, reqwest::Error> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        let store = session.downgrade();
        if let Some((cached_store, client)) = cached.as_ref() {
            if Weak::ptr_eq(cached_store, &store) {
                return Ok(client.clone());
            }
        }

        log::debug!("Building HTTP client for new session");
        let client = init_session_client(&self.config, session)?;
        *cached = Some((store, client.clone()));
        Ok(client)
    }
}

/// Folds the session's cookies into a caller-supplied `Cookie` header.
///
/// reqwest only consults the cookie provider when no `Cookie` header is set,
/// so without this a caller cookie would hide every session cookie.
fn merge_cookie_header(headers: &HeaderMap, session: &Session, url: &Url) -> HeaderMap {
    let mut headers = headers.clone();
    if !headers.contains_key(COOKIE) {
        return headers;
    }

    let mut pairs: Vec<String> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();
    if let Some(stored) = session.cookie_header(url) {
        pairs.push(stored);
    }

    match HeaderValue::from_str(&pairs.join("; ")) {
        Ok(value) => {
            headers.insert(COOKIE, value);
        }
        Err(e) => log::debug!("Keeping caller Cookie header as-is: {}", e),
    }
    headers
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

fn http_error(uri: &str, source: reqwest::Error) -> TransportError {
    TransportError::Http {
        kind: categorize_reqwest_error(&source),
        uri: uri.to_string(),
        source,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn perform(
        &self,
        request: &TransportRequest,
        session: &Session,
    ) -> Result<ChainResponse, TransportError> {
        let url = Url::parse(&request.uri).map_err(|source| TransportError::InvalidUri {
            uri: request.uri.clone(),
            source,
        })?;
        let client = self
            .client_for(session)
            .map_err(|e| http_error(&request.uri, e))?;

        let headers = merge_cookie_header(&request.headers, session, &url);
        let mut builder = client.request(request.method.clone(), url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| http_error(&request.uri, e))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| http_error(&request.uri, e))?;

        log::trace!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.uri,
            status,
            body.len()
        );

        Ok(ChainResponse {
            status,
            url: final_url,
            headers,
            body: body.to_vec(),
        })
    }
}

//! Shared cookie session.
//!
//! A [`Session`] is a handle to one cookie store. Every step of a chain sees
//! the same store, so cookies set by one response are sent on the next
//! request. Handing a session to a new chain carries the cookie state over.

use std::fmt;
use std::sync::{Arc, Weak};

use reqwest::cookie::CookieStore as CookieProvider;
use reqwest::header::HeaderValue;
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use url::Url;

use crate::config::{DEFAULT_COOKIE_PATH, DEFAULT_COOKIE_SCHEME};
use crate::error_handling::SessionError;

/// Scope used when inserting a cookie by hostname.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    /// Scope the cookie to `https` instead of `http`
    pub secure: bool,
    /// Request path the cookie is set from (defaults to `/`)
    pub path: Option<String>,
}

/// A shared cookie store.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Clone)]
pub struct Session {
    store: Arc<CookieStoreMutex>,
}

impl Session {
    /// Creates a session with an empty cookie store.
    pub fn new() -> Self {
        Self::from_store(CookieStore::default())
    }

    /// Wraps an existing cookie store.
    pub fn from_store(store: CookieStore) -> Self {
        Self {
            store: Arc::new(CookieStoreMutex::new(store)),
        }
    }

    /// Returns the underlying store, as handed to the transport on each call.
    pub fn store(&self) -> Arc<CookieStoreMutex> {
        Arc::clone(&self.store)
    }

    /// Returns a handle that does not keep the store alive.
    pub(crate) fn downgrade(&self) -> Weak<CookieStoreMutex> {
        Arc::downgrade(&self.store)
    }

    /// Returns `true` if both handles point at the same store.
    pub fn ptr_eq(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    /// Inserts a raw `Set-Cookie` style string scoped to `hostname`.
    ///
    /// `hostname` may be a bare host (`example.com`) or an absolute URL.
    /// Parsing and validation are left to the cookie store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidHost` if no URL can be formed from
    /// `hostname`, and `SessionError::Rejected` if the store refuses the cookie.
    pub fn set_cookie(
        &self,
        cookie: &str,
        hostname: &str,
        options: &CookieOptions,
    ) -> Result<(), SessionError> {
        let url = cookie_url(hostname, options)?;
        let mut store = self.store.lock().map_err(|_| SessionError::Poisoned)?;
        store
            .parse(cookie, &url)
            .map(|_| ())
            .map_err(|e| SessionError::Rejected {
                host: hostname.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns the `(name, value)` pairs the store would send to `url`.
    pub fn cookies_for(&self, url: &Url) -> Vec<(String, String)> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store
            .get_request_values(url)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// Returns the `Cookie` header value for `url`, or `None` if nothing matches.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let pairs = self.cookies_for(url);
        if pairs.is_empty() {
            return None;
        }
        Some(
            pairs
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Number of unexpired cookies in the store.
    pub fn len(&self) -> usize {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store.iter_unexpired().count()
    }

    /// Returns `true` if the store holds no unexpired cookies.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Cookie values stay out of logs
        f.debug_struct("Session")
            .field("cookies", &self.len())
            .finish()
    }
}

/// Cookie provider that holds its session weakly.
///
/// Lets a cached client outlive the chains that used it without keeping their
/// cookie stores in memory. Once the session is gone it stores and sends nothing.
pub(crate) struct WeakSessionStore(pub(crate) Weak<CookieStoreMutex>);

impl CookieProvider for WeakSessionStore {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        if let Some(store) = self.0.upgrade() {
            store.set_cookies(cookie_headers, url);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.0.upgrade().and_then(|store| store.cookies(url))
    }
}

/// Builds the URL a cookie is scoped to.
fn cookie_url(hostname: &str, options: &CookieOptions) -> Result<Url, SessionError> {
    let raw = if hostname.contains("://") {
        hostname.to_string()
    } else {
        let scheme = if options.secure {
            "https"
        } else {
            DEFAULT_COOKIE_SCHEME
        };
        let path = options.path.as_deref().unwrap_or(DEFAULT_COOKIE_PATH);
        format!("{}://{}{}", scheme, hostname, path)
    };
    Url::parse(&raw).map_err(|source| SessionError::InvalidHost {
        host: hostname.to_string(),
        source,
    })
}

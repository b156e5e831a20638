//! Sequential request chain.
//!
//! A [`RequestChain`] collects steps without running them. [`RequestChain::run`]
//! then executes them one at a time in the order they were added, stopping at
//! the first transport failure. All steps share one [`Session`], so cookies
//! from step N are sent by step N+1.

mod responses;
mod status;
mod step;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::config::{ChainConfig, CookieRejection};
use crate::error_handling::ChainError;
use crate::session::{CookieOptions, Session};
use crate::transport::{ChainResponse, ReqwestTransport, Transport};

pub use responses::Responses;
pub use status::ChainStatus;
pub use step::{FormData, RequestOptions, Step};

/// Builder and runner for a chain of dependent HTTP requests.
///
/// Enqueue methods return `&mut Self` so steps can be chained fluently.
/// Nothing is sent until [`run`](Self::run) or [`run_with`](Self::run_with).
///
/// # Example
///
/// ```no_run
/// use request_chain::{RequestChain, FormData};
///
/// # async fn example() -> Result<(), request_chain::ChainError> {
/// let mut login = RequestChain::default();
/// login
///     .get("https://example.com/login", None)
///     .post(
///         "https://example.com/login",
///         FormData::from([("user", "jane"), ("pass", "secret")]),
///         Some("login"),
///     );
/// login.run().await?;
///
/// // Reuse the authenticated session in a second chain
/// let mut account = RequestChain::with_session(login.transport(), login.cookies());
/// account.get("https://example.com/account", Some("account"));
/// account.run().await?;
///
/// let page = account.responses().get("account").expect("named step stored");
/// println!("{}", page.status);
/// # Ok(())
/// # }
/// ```
pub struct RequestChain {
    transport: Arc<dyn Transport>,
    session: Session,
    config: ChainConfig,
    steps: Vec<Step>,
    responses: Responses,
    status: ChainStatus,
}

impl RequestChain {
    /// Creates a chain with a fresh, empty session.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_session(transport, Session::new())
    }

    /// Creates a chain that continues an existing session.
    pub fn with_session(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self::with_config(transport, session, ChainConfig::default())
    }

    /// Creates a chain with an explicit configuration.
    pub fn with_config(
        transport: Arc<dyn Transport>,
        session: Session,
        config: ChainConfig,
    ) -> Self {
        Self {
            transport,
            session,
            config,
            steps: Vec::new(),
            responses: Responses::default(),
            status: ChainStatus::default(),
        }
    }

    /// Appends a step as-is.
    pub fn enqueue(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Enqueues a GET request. A non-empty `name` stores the response.
    pub fn get(&mut self, uri: impl Into<String>, name: Option<&str>) -> &mut Self {
        self.get_with(uri, name, RequestOptions::default())
    }

    /// Enqueues a GET request with caller headers.
    pub fn get_with(
        &mut self,
        uri: impl Into<String>,
        name: Option<&str>,
        options: RequestOptions,
    ) -> &mut Self {
        let step = step::get_step(&self.config, uri.into(), name, &options);
        self.enqueue(step)
    }

    /// Enqueues a form-encoded POST request. A non-empty `name` stores the response.
    pub fn post(
        &mut self,
        uri: impl Into<String>,
        data: impl Into<FormData>,
        name: Option<&str>,
    ) -> &mut Self {
        self.post_with(uri, data, name, RequestOptions::default())
    }

    /// Enqueues a form-encoded POST request with caller headers.
    ///
    /// `content-type` is always `application/x-www-form-urlencoded` and the
    /// identity header always comes from the chain config, whatever `options` say.
    pub fn post_with(
        &mut self,
        uri: impl Into<String>,
        data: impl Into<FormData>,
        name: Option<&str>,
        options: RequestOptions,
    ) -> &mut Self {
        let step = step::post_step(&self.config, uri.into(), &data.into(), name, &options);
        self.enqueue(step)
    }

    /// Enqueues a cookie insertion into the session, scoped to `hostname`.
    pub fn set_cookie(
        &mut self,
        cookie: impl Into<String>,
        hostname: impl Into<String>,
    ) -> &mut Self {
        self.set_cookie_with(cookie, hostname, CookieOptions::default())
    }

    /// Enqueues a cookie insertion with explicit scheme and path.
    pub fn set_cookie_with(
        &mut self,
        cookie: impl Into<String>,
        hostname: impl Into<String>,
        options: CookieOptions,
    ) -> &mut Self {
        self.enqueue(Step::SetCookie {
            cookie: cookie.into(),
            hostname: hostname.into(),
            options,
        })
    }

    /// Runs every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the step that stopped the chain, or
    /// `ChainError::AlreadyExecuting` if a run is still in flight.
    pub async fn run(&self) -> Result<(), ChainError> {
        self.run_with(|_| {}).await
    }

    /// Runs the chain and calls `on_done` exactly once when it terminates.
    ///
    /// `on_done` receives the error that stopped the chain, or `None` on
    /// success. Status already reads complete when it is called. It is not
    /// called when the run is rejected with `ChainError::AlreadyExecuting`.
    pub async fn run_with<F>(&self, on_done: F) -> Result<(), ChainError>
    where
        F: FnOnce(Option<&ChainError>),
    {
        let guard = self.status.begin().ok_or(ChainError::AlreadyExecuting)?;
        log::debug!("Running chain of {} step(s)", self.steps.len());

        let outcome = self.execute().await;

        guard.finish();
        match &outcome {
            Ok(()) => log::debug!("Chain completed"),
            Err(e) => log::debug!("Chain stopped: {}", e),
        }
        on_done(outcome.as_ref().err());
        outcome
    }

    async fn execute(&self) -> Result<(), ChainError> {
        for (index, step) in self.steps.iter().enumerate() {
            self.execute_step(index, step).await?;
        }
        Ok(())
    }

    async fn execute_step(&self, index: usize, step: &Step) -> Result<(), ChainError> {
        match step {
            Step::Request { request, name } => {
                log::trace!("Step {}: {} {}", index, request.method, request.uri);
                let response = self
                    .transport
                    .perform(request, &self.session)
                    .await
                    .map_err(|source| ChainError::Transport {
                        step: index,
                        name: name.clone(),
                        source,
                    })?;
                if let Some(name) = name {
                    self.responses.insert(name.clone(), response);
                }
                Ok(())
            }
            Step::SetCookie {
                cookie,
                hostname,
                options,
            } => {
                log::trace!("Step {}: set cookie for {}", index, hostname);
                match self.session.set_cookie(cookie, hostname, options) {
                    Ok(()) => Ok(()),
                    Err(source) => match self.config.cookie_rejection {
                        CookieRejection::Ignore => {
                            log::debug!(
                                "Ignoring rejected cookie at step {}: {}",
                                index,
                                source
                            );
                            Ok(())
                        }
                        CookieRejection::Fail => {
                            Err(ChainError::CookieRejected {
                                step: index,
                                hostname: hostname.clone(),
                                source,
                            })
                        }
                    },
                }
            }
        }
    }

    /// Live view of named responses.
    pub fn responses(&self) -> Responses {
        self.responses.clone()
    }

    /// Shortcut for `responses().get(name)`.
    pub fn response(&self, name: &str) -> Option<ChainResponse> {
        self.responses.get(name)
    }

    /// Shared status handle, usable while the chain runs.
    pub fn status(&self) -> ChainStatus {
        self.status.clone()
    }

    /// See [`ChainStatus::is_executing`].
    pub fn is_executing(&self) -> bool {
        self.status.is_executing()
    }

    /// See [`ChainStatus::is_complete`].
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// The session shared by every step.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session handle for seeding another chain.
    pub fn cookies(&self) -> Session {
        self.session.clone()
    }

    /// Returns the transport so a follow-up chain can share it.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Configuration the chain was built with.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Enqueued steps, in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of enqueued steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if no steps have been enqueued.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for RequestChain {
    /// A chain over the default `reqwest` transport and a fresh session.
    fn default() -> Self {
        Self::new(Arc::new(ReqwestTransport::default()))
    }
}

impl std::fmt::Debug for RequestChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestChain")
            .field("steps", &self.steps.len())
            .field("session", &self.session)
            .field("executing", &self.status.is_executing())
            .field("complete", &self.status.is_complete())
            .finish()
    }
}

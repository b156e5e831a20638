use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use tokio::sync::Notify;
use url::Url;

use super::*;
use crate::config::FORM_URLENCODED;
use crate::error_handling::TransportError;
use crate::transport::TransportRequest;

/// What the scripted transport saw for one dispatched request.
#[derive(Debug, Clone)]
struct Dispatched {
    request: TransportRequest,
    cookie: Option<String>,
    executing: Option<bool>,
    complete: Option<bool>,
}

/// In-memory transport answering from a script.
///
/// - URIs listed in `failures` fail with a transport error
/// - URIs listed in `statuses` answer with that status (default 200)
/// - URIs ending in `/login` store `sid=<n>` in the session, like a Set-Cookie
/// - `delays` makes a URI take a while, to catch overlapping steps
#[derive(Default)]
struct ScriptedTransport {
    dispatched: Mutex<Vec<Dispatched>>,
    failures: HashMap<String, String>,
    statuses: HashMap<String, u16>,
    delays: HashMap<String, u64>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    probe: Mutex<Option<ChainStatus>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedTransport {
    fn failing(uri: &str, message: &str) -> Self {
        let mut transport = Self::default();
        transport
            .failures
            .insert(uri.to_string(), message.to_string());
        transport
    }

    fn watch(&self, status: ChainStatus) {
        *self.probe.lock().unwrap() = Some(status);
    }

    fn uris(&self) -> Vec<String> {
        self.dispatched
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.request.uri.clone())
            .collect()
    }

    fn dispatched(&self) -> Vec<Dispatched> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn perform(
        &self,
        request: &TransportRequest,
        session: &Session,
    ) -> Result<ChainResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let url = Url::parse(&request.uri).map_err(|source| TransportError::InvalidUri {
            uri: request.uri.clone(),
            source,
        })?;
        let probe = self.probe.lock().unwrap().clone();
        self.dispatched.lock().unwrap().push(Dispatched {
            request: request.clone(),
            cookie: session.cookie_header(&url),
            executing: probe.as_ref().map(|s| s.is_executing()),
            complete: probe.as_ref().map(|s| s.is_complete()),
        });

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(ms) = self.delays.get(&request.uri) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = self.failures.get(&request.uri) {
            return Err(TransportError::Other(message.clone()));
        }
        if request.uri.ends_with("/login") {
            let count = self.dispatched.lock().unwrap().len();
            session
                .set_cookie(&format!("sid={}", count), &request.uri, &CookieOptions::default())
                .map_err(|e| TransportError::Other(e.to_string()))?;
        }

        let status = self.statuses.get(&request.uri).copied().unwrap_or(200);
        let mut response = ChainResponse::new(StatusCode::from_u16(status).unwrap(), url);
        response.body = request.uri.as_bytes().to_vec();
        Ok(response)
    }
}

fn chain_over(transport: &Arc<ScriptedTransport>) -> RequestChain {
    RequestChain::new(transport.clone())
}

#[tokio::test]
async fn test_steps_run_in_enqueue_order() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/1", None)
        .post("http://example.com/2", "a=1", None)
        .get("http://example.com/3", None);

    let calls = AtomicUsize::new(0);
    let result = chain
        .run_with(|err| {
            assert!(err.is_none());
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        transport.uris(),
        vec![
            "http://example.com/1",
            "http://example.com/2",
            "http://example.com/3"
        ]
    );
}

#[tokio::test]
async fn test_steps_never_overlap() {
    let mut transport = ScriptedTransport::default();
    // Early steps are slowest, so any concurrency would show up as overlap
    transport.delays.insert("http://example.com/1".to_string(), 30);
    transport.delays.insert("http://example.com/2".to_string(), 20);
    transport.delays.insert("http://example.com/3".to_string(), 10);
    let transport = Arc::new(transport);

    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/1", None)
        .get("http://example.com/2", None)
        .get("http://example.com/3", None)
        .get("http://example.com/4", None);
    chain.run().await.unwrap();

    assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(transport.uris().len(), 4);
    assert_eq!(transport.uris()[3], "http://example.com/4");
}

#[tokio::test]
async fn test_failure_skips_remaining_steps() {
    let transport = Arc::new(ScriptedTransport::failing(
        "http://example.com/2",
        "connection refused",
    ));
    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/1", Some("first"))
        .get("http://example.com/2", Some("second"))
        .get("http://example.com/3", Some("third"));

    let mut seen = Vec::new();
    let result = chain
        .run_with(|err| seen.push(err.map(|e| e.to_string())))
        .await;

    assert_eq!(seen, vec![Some("Step 1 failed: connection refused".to_string())]);
    let error = result.unwrap_err();
    assert_eq!(error.step(), Some(1));
    assert_eq!(error.step_name(), Some("second"));
    assert!(matches!(
        error.transport_error(),
        Some(TransportError::Other(msg)) if msg == "connection refused"
    ));
    assert_eq!(
        transport.uris(),
        vec!["http://example.com/1", "http://example.com/2"]
    );
    assert!(chain.responses().contains("first"));
    assert!(!chain.responses().contains("second"));
    assert!(!chain.responses().contains("third"));
}

#[tokio::test]
async fn test_first_step_failure_runs_nothing_else() {
    let transport = Arc::new(ScriptedTransport::failing("http://example.com/1", "dns"));
    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/1", None)
        .set_cookie("a=1", "example.com")
        .get("http://example.com/2", None);

    assert!(chain.run().await.is_err());
    assert_eq!(transport.uris(), vec!["http://example.com/1"]);
    assert!(chain.session().is_empty());
}

#[tokio::test]
async fn test_named_results_are_distinct() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/a", Some("a"))
        .get("http://example.com/b", Some("b"))
        .get("http://example.com/anonymous", None)
        .get("http://example.com/empty", Some(""));
    chain.run().await.unwrap();

    let responses = chain.responses();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses.get("a").unwrap().text(), "http://example.com/a");
    assert_eq!(responses.get("b").unwrap().text(), "http://example.com/b");
}

#[tokio::test]
async fn test_http_error_status_is_not_a_chain_failure() {
    let mut transport = ScriptedTransport::default();
    transport
        .statuses
        .insert("http://example.com/missing".to_string(), 404);
    transport
        .statuses
        .insert("http://example.com/broken".to_string(), 500);
    let transport = Arc::new(transport);

    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/missing", Some("missing"))
        .get("http://example.com/broken", Some("broken"))
        .get("http://example.com/after", Some("after"));

    chain.run().await.unwrap();
    assert_eq!(chain.response("missing").unwrap().status.as_u16(), 404);
    assert_eq!(chain.response("broken").unwrap().status.as_u16(), 500);
    assert!(chain.response("after").unwrap().is_success());
}

#[tokio::test]
async fn test_post_header_precedence_reaches_transport() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    let options = RequestOptions::default()
        .with_header(HeaderName::from_static("x-foo"), HeaderValue::from_static("1"))
        .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .with_header(USER_AGENT, HeaderValue::from_static("override-attempt"));
    chain.post_with(
        "http://example.com/form",
        [("k", "v w")],
        Some("form"),
        options,
    );
    chain.run().await.unwrap();

    let sent = &transport.dispatched()[0].request;
    assert_eq!(sent.headers.get("x-foo").unwrap(), "1");
    assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), FORM_URLENCODED);
    assert_eq!(
        sent.headers.get(USER_AGENT).unwrap(),
        &chain.config().user_agent
    );
    assert_eq!(sent.body.as_deref(), Some("k=v+w"));
}

#[tokio::test]
async fn test_custom_identity_header() {
    let transport = Arc::new(ScriptedTransport::default());
    let config = ChainConfig {
        user_agent: HeaderValue::from_static("chain-test/1.0"),
        ..Default::default()
    };
    let mut chain = RequestChain::with_config(transport.clone(), Session::new(), config);
    chain.get("http://example.com/", None);
    chain.run().await.unwrap();

    assert_eq!(
        transport.dispatched()[0].request.headers.get(USER_AGENT).unwrap(),
        "chain-test/1.0"
    );
}

#[tokio::test]
async fn test_request_captured_at_enqueue_time() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    let mut options = RequestOptions::default();
    options.headers.insert(
        HeaderName::from_static("x-step"),
        HeaderValue::from_static("original"),
    );
    chain.get_with("http://example.com/", None, options.clone());

    // Mutating the caller's copy afterwards must not leak into the step
    options.headers.insert(
        HeaderName::from_static("x-step"),
        HeaderValue::from_static("changed"),
    );
    chain.run().await.unwrap();

    assert_eq!(
        transport.dispatched()[0].request.headers.get("x-step").unwrap(),
        "original"
    );
}

#[tokio::test]
async fn test_session_cookie_reaches_next_step() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/login", None)
        .get("http://example.com/account", None);
    chain.run().await.unwrap();

    let dispatched = transport.dispatched();
    assert_eq!(dispatched[0].cookie, None);
    assert_eq!(dispatched[1].cookie.as_deref(), Some("sid=1"));
}

#[tokio::test]
async fn test_set_cookie_step_visible_to_later_steps() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/before", None)
        .set_cookie("theme=dark", "example.com")
        .get("http://example.com/after", None);
    chain.run().await.unwrap();

    let dispatched = transport.dispatched();
    assert_eq!(dispatched[0].cookie, None);
    assert_eq!(dispatched[1].cookie.as_deref(), Some("theme=dark"));
}

#[tokio::test]
async fn test_rejected_cookie_ignored_by_default() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    chain
        .set_cookie("sid=x; Domain=other.org", "example.com")
        .get("http://example.com/", None);

    assert!(chain.run().await.is_ok());
    assert_eq!(transport.uris().len(), 1);
    assert!(chain.session().is_empty());
}

#[tokio::test]
async fn test_rejected_cookie_can_fail_the_chain() {
    let transport = Arc::new(ScriptedTransport::default());
    let config = ChainConfig {
        cookie_rejection: CookieRejection::Fail,
        ..Default::default()
    };
    let mut chain = RequestChain::with_config(transport.clone(), Session::new(), config);
    chain
        .get("http://example.com/", None)
        .set_cookie("sid=x; Domain=other.org", "example.com")
        .get("http://example.com/never", None);

    let error = chain.run().await.unwrap_err();
    match &error {
        ChainError::CookieRejected { step, hostname, .. } => {
            assert_eq!(*step, 1);
            assert_eq!(hostname, "example.com");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.to_string().contains("example.com"));
    assert_eq!(transport.uris(), vec!["http://example.com/"]);
    assert!(chain.is_complete());
}

#[tokio::test]
async fn test_status_transitions() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    transport.watch(chain.status());
    chain
        .get("http://example.com/1", None)
        .get("http://example.com/2", None);

    assert!(!chain.is_executing());
    assert!(!chain.is_complete());

    let status = chain.status();
    chain
        .run_with(|_| {
            assert!(!status.is_executing());
            assert!(status.is_complete());
        })
        .await
        .unwrap();

    for dispatched in transport.dispatched() {
        assert_eq!(dispatched.executing, Some(true));
        assert_eq!(dispatched.complete, Some(false));
    }
    assert!(!chain.is_executing());
    assert!(chain.is_complete());
}

#[tokio::test]
async fn test_complete_resets_on_next_run() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    chain.get("http://example.com/", None);
    chain.run().await.unwrap();
    assert!(chain.is_complete());

    transport.watch(chain.status());
    chain.run().await.unwrap();

    let second_run = &transport.dispatched()[1];
    assert_eq!(second_run.complete, Some(false));
    assert!(chain.is_complete());
}

#[tokio::test]
async fn test_empty_chain_completes_once() {
    let transport = Arc::new(ScriptedTransport::default());
    let chain = chain_over(&transport);
    assert!(chain.is_empty());

    let calls = AtomicUsize::new(0);
    let result = chain
        .run_with(|err| {
            assert!(err.is_none());
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(chain.is_complete());
    assert!(transport.uris().is_empty());
}

#[tokio::test]
async fn test_rerun_replays_steps_and_accumulates_results() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    chain.get("http://example.com/a", Some("a"));
    chain.run().await.unwrap();

    chain.get("http://example.com/b", Some("b"));
    chain.run().await.unwrap();

    assert_eq!(
        transport.uris(),
        vec![
            "http://example.com/a",
            "http://example.com/a",
            "http://example.com/b"
        ]
    );
    let mut names = chain.responses().names();
    names.sort();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_run_rejected_while_executing() {
    let gate = Arc::new(Notify::new());
    let transport = Arc::new(ScriptedTransport {
        gate: Some(gate.clone()),
        ..Default::default()
    });
    let mut chain = chain_over(&transport);
    chain.get("http://example.com/slow", None);
    let chain = Arc::new(chain);

    let running = {
        let chain = Arc::clone(&chain);
        tokio::spawn(async move { chain.run().await })
    };
    while transport.uris().is_empty() {
        tokio::task::yield_now().await;
    }
    assert!(chain.is_executing());

    let mut handler_fired = false;
    let second = chain.run_with(|_| handler_fired = true).await;
    assert!(matches!(second, Err(ChainError::AlreadyExecuting)));
    assert!(!handler_fired);
    assert!(chain.is_executing());

    gate.notify_one();
    running.await.unwrap().unwrap();
    assert!(!chain.is_executing());
    assert!(chain.is_complete());
    assert_eq!(transport.uris().len(), 1);
}

#[tokio::test]
async fn test_responses_visible_mid_chain() {
    let gate = Arc::new(Notify::new());
    let transport = Arc::new(ScriptedTransport {
        gate: Some(gate.clone()),
        ..Default::default()
    });
    let mut chain = chain_over(&transport);
    chain
        .get("http://example.com/first", Some("first"))
        .get("http://example.com/second", Some("second"));
    let responses = chain.responses();
    let chain = Arc::new(chain);

    let running = {
        let chain = Arc::clone(&chain);
        tokio::spawn(async move { chain.run().await })
    };

    gate.notify_one();
    while transport.uris().len() < 2 {
        tokio::task::yield_now().await;
    }
    // Second step is parked on the gate; the first result is already stored
    assert!(responses.contains("first"));
    assert!(!responses.contains("second"));

    gate.notify_one();
    running.await.unwrap().unwrap();
    assert!(responses.contains("second"));
}

#[tokio::test]
async fn test_session_hand_off() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut login = chain_over(&transport);
    login.get("http://example.com/login", None);
    login.run().await.unwrap();

    let follow_up = RequestChain::with_session(login.transport(), login.cookies());
    assert!(follow_up.session().ptr_eq(login.session()));
    assert_eq!(
        follow_up
            .session()
            .cookie_header(&Url::parse("http://example.com/").unwrap())
            .as_deref(),
        Some("sid=1")
    );
    // No request was needed to carry the cookie over
    assert_eq!(transport.uris().len(), 1);
}

#[tokio::test]
async fn test_long_chain_does_not_grow_the_stack() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    for i in 0..5_000 {
        chain.get(format!("http://example.com/{}", i), None);
    }
    assert_eq!(chain.len(), 5_000);

    chain.run().await.unwrap();
    assert_eq!(transport.uris().len(), 5_000);
}

#[test]
fn test_enqueue_returns_self_for_chaining() {
    let transport = Arc::new(ScriptedTransport::default());
    let mut chain = chain_over(&transport);
    let len = chain
        .get("http://example.com/", Some("home"))
        .set_cookie_with(
            "a=1",
            "example.com",
            CookieOptions {
                secure: true,
                path: Some("/app".to_string()),
            },
        )
        .enqueue(Step::SetCookie {
            cookie: "b=2".to_string(),
            hostname: "example.com".to_string(),
            options: CookieOptions::default(),
        })
        .len();

    assert_eq!(len, 3);
    assert_eq!(chain.steps()[0].name(), Some("home"));
    assert_eq!(chain.steps()[1].name(), None);
}

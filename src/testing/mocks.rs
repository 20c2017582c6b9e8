//! Mock implementations for testing
//!
//! Provides instrumented `Agent`, `Router`, and `HttpClient` implementations
//! that record how often (and in which order) they were called.

use crate::agent::{Agent, AgentRegistry};
use crate::error::RouterError;
use crate::http::{HttpClient, HttpError};
use crate::protocol::{Description, Request, Response};
use crate::routing::Router;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Shared, ordered record of calls made against mocks
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.into());
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(Response),
    Echo,
    Delay(Duration, Response),
    Panic(String),
}

/// Mock agent with a fixed behavior, counting started and finished calls
#[derive(Debug)]
pub struct MockAgent {
    name: String,
    description: Option<Description>,
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    completions: Arc<AtomicUsize>,
}

impl MockAgent {
    fn with_behavior(name: impl Into<String>, behavior: MockBehavior) -> Self {
        let name = name.into();
        Self {
            description: Some(Description::new(
                name.clone(),
                format!("Mock agent {name}"),
                format!("ask {name} something"),
            )),
            name,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            completions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answers with `text`
    pub fn answering(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_behavior(name, MockBehavior::Respond(Response::answered(text)))
    }

    /// Always returns `response` verbatim
    pub fn responding(name: impl Into<String>, response: Response) -> Self {
        Self::with_behavior(name, MockBehavior::Respond(response))
    }

    /// Answers with the request text
    pub fn echoing(name: impl Into<String>) -> Self {
        Self::with_behavior(name, MockBehavior::Echo)
    }

    /// Sleeps for `delay` before answering with `text`
    pub fn slow(name: impl Into<String>, delay: Duration, text: impl Into<String>) -> Self {
        Self::with_behavior(name, MockBehavior::Delay(delay, Response::answered(text)))
    }

    /// Panics with `message` when invoked
    pub fn panicking(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_behavior(name, MockBehavior::Panic(message.into()))
    }

    /// Drop the description so the agent is hidden from listings
    pub fn without_description(mut self) -> Self {
        self.description = None;
        self
    }

    /// Counter handle that survives moving the agent into a registry
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Counts `process` calls that ran to the end
    pub fn completion_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.completions)
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<Description> {
        self.description.clone()
    }

    async fn process(&self, request: &Request) -> Response {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let response = match &self.behavior {
            MockBehavior::Respond(response) => response.clone(),
            MockBehavior::Echo => Response::answered(request.text()),
            MockBehavior::Delay(delay, response) => {
                tokio::time::sleep(*delay).await;
                response.clone()
            }
            MockBehavior::Panic(message) => panic!("{}", message),
        };

        self.completions.fetch_add(1, Ordering::SeqCst);
        response
    }
}

/// Counters observed from a [`MockRouter`] after it has been moved into a chain
#[derive(Debug, Clone)]
pub struct RouterProbe {
    init_calls: Arc<AtomicUsize>,
    get_calls: Arc<AtomicUsize>,
}

impl RouterProbe {
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

/// Router that proposes a fixed list of agent names
#[derive(Debug)]
pub struct MockRouter {
    label: String,
    proposals: Vec<String>,
    registry: Option<Arc<AgentRegistry>>,
    fail_initialize: bool,
    init_calls: Arc<AtomicUsize>,
    get_calls: Arc<AtomicUsize>,
    log: CallLog,
}

impl MockRouter {
    /// Router that proposes `proposals` (resolved through the registry)
    pub fn proposing<S: Into<String>>(label: impl Into<String>, proposals: Vec<S>) -> Self {
        Self {
            label: label.into(),
            proposals: proposals.into_iter().map(Into::into).collect(),
            registry: None,
            fail_initialize: false,
            init_calls: Arc::new(AtomicUsize::new(0)),
            get_calls: Arc::new(AtomicUsize::new(0)),
            log: CallLog::new(),
        }
    }

    /// Router that never proposes anything
    pub fn empty(label: impl Into<String>) -> Self {
        Self::proposing::<String>(label, Vec::new())
    }

    /// Record `init:<label>` and `get:<label>` events into a shared log
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Make `initialize` fail with `UnknownAgent`
    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn probe(&self) -> RouterProbe {
        RouterProbe {
            init_calls: Arc::clone(&self.init_calls),
            get_calls: Arc::clone(&self.get_calls),
        }
    }
}

impl Router for MockRouter {
    fn initialize(&mut self, registry: Arc<AgentRegistry>) -> Result<(), RouterError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.log.record(format!("init:{}", self.label));

        if self.fail_initialize {
            return Err(RouterError::unknown_agent("MockRouter", "missing"));
        }

        self.registry = Some(registry);
        Ok(())
    }

    fn get_agents(&self, _request: &Request) -> Result<Vec<Arc<dyn Agent>>, RouterError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.log.record(format!("get:{}", self.label));

        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| RouterError::not_initialized("MockRouter"))?;

        self.proposals
            .iter()
            .map(|name| {
                registry
                    .lookup(name)
                    .ok_or_else(|| RouterError::unknown_agent("MockRouter", name.clone()))
            })
            .collect()
    }
}

/// HTTP client returning a canned body (or error) for every request
#[derive(Debug, Default)]
pub struct MockHttpClient {
    body: Option<String>,
    requested: Mutex<Vec<Url>>,
}

impl MockHttpClient {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// URLs requested so far
    pub fn requested(&self) -> Vec<Url> {
        self.requested
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &Url) -> Result<String, HttpError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.clone());
        }

        self.body.clone().ok_or_else(|| HttpError::RequestFailed {
            url: url.to_string(),
            message: "mock connection refused".to_string(),
        })
    }
}

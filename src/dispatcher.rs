//! Request dispatch
//!
//! The [`Dispatcher`] turns a [`Request`] into exactly one [`Response`]:
//!
//! 1. no router wired: the fixed "not configured" response
//! 2. router error: the "unavailable" response, logged at `error`
//! 3. no candidates: the fixed "unhandled" response
//! 4. otherwise the first candidate's response, verbatim
//!
//! Each agent call runs on its own task under the configured timeout, so a
//! hung or panicking agent produces a `Failed` response instead of stalling
//! or unwinding into the caller. Trying later candidates is opt-in through
//! [`DispatchSettings::escalate`].

use crate::agent::{Agent, AgentRegistry};
use crate::config::DispatchSection;
use crate::error::{sanitize_error_message, RouterError};
use crate::observability::metrics::MetricsCollector;
use crate::protocol::{Description, Request, Response, ResponseStatus};
use crate::routing::Router;
use crate::{agent_span, dispatch_span, route_span};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

/// Default per-agent timeout
pub const DEFAULT_AGENT_TIMEOUT_MS: u64 = 5000;

/// Runtime knobs for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Upper bound on a single `Agent::process` call
    pub agent_timeout: Duration,
    /// Fall through to the next candidate when one does not answer
    pub escalate: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_millis(DEFAULT_AGENT_TIMEOUT_MS),
            escalate: false,
        }
    }
}

impl DispatchSettings {
    pub fn with_timeout(mut self, agent_timeout: Duration) -> Self {
        self.agent_timeout = agent_timeout;
        self
    }

    pub fn with_escalation(mut self, escalate: bool) -> Self {
        self.escalate = escalate;
        self
    }
}

impl From<&DispatchSection> for DispatchSettings {
    fn from(section: &DispatchSection) -> Self {
        Self {
            agent_timeout: Duration::from_millis(section.timeout_ms),
            escalate: section.escalate,
        }
    }
}

/// Owns the registry and router and answers requests
pub struct Dispatcher {
    registry: Arc<AgentRegistry>,
    router: Option<Box<dyn Router>>,
    settings: DispatchSettings,
    metrics: Arc<MetricsCollector>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("configured", &self.router.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Dispatcher {
    /// Initialize `router` against `registry` and wire both in
    ///
    /// Initialization errors are returned so startup can halt.
    pub fn new(
        registry: Arc<AgentRegistry>,
        mut router: Box<dyn Router>,
        settings: DispatchSettings,
    ) -> Result<Self, RouterError> {
        router.initialize(Arc::clone(&registry))?;

        info!(
            agents = registry.len(),
            timeout_ms = settings.agent_timeout.as_millis() as u64,
            escalate = settings.escalate,
            "Dispatcher ready"
        );

        Ok(Self {
            registry,
            router: Some(router),
            settings,
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Dispatcher with no router; every request gets the "not configured" response
    pub fn unconfigured(registry: Arc<AgentRegistry>, settings: DispatchSettings) -> Self {
        warn!("Dispatcher started without a router; requests will not be answered");
        Self {
            registry,
            router: None,
            settings,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.router.is_some()
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> DispatchSettings {
        self.settings
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Dispatch raw text
    pub async fn dispatch_text(&self, text: impl Into<String>) -> Response {
        self.dispatch(&Request::new(text)).await
    }

    /// Answer `request`; never fails
    pub async fn dispatch(&self, request: &Request) -> Response {
        let span = dispatch_span!(request_id = %request.id());
        async {
            let started = Instant::now();
            let _in_flight = self.metrics.request_received();

            let response = self.route_and_invoke(request).await;

            self.metrics
                .request_completed(response.status(), started.elapsed());
            info!(
                status = %response.status(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Request dispatched"
            );
            response
        }
        .instrument(span)
        .await
    }

    async fn route_and_invoke(&self, request: &Request) -> Response {
        let Some(router) = self.router.as_ref() else {
            warn!("Request received but no router is configured");
            return Response::unavailable();
        };

        let candidates = match route_span!(request_id = %request.id())
            .in_scope(|| router.get_agents(request))
        {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(error = %e, "Router failed to select agents");
                return Response::unavailable();
            }
        };

        let Some((first, rest)) = candidates.split_first() else {
            debug!("No agent accepted the request");
            return Response::unhandled();
        };

        debug!(
            candidates = candidates.len(),
            first = first.name(),
            "Agents selected"
        );

        let mut response = self.invoke(Arc::clone(first), request).await;

        if self.settings.escalate {
            for next in rest {
                if !should_escalate(response.status()) {
                    break;
                }
                self.metrics.escalated();
                debug!(
                    status = %response.status(),
                    next = next.name(),
                    "Escalating to next candidate"
                );
                response = self.invoke(Arc::clone(next), request).await;
            }
        }

        response
    }

    /// Run one agent on its own task, bounded by the agent timeout
    async fn invoke(&self, agent: Arc<dyn Agent>, request: &Request) -> Response {
        let name = agent.name().to_string();
        let span = agent_span!(agent = %name, request_id = %request.id());
        let timeout = self.settings.agent_timeout;
        let started = Instant::now();

        let owned_request = request.clone();
        let mut task = AbortOnDrop(tokio::spawn(
            async move { agent.process(&owned_request).await }.instrument(span),
        ));

        let response = match tokio::time::timeout(timeout, &mut task.0).await {
            Ok(Ok(response)) => response,
            Ok(Err(join_error)) => {
                error!(
                    agent = %name,
                    error = %sanitize_error_message(&join_error.to_string()),
                    "Agent task failed"
                );
                Response::failed(format!(
                    "Sorry, the {name} agent ran into a problem answering that."
                ))
            }
            Err(_) => {
                task.0.abort();
                self.metrics.agent_timed_out(&name);
                warn!(
                    agent = %name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Agent timed out"
                );
                Response::failed(format!(
                    "Sorry, the {name} agent took too long to answer."
                ))
            }
        };

        self.metrics
            .agent_invoked(&name, response.status(), started.elapsed());
        response
    }

    /// Descriptions of every described agent, in registration order
    pub fn list_agents(&self) -> Vec<Description> {
        self.registry
            .all()
            .iter()
            .filter_map(|agent| {
                let description = agent.description();
                if description.is_none() {
                    warn!(agent = agent.name(), "Agent has no description; omitted from listing");
                }
                description
            })
            .collect()
    }
}

/// Agent task that is aborted when the dispatch awaiting it is dropped
struct AbortOnDrop(JoinHandle<Response>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn should_escalate(status: ResponseStatus) -> bool {
    matches!(
        status,
        ResponseStatus::NotUnderstood | ResponseStatus::Failed | ResponseStatus::Unhandled
    )
}

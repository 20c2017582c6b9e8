//! Bootstrap: builds a [`Dispatcher`] from an [`AppConfig`]
//!
//! All construction and wiring lives here so the routing and dispatch code
//! only ever sees injected dependencies.

use crate::agent::builtin::{ClockAgent, EchoAgent, MoviesAgent, MoviesAgentConfig};
use crate::agent::{Agent, AgentRegistry};
use crate::config::{AgentEntry, AgentKind, AppConfig, RouterEntry, RoutingStrategy};
use crate::dispatcher::{DispatchSettings, Dispatcher};
use crate::error::{SwitchboardError, SwitchboardResult};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::routing::{
    ChainRouter, KeywordRouter, KeywordRule, PatternRouter, PatternRule, Router,
    SingleAgentRouter,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Creates built-in agents from `[[agents]]` entries
pub struct AgentFactory;

impl AgentFactory {
    pub fn create_agent(entry: &AgentEntry) -> SwitchboardResult<Arc<dyn Agent>> {
        let agent: Arc<dyn Agent> = match entry.kind {
            AgentKind::Echo => Arc::new(EchoAgent::named(entry.name.clone())),
            AgentKind::Clock => Arc::new(ClockAgent::new().with_name(entry.name.clone())),
            AgentKind::Movies => {
                let section = entry.movies.clone().unwrap_or_default();
                let api_key = AppConfig::movies_api_key(&section)?;
                let base_url = section.base_url()?;
                let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(
                    Duration::from_millis(section.timeout_ms),
                )?);

                Arc::new(
                    MoviesAgent::new(client, MoviesAgentConfig { api_key, base_url })
                        .with_name(entry.name.clone()),
                )
            }
        };

        debug!(agent = %entry.name, kind = ?entry.kind, "Agent created");
        Ok(agent)
    }

    /// Register every configured agent, in declaration order
    pub fn create_registry(config: &AppConfig) -> SwitchboardResult<AgentRegistry> {
        let mut registry = AgentRegistry::new();
        for entry in &config.agents {
            registry.register(Self::create_agent(entry)?)?;
        }
        Ok(registry)
    }
}

/// Creates routers from `[[routing.chain]]` entries
pub struct RouterFactory;

impl RouterFactory {
    pub fn create_router(entry: &RouterEntry) -> SwitchboardResult<Box<dyn Router>> {
        let router: Box<dyn Router> = match entry.strategy {
            RoutingStrategy::Single => {
                let agent = entry.agent.clone().ok_or_else(|| {
                    SwitchboardError::internal_error("single strategy without an agent")
                })?;
                Box::new(SingleAgentRouter::new(agent))
            }
            RoutingStrategy::Keyword => Box::new(KeywordRouter::new(
                entry
                    .keywords
                    .iter()
                    .map(|rule| KeywordRule::new(rule.agent.clone(), rule.words.clone()))
                    .collect(),
            )),
            RoutingStrategy::Pattern => Box::new(PatternRouter::new(
                entry
                    .patterns
                    .iter()
                    .map(|rule| PatternRule::new(rule.agent.clone(), rule.pattern.clone()))
                    .collect(),
            )?),
        };
        Ok(router)
    }

    pub fn create_chain(entries: &[RouterEntry]) -> SwitchboardResult<ChainRouter> {
        let routers = entries
            .iter()
            .map(Self::create_router)
            .collect::<SwitchboardResult<Vec<_>>>()?;
        Ok(ChainRouter::new(routers))
    }
}

/// Build the registry, the routing chain, and the dispatcher
pub fn build_dispatcher(config: &AppConfig) -> SwitchboardResult<Dispatcher> {
    let registry = Arc::new(AgentFactory::create_registry(config)?);
    let settings = DispatchSettings::from(&config.dispatch);

    let Some(routing) = config.routing.as_ref() else {
        return Ok(Dispatcher::unconfigured(registry, settings));
    };

    let chain = RouterFactory::create_chain(&routing.chain)?;
    info!(
        agents = registry.len(),
        routers = chain.len(),
        "Routing chain built"
    );

    Ok(Dispatcher::new(registry, Box::new(chain), settings)?)
}

//! Router that sends every request to one named agent
//!
//! Typically the last link of a chain, acting as the catch-all fallback.

use crate::agent::{Agent, AgentRegistry};
use crate::error::RouterError;
use crate::protocol::Request;
use crate::routing::router::{ensure_registered, Router};
use std::sync::Arc;

const ROUTER_NAME: &str = "SingleAgentRouter";

#[derive(Debug)]
pub struct SingleAgentRouter {
    agent_name: String,
    registry: Option<Arc<AgentRegistry>>,
}

impl SingleAgentRouter {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            registry: None,
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }
}

impl Router for SingleAgentRouter {
    fn initialize(&mut self, registry: Arc<AgentRegistry>) -> Result<(), RouterError> {
        ensure_registered(ROUTER_NAME, &registry, [self.agent_name.as_str()])?;
        self.registry = Some(registry);
        Ok(())
    }

    fn get_agents(&self, _request: &Request) -> Result<Vec<Arc<dyn Agent>>, RouterError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| RouterError::not_initialized(ROUTER_NAME))?;

        let agent = registry
            .lookup(&self.agent_name)
            .ok_or_else(|| RouterError::unknown_agent(ROUTER_NAME, self.agent_name.clone()))?;
        Ok(vec![agent])
    }
}

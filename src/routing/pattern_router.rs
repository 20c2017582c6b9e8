//! Regular-expression router
//!
//! Each rule pairs a case-insensitive regex with an agent. Patterns are
//! compiled when the router is built so a bad pattern stops startup rather
//! than surfacing on the first request.

use crate::agent::{Agent, AgentRegistry};
use crate::error::RouterError;
use crate::protocol::Request;
use crate::routing::router::{ensure_registered, resolve_unique, Router};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::trace;

const ROUTER_NAME: &str = "PatternRouter";

/// Pattern that routes to one agent
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRule {
    pub agent: String,
    pub pattern: String,
}

impl PatternRule {
    pub fn new(agent: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug)]
pub struct PatternRouter {
    rules: Vec<(Regex, String)>,
    registry: Option<Arc<AgentRegistry>>,
}

impl PatternRouter {
    /// Compile all rules; fails on the first invalid pattern
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, RouterError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| (regex, rule.agent))
                    .map_err(|source| RouterError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            registry: None,
        })
    }
}

impl Router for PatternRouter {
    fn initialize(&mut self, registry: Arc<AgentRegistry>) -> Result<(), RouterError> {
        ensure_registered(
            ROUTER_NAME,
            &registry,
            self.rules.iter().map(|(_, agent)| agent.as_str()),
        )?;
        self.registry = Some(registry);
        Ok(())
    }

    fn get_agents(&self, request: &Request) -> Result<Vec<Arc<dyn Agent>>, RouterError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| RouterError::not_initialized(ROUTER_NAME))?;

        let text = request.text();
        let matched = self
            .rules
            .iter()
            .filter(|(regex, _)| regex.is_match(text))
            .map(|(_, agent)| agent.as_str());

        let agents = resolve_unique(ROUTER_NAME, registry, matched)?;
        trace!(request_id = %request.id(), matched = agents.len(), "Pattern routing");
        Ok(agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAgent;

    fn registry() -> Arc<AgentRegistry> {
        Arc::new(
            AgentRegistry::new()
                .with_agent(Arc::new(MockAgent::answering("clock", "c")))
                .unwrap()
                .with_agent(Arc::new(MockAgent::answering("echo", "e")))
                .unwrap(),
        )
    }

    fn matched(router: &PatternRouter, text: &str) -> Vec<String> {
        router
            .get_agents(&Request::new(text))
            .unwrap()
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    #[test]
    fn test_case_insensitive_match() {
        let mut router = PatternRouter::new(vec![PatternRule::new(
            "clock",
            r"\bwhat (time|day|date)\b",
        )])
        .unwrap();
        router.initialize(registry()).unwrap();

        assert_eq!(matched(&router, "WHAT TIME is it"), vec!["clock"]);
        assert!(matched(&router, "what movie is on").is_empty());
    }

    #[test]
    fn test_rule_order_and_dedup() {
        let mut router = PatternRouter::new(vec![
            PatternRule::new("echo", r"^echo\b"),
            PatternRule::new("clock", r"time"),
            PatternRule::new("echo", r"repeat"),
        ])
        .unwrap();
        router.initialize(registry()).unwrap();

        assert_eq!(
            matched(&router, "echo the time, repeat it"),
            vec!["echo", "clock"]
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = PatternRouter::new(vec![PatternRule::new("echo", r"(unclosed")]);
        assert!(matches!(
            result,
            Err(RouterError::InvalidPattern { ref pattern, .. }) if pattern == "(unclosed"
        ));
    }

    #[test]
    fn test_unknown_agent_rejected_at_initialize() {
        let mut router = PatternRouter::new(vec![PatternRule::new("weather", "rain")]).unwrap();
        assert!(router.initialize(registry()).is_err());
    }

    #[test]
    fn test_not_initialized() {
        let router = PatternRouter::new(vec![]).unwrap();
        assert!(router.get_agents(&Request::new("x")).is_err());
    }
}

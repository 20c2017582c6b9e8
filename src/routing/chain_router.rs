//! Chain router: ordered fallback across child routers
//!
//! Children are consulted in construction order and the first one that
//! proposes at least one agent wins; later children are not consulted. There
//! is no merging or re-ranking across children, so an early narrow router
//! producing a false positive will mask a better match further down the
//! chain. Put specialists first and general fallbacks last.

use crate::agent::{Agent, AgentRegistry};
use crate::error::RouterError;
use crate::protocol::Request;
use crate::routing::router::Router;
use std::sync::Arc;
use tracing::{debug, trace};

const ROUTER_NAME: &str = "ChainRouter";

/// Router composed of an ordered, fixed list of child routers
pub struct ChainRouter {
    routers: Vec<Box<dyn Router>>,
    initialized: bool,
}

impl ChainRouter {
    /// Create a chain from child routers; order is preserved exactly
    pub fn new(routers: Vec<Box<dyn Router>>) -> Self {
        Self {
            routers,
            initialized: false,
        }
    }

    /// Number of child routers
    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }
}

impl Router for ChainRouter {
    /// Initialize every child in order; the first failure aborts startup
    fn initialize(&mut self, registry: Arc<AgentRegistry>) -> Result<(), RouterError> {
        self.initialized = false;
        for (position, router) in self.routers.iter_mut().enumerate() {
            trace!(position, "Initializing chained router");
            router.initialize(Arc::clone(&registry))?;
        }
        self.initialized = true;
        debug!(routers = self.routers.len(), "Chain router initialized");
        Ok(())
    }

    fn get_agents(&self, request: &Request) -> Result<Vec<Arc<dyn Agent>>, RouterError> {
        if !self.initialized {
            return Err(RouterError::not_initialized(ROUTER_NAME));
        }

        for (position, router) in self.routers.iter().enumerate() {
            let agents = router.get_agents(request)?;
            if !agents.is_empty() {
                debug!(
                    request_id = %request.id(),
                    position,
                    candidates = agents.len(),
                    "Chained router matched"
                );
                return Ok(agents);
            }
        }

        debug!(request_id = %request.id(), "No chained router matched");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, MockAgent, MockRouter};

    fn registry() -> Arc<AgentRegistry> {
        Arc::new(
            AgentRegistry::new()
                .with_agent(Arc::new(MockAgent::answering("a", "A")))
                .unwrap()
                .with_agent(Arc::new(MockAgent::answering("b", "B")))
                .unwrap()
                .with_agent(Arc::new(MockAgent::answering("c", "C")))
                .unwrap(),
        )
    }

    fn names(agents: &[Arc<dyn Agent>]) -> Vec<String> {
        agents.iter().map(|a| a.name().to_string()).collect()
    }

    #[test]
    fn test_first_non_empty_child_wins() {
        let first = MockRouter::empty("first");
        let second = MockRouter::proposing("second", vec!["b", "a"]);
        let third = MockRouter::proposing("third", vec!["c"]);
        let probes = [first.probe(), second.probe(), third.probe()];

        let mut chain = ChainRouter::new(vec![Box::new(first), Box::new(second), Box::new(third)]);
        chain.initialize(registry()).unwrap();

        let agents = chain.get_agents(&Request::new("anything")).unwrap();

        assert_eq!(names(&agents), vec!["b", "a"]);
        assert_eq!(probes[0].get_calls(), 1);
        assert_eq!(probes[1].get_calls(), 1);
        assert_eq!(probes[2].get_calls(), 0);
    }

    #[test]
    fn test_all_empty_returns_empty() {
        let mut chain = ChainRouter::new(vec![
            Box::new(MockRouter::empty("x")),
            Box::new(MockRouter::empty("y")),
        ]);
        chain.initialize(registry()).unwrap();

        let agents = chain.get_agents(&Request::new("anything")).unwrap();
        assert!(agents.is_empty());
    }

    #[test]
    fn test_zero_children_returns_empty() {
        let mut chain = ChainRouter::new(Vec::new());
        chain.initialize(Arc::new(AgentRegistry::new())).unwrap();

        assert!(chain.is_empty());
        assert!(chain.get_agents(&Request::new("anything")).unwrap().is_empty());
    }

    #[test]
    fn test_initialize_forwards_in_order() {
        let log = CallLog::new();
        let mut chain = ChainRouter::new(vec![
            Box::new(MockRouter::empty("one").with_log(log.clone())),
            Box::new(MockRouter::empty("two").with_log(log.clone())),
            Box::new(MockRouter::empty("three").with_log(log.clone())),
        ]);

        chain.initialize(registry()).unwrap();

        assert_eq!(log.events(), vec!["init:one", "init:two", "init:three"]);
    }

    #[test]
    fn test_get_before_initialize_fails() {
        let chain = ChainRouter::new(vec![Box::new(MockRouter::proposing("x", vec!["a"]))]);

        let result = chain.get_agents(&Request::new("anything"));
        assert!(matches!(
            result,
            Err(RouterError::NotInitialized { router: "ChainRouter" })
        ));
    }

    #[test]
    fn test_child_initialize_failure_propagates() {
        let third = MockRouter::empty("third");
        let third_probe = third.probe();
        let mut chain = ChainRouter::new(vec![
            Box::new(MockRouter::empty("first")),
            Box::new(MockRouter::empty("second").failing_initialize()),
            Box::new(third),
        ]);

        let result = chain.initialize(registry());

        assert!(matches!(result, Err(RouterError::UnknownAgent { .. })));
        assert_eq!(third_probe.init_calls(), 0);
        assert!(chain.get_agents(&Request::new("x")).is_err());
    }

    #[test]
    fn test_nested_chains() {
        let inner = ChainRouter::new(vec![
            Box::new(MockRouter::empty("inner-a")),
            Box::new(MockRouter::proposing("inner-b", vec!["c"])),
        ]);
        let mut outer = ChainRouter::new(vec![
            Box::new(MockRouter::empty("outer-a")),
            Box::new(inner),
            Box::new(MockRouter::proposing("outer-c", vec!["a"])),
        ]);
        outer.initialize(registry()).unwrap();

        let agents = outer.get_agents(&Request::new("x")).unwrap();
        assert_eq!(names(&agents), vec!["c"]);
    }
}

//! Router trait
//!
//! A router is a selection policy: given a request it proposes an ordered
//! list of candidate agents, most relevant first. Routers never own agents.
//! They receive the shared [`AgentRegistry`] once at startup, keep whatever
//! index they need (keywords, patterns, names), and resolve agents through
//! the registry when asked.
//!
//! ## Lifecycle
//!
//! 1. `initialize` is called exactly once, single-threaded, before the
//!    router is shared with request-serving tasks. Errors here are fatal
//!    configuration errors.
//! 2. `get_agents` is then called concurrently from many requests. It must
//!    not mutate shared state. Calling it before `initialize` returns
//!    [`RouterError::NotInitialized`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use switchboard::agent::AgentRegistry;
//! use switchboard::agent::builtin::EchoAgent;
//! use switchboard::protocol::Request;
//! use switchboard::routing::{ChainRouter, Router, SingleAgentRouter};
//!
//! let mut registry = AgentRegistry::new();
//! registry.register(Arc::new(EchoAgent::new())).unwrap();
//! let registry = Arc::new(registry);
//!
//! let mut router = ChainRouter::new(vec![Box::new(SingleAgentRouter::new("echo"))]);
//! router.initialize(registry).unwrap();
//!
//! let agents = router.get_agents(&Request::new("hello")).unwrap();
//! assert_eq!(agents[0].name(), "echo");
//! ```

use crate::agent::{Agent, AgentRegistry};
use crate::error::RouterError;
use crate::protocol::Request;
use std::sync::Arc;

/// Selection policy proposing candidate agents for a request
pub trait Router: Send + Sync {
    /// One-time setup against the registry
    ///
    /// Calling it again rebuilds the same index from the registry.
    fn initialize(&mut self, registry: Arc<AgentRegistry>) -> Result<(), RouterError>;

    /// Candidate agents for `request`, most relevant first
    ///
    /// Returns an empty list (never an error) when nothing matches.
    fn get_agents(&self, request: &Request) -> Result<Vec<Arc<dyn Agent>>, RouterError>;
}

/// Resolve agent names through the registry, keeping order and dropping repeats
pub(crate) fn resolve_unique<'a, I>(
    router: &'static str,
    registry: &AgentRegistry,
    names: I,
) -> Result<Vec<Arc<dyn Agent>>, RouterError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<&str> = Vec::new();
    let mut agents = Vec::new();

    for name in names {
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);

        let agent = registry
            .lookup(name)
            .ok_or_else(|| RouterError::unknown_agent(router, name))?;
        agents.push(agent);
    }

    Ok(agents)
}

/// Check at initialize time that every referenced agent is registered
pub(crate) fn ensure_registered<'a, I>(
    router: &'static str,
    registry: &AgentRegistry,
    names: I,
) -> Result<(), RouterError>
where
    I: IntoIterator<Item = &'a str>,
{
    for name in names {
        if !registry.contains(name) {
            return Err(RouterError::unknown_agent(router, name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAgent;

    fn registry() -> AgentRegistry {
        AgentRegistry::new()
            .with_agent(Arc::new(MockAgent::answering("a", "A")))
            .unwrap()
            .with_agent(Arc::new(MockAgent::answering("b", "B")))
            .unwrap()
    }

    #[test]
    fn test_resolve_unique_keeps_first_occurrence_order() {
        let agents = resolve_unique("Test", &registry(), ["b", "a", "b"]).unwrap();
        let names: Vec<&str> = agents.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        let result = resolve_unique("Test", &registry(), ["c"]);
        assert!(matches!(result, Err(RouterError::UnknownAgent { .. })));
    }

    #[test]
    fn test_ensure_registered() {
        assert!(ensure_registered("Test", &registry(), ["a", "b"]).is_ok());
        assert!(ensure_registered("Test", &registry(), ["a", "z"]).is_err());
    }
}

//! Name-keyed store of every agent the application can route to
//!
//! The registry is filled during startup through `&mut self` and then shared
//! as `Arc<AgentRegistry>`, which makes it read-only (and safe for concurrent
//! reads) for the rest of the process lifetime. Routers hold the shared
//! registry and agent names; they never own agents directly.

use crate::agent::Agent;
use crate::error::RegistryError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of agents keyed by unique name, enumerated in insertion order
#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn Agent>>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its name
    ///
    /// Registering the same instance twice is a no-op. Registering a
    /// different instance under a name that is already taken fails with
    /// [`RegistryError::DuplicateName`].
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<(), RegistryError> {
        let name = agent.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        if let Some(&slot) = self.index.get(&name) {
            if same_instance(&self.agents[slot], &agent) {
                debug!(agent = %name, "Agent already registered, ignoring");
                return Ok(());
            }
            return Err(RegistryError::DuplicateName { name });
        }

        self.index.insert(name.clone(), self.agents.len());
        self.agents.push(agent);
        info!(agent = %name, "Registered agent");
        Ok(())
    }

    /// Builder-style registration for startup code
    pub fn with_agent(mut self, agent: Arc<dyn Agent>) -> Result<Self, RegistryError> {
        self.register(agent)?;
        Ok(self)
    }

    /// Look up an agent by name
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.index
            .get(name)
            .map(|&slot| Arc::clone(&self.agents[slot]))
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All agents in insertion order
    pub fn all(&self) -> Vec<Arc<dyn Agent>> {
        self.agents.clone()
    }

    /// All agent names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.names())
            .finish()
    }
}

/// Compare the data pointers of two agent handles (vtables may differ across codegen units)
pub(crate) fn same_instance(a: &Arc<dyn Agent>, b: &Arc<dyn Agent>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAgent;

    #[test]
    fn test_lookup_returns_identical_instance() {
        let mut registry = AgentRegistry::new();
        let agent: Arc<dyn Agent> = Arc::new(MockAgent::answering("weather", "sunny"));

        registry.register(agent.clone()).unwrap();

        let found = registry.lookup("weather").expect("agent should be registered");
        assert!(same_instance(&found, &agent));
    }

    #[test]
    fn test_lookup_unknown_name() {
        let registry = AgentRegistry::new();
        assert!(registry.lookup("weather").is_none());
        assert!(!registry.contains("weather"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = AgentRegistry::new();
        registry
            .register(Arc::new(MockAgent::answering("weather", "sunny")))
            .unwrap();

        let result = registry.register(Arc::new(MockAgent::answering("weather", "rainy")));

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateName { ref name }) if name == "weather"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregistering_same_instance_is_noop() {
        let mut registry = AgentRegistry::new();
        let agent: Arc<dyn Agent> = Arc::new(MockAgent::answering("weather", "sunny"));

        registry.register(agent.clone()).unwrap();
        registry.register(agent.clone()).unwrap();

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = AgentRegistry::new();
        let result = registry.register(Arc::new(MockAgent::answering("", "x")));
        assert!(matches!(result, Err(RegistryError::EmptyName)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_all_preserves_insertion_order() {
        let registry = AgentRegistry::new()
            .with_agent(Arc::new(MockAgent::answering("zeta", "z")))
            .unwrap()
            .with_agent(Arc::new(MockAgent::answering("alpha", "a")))
            .unwrap()
            .with_agent(Arc::new(MockAgent::answering("mid", "m")))
            .unwrap();

        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        let all: Vec<String> = registry
            .all()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(all, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_debug_lists_names() {
        let registry = AgentRegistry::new()
            .with_agent(Arc::new(MockAgent::answering("echo", "x")))
            .unwrap();
        assert!(format!("{registry:?}").contains("echo"));
    }
}

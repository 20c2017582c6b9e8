//! Test helpers and utilities for integration tests

use std::sync::Arc;
use switchboard::testing::MockAgent;
use switchboard::{AgentRegistry, DispatchSettings, Dispatcher, Router};

/// Registry holding the given mock agents, in order
#[allow(dead_code)]
pub fn registry_of(agents: Vec<MockAgent>) -> Arc<AgentRegistry> {
    let mut registry = AgentRegistry::new();
    for agent in agents {
        registry
            .register(Arc::new(agent))
            .expect("mock agent names are unique");
    }
    Arc::new(registry)
}

/// Dispatcher over `registry` and `router` with default settings
#[allow(dead_code)]
pub fn dispatcher_with(registry: Arc<AgentRegistry>, router: impl Router + 'static) -> Dispatcher {
    Dispatcher::new(registry, Box::new(router), DispatchSettings::default())
        .expect("router initializes")
}

/// Write `content` to a temporary TOML file
#[allow(dead_code)]
pub fn config_file(content: &str) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

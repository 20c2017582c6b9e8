//! Agent that answers with the request text unchanged

use crate::agent::Agent;
use crate::protocol::{Description, Request, Response};
use async_trait::async_trait;

pub const ECHO_AGENT_NAME: &str = "echo";

#[derive(Debug, Clone)]
pub struct EchoAgent {
    name: String,
}

impl Default for EchoAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoAgent {
    pub fn new() -> Self {
        Self::named(ECHO_AGENT_NAME)
    }

    /// Echo agent registered under a custom name
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Agent for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<Description> {
        Some(Description::new(
            self.name.clone(),
            "Repeats whatever you say.",
            "hello there",
        ))
    }

    async fn process(&self, request: &Request) -> Response {
        Response::answered(request.text())
    }
}

//! Keyword router
//!
//! Each rule maps an agent to a set of keywords. A request is tokenized
//! (lower-cased, split on anything that is not a letter, digit, or
//! apostrophe) and every agent with at least one keyword among the tokens is
//! proposed, in rule order. Multi-word keywords ("mpaa rating") must appear
//! as a contiguous run of tokens.

use crate::agent::{Agent, AgentRegistry};
use crate::error::RouterError;
use crate::protocol::Request;
use crate::routing::router::{ensure_registered, resolve_unique, Router};
use std::sync::Arc;
use tracing::trace;

const ROUTER_NAME: &str = "KeywordRouter";

/// Keywords that route to one agent
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    pub agent: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new<S: Into<String>>(agent: impl Into<String>, keywords: Vec<S>) -> Self {
        Self {
            agent: agent.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug)]
struct CompiledRule {
    agent: String,
    phrases: Vec<Vec<String>>,
}

impl CompiledRule {
    fn matches(&self, tokens: &[String]) -> bool {
        self.phrases
            .iter()
            .any(|phrase| contains_phrase(tokens, phrase))
    }
}

#[derive(Debug)]
pub struct KeywordRouter {
    rules: Vec<CompiledRule>,
    registry: Option<Arc<AgentRegistry>>,
}

impl KeywordRouter {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| CompiledRule {
                agent: rule.agent,
                phrases: rule
                    .keywords
                    .iter()
                    .map(|keyword| tokenize(keyword))
                    .filter(|phrase| !phrase.is_empty())
                    .collect(),
            })
            .collect();

        Self {
            rules,
            registry: None,
        }
    }
}

impl Router for KeywordRouter {
    fn initialize(&mut self, registry: Arc<AgentRegistry>) -> Result<(), RouterError> {
        ensure_registered(
            ROUTER_NAME,
            &registry,
            self.rules.iter().map(|rule| rule.agent.as_str()),
        )?;
        self.registry = Some(registry);
        Ok(())
    }

    fn get_agents(&self, request: &Request) -> Result<Vec<Arc<dyn Agent>>, RouterError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| RouterError::not_initialized(ROUTER_NAME))?;

        let tokens = tokenize(request.text());
        let matched = self
            .rules
            .iter()
            .filter(|rule| rule.matches(&tokens))
            .map(|rule| rule.agent.as_str());

        let agents = resolve_unique(ROUTER_NAME, registry, matched)?;
        trace!(request_id = %request.id(), matched = agents.len(), "Keyword routing");
        Ok(agents)
    }
}

/// Lower-case word tokens of `text`
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    if phrase.len() > tokens.len() {
        return false;
    }
    tokens.windows(phrase.len()).any(|window| window == phrase)
}

//! TOML configuration for the switchboard
//!
//! A config file declares the HTTP listener, dispatch settings, the agents
//! to register, and the chain of routing strategies:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [dispatch]
//! timeout_ms = 5000
//! escalate = false
//!
//! [[agents]]
//! name = "clock"
//! kind = "clock"
//!
//! [[agents]]
//! name = "movies"
//! kind = "movies"
//! [agents.movies]
//! api_key_env = "MOVIES_API_KEY"
//!
//! [[agents]]
//! name = "echo"
//! kind = "echo"
//!
//! [[routing.chain]]
//! strategy = "keyword"
//! keywords = [{ agent = "movies", words = ["movie", "film"] }]
//!
//! [[routing.chain]]
//! strategy = "pattern"
//! patterns = [{ agent = "clock", pattern = '\b(time|date)\b' }]
//!
//! [[routing.chain]]
//! strategy = "single"
//! agent = "echo"
//! ```
//!
//! Without a `[routing]` table the dispatcher starts unconfigured. Secrets
//! are never stored in the file; sections name the environment variable
//! that holds them and the value is read at startup.

use crate::agent::builtin::movies::DEFAULT_MOVIES_BASE_URL;
use crate::dispatcher::DEFAULT_AGENT_TIMEOUT_MS;
use crate::http::DEFAULT_HTTP_TIMEOUT_MS;
use crate::routing::keyword_router::tokenize;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Environment variable holding the movie API key unless overridden
pub const DEFAULT_MOVIES_API_KEY_ENV: &str = "MOVIES_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
    /// Routing chain (optional; absent means unconfigured)
    pub routing: Option<RoutingConfig>,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchSection {
    /// Per-agent timeout in milliseconds (default: 5000)
    #[serde(default = "default_agent_timeout_ms")]
    pub timeout_ms: u64,
    /// Try the next candidate when one does not answer (default: false)
    #[serde(default)]
    pub escalate: bool,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_agent_timeout_ms(),
            escalate: false,
        }
    }
}

fn default_agent_timeout_ms() -> u64 {
    DEFAULT_AGENT_TIMEOUT_MS
}

/// One agent to register
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentEntry {
    /// Registry name (must match [a-zA-Z0-9._-]+)
    pub name: String,
    pub kind: AgentKind,
    /// Settings for `kind = "movies"`
    pub movies: Option<MoviesSection>,
}

/// Built-in agent implementations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Echo,
    Movies,
    Clock,
}

/// Movie search API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoviesSection {
    /// Environment variable containing the API key
    #[serde(default = "default_movies_api_key_env")]
    pub api_key_env: String,
    /// Search endpoint
    #[serde(default = "default_movies_base_url")]
    pub base_url: String,
    /// HTTP timeout in milliseconds (default: 5000)
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for MoviesSection {
    fn default() -> Self {
        Self {
            api_key_env: default_movies_api_key_env(),
            base_url: default_movies_base_url(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

fn default_movies_api_key_env() -> String {
    DEFAULT_MOVIES_API_KEY_ENV.to_string()
}

fn default_movies_base_url() -> String {
    DEFAULT_MOVIES_BASE_URL.to_string()
}

fn default_http_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

impl MoviesSection {
    /// Parsed search endpoint
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|e| {
            ConfigError::InvalidConfig(format!("Invalid movies base_url '{}': {e}", self.base_url))
        })
    }
}

/// Routing chain, consulted in order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    #[serde(default)]
    pub chain: Vec<RouterEntry>,
}

/// One strategy in the chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterEntry {
    pub strategy: RoutingStrategy,
    /// Target of `strategy = "single"`
    pub agent: Option<String>,
    /// Rules of `strategy = "keyword"`
    #[serde(default)]
    pub keywords: Vec<KeywordEntry>,
    /// Rules of `strategy = "pattern"`
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

/// Routing strategy selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStrategy {
    Single,
    Keyword,
    Pattern,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordEntry {
    pub agent: String,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternEntry {
    pub agent: String,
    pub pattern: String,
}

impl RouterEntry {
    /// Validate strategy/section consistency and agent references
    pub fn validate(&self, position: usize, agents: &HashSet<&str>) -> Result<(), ConfigError> {
        let invalid = |detail: &str| {
            ConfigError::InvalidConfig(format!("routing.chain[{position}]: {detail}"))
        };

        let referenced: Vec<&str> = match self.strategy {
            RoutingStrategy::Single => {
                if !self.keywords.is_empty() || !self.patterns.is_empty() {
                    return Err(invalid("single strategy takes only `agent`"));
                }
                let agent = self
                    .agent
                    .as_deref()
                    .ok_or_else(|| invalid("single strategy requires `agent`"))?;
                vec![agent]
            }
            RoutingStrategy::Keyword => {
                if self.agent.is_some() || !self.patterns.is_empty() {
                    return Err(invalid("keyword strategy takes only `keywords`"));
                }
                if self.keywords.is_empty() {
                    return Err(invalid("keyword strategy requires at least one rule"));
                }
                if let Some(rule) = self.keywords.iter().find(|rule| {
                    rule.words.is_empty() || rule.words.iter().any(|w| tokenize(w).is_empty())
                }) {
                    return Err(invalid(&format!(
                        "keyword rule for '{}' has an empty word list or a word with no letters or digits",
                        rule.agent
                    )));
                }
                self.keywords.iter().map(|rule| rule.agent.as_str()).collect()
            }
            RoutingStrategy::Pattern => {
                if self.agent.is_some() || !self.keywords.is_empty() {
                    return Err(invalid("pattern strategy takes only `patterns`"));
                }
                if self.patterns.is_empty() {
                    return Err(invalid("pattern strategy requires at least one rule"));
                }
                for rule in &self.patterns {
                    RegexBuilder::new(&rule.pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            invalid(&format!(
                                "invalid pattern '{}' for '{}': {e}",
                                rule.pattern, rule.agent
                            ))
                        })?;
                }
                self.patterns.iter().map(|rule| rule.agent.as_str()).collect()
            }
        };

        if let Some(unknown) = referenced.iter().find(|name| !agents.contains(*name)) {
            return Err(invalid(&format!("references unknown agent '{unknown}'")));
        }

        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid agent name format: {0}")]
    InvalidAgentName(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check agent names, per-kind sections, and the routing chain
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();

        for entry in &self.agents {
            validate_agent_name(&entry.name)?;

            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::InvalidConfig(format!(
                    "Agent '{}' is declared more than once",
                    entry.name
                )));
            }

            match (entry.kind, &entry.movies) {
                (AgentKind::Movies, Some(section)) => {
                    section.base_url()?;
                }
                (AgentKind::Movies, None) => {}
                (_, Some(_)) => {
                    return Err(ConfigError::InvalidConfig(format!(
                        "Agent '{}' has a [agents.movies] section but is not kind = \"movies\"",
                        entry.name
                    )));
                }
                (_, None) => {}
            }
        }

        if self.dispatch.timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "dispatch.timeout_ms must be greater than zero".to_string(),
            ));
        }

        if let Some(ref routing) = self.routing {
            for (position, entry) in routing.chain.iter().enumerate() {
                entry.validate(position, &names)?;
            }
        }

        Ok(())
    }

    /// Helper method to get environment variable with error propagation
    fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(env_var_name.to_string()))
    }

    /// Get the movie API key named by `section`
    pub fn movies_api_key(section: &MoviesSection) -> Result<String, ConfigError> {
        Self::get_env_var_required(&section.api_key_env)
    }

    /// Listener address as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Listener address as a socket address; `host` must be an IP literal
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address().parse().map_err(|e| {
            ConfigError::InvalidConfig(format!(
                "Invalid server address '{}': {e}",
                self.bind_address()
            ))
        })
    }

    /// Echo-only configuration
    pub fn test_config() -> Self {
        let toml_content = r#"
[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "single"
agent = "echo"
"#;
        // Static text; a parse failure here is a programming error
        toml::from_str(toml_content).unwrap_or_default()
    }
}

/// Validate agent name format
fn validate_agent_name(name: &str) -> Result<(), ConfigError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if name.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidAgentName(format!(
            "Agent name '{name}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 9090

[dispatch]
timeout_ms = 1500
escalate = true

[[agents]]
name = "clock"
kind = "clock"

[[agents]]
name = "movies"
kind = "movies"
[agents.movies]
api_key_env = "TEST_MOVIES_KEY"
base_url = "http://localhost:1234/movies.json"

[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "keyword"
keywords = [{ agent = "movies", words = ["movie", "film"] }]

[[routing.chain]]
strategy = "pattern"
patterns = [{ agent = "clock", pattern = '\btime\b' }]

[[routing.chain]]
strategy = "single"
agent = "echo"
"#;

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml_str(FULL_CONFIG).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.dispatch.timeout_ms, 1500);
        assert!(config.dispatch.escalate);
        assert_eq!(config.agents.len(), 3);
        assert_eq!(config.agents[1].kind, AgentKind::Movies);

        let movies = config.agents[1].movies.as_ref().unwrap();
        assert_eq!(movies.api_key_env, "TEST_MOVIES_KEY");
        assert_eq!(movies.timeout_ms, 5000);

        let chain = &config.routing.as_ref().unwrap().chain;
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].strategy, RoutingStrategy::Keyword);
        assert_eq!(chain[2].agent.as_deref(), Some("echo"));
    }

    #[test]
    fn test_socket_addr() {
        let mut config = AppConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 8080);

        config.server.host = "localhost".to_string();
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.dispatch.timeout_ms, 5000);
        assert!(!config.dispatch.escalate);
        assert!(config.agents.is_empty());
        assert!(config.routing.is_none());
    }

    #[test]
    fn test_invalid_agent_name() {
        assert!(validate_agent_name("invalid@agent").is_err());
        assert!(validate_agent_name("").is_err());
        assert!(validate_agent_name("valid-agent_123.test").is_ok());
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let toml_content = r#"
[[agents]]
name = "echo"
kind = "echo"

[[agents]]
name = "echo"
kind = "clock"
"#;
        assert!(matches!(
            AppConfig::from_toml_str(toml_content),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_strategy_requires_agent() {
        let toml_content = r#"
[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "single"
"#;
        let err = AppConfig::from_toml_str(toml_content).unwrap_err();
        assert!(err.to_string().contains("requires `agent`"));
    }

    #[test]
    fn test_strategy_with_foreign_section_rejected() {
        let toml_content = r#"
[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "keyword"
agent = "echo"
keywords = [{ agent = "echo", words = ["say"] }]
"#;
        assert!(AppConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_unknown_agent_reference_rejected() {
        let toml_content = r#"
[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "pattern"
patterns = [{ agent = "weather", pattern = "rain" }]
"#;
        let err = AppConfig::from_toml_str(toml_content).unwrap_err();
        assert!(err.to_string().contains("unknown agent 'weather'"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let toml_content = r#"
[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "pattern"
patterns = [{ agent = "echo", pattern = "(unclosed" }]
"#;
        let err = AppConfig::from_toml_str(toml_content).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
        assert!(err.to_string().contains("invalid pattern '(unclosed'"));
    }

    #[test]
    fn test_punctuation_only_keyword_rejected() {
        let toml_content = r#"
[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "keyword"
keywords = [{ agent = "echo", words = ["hello", "?!"] }]
"#;
        let err = AppConfig::from_toml_str(toml_content).unwrap_err();
        assert!(err.to_string().contains("keyword rule for 'echo'"));
    }

    #[test]
    fn test_movies_section_on_wrong_kind() {
        let toml_content = r#"
[[agents]]
name = "echo"
kind = "echo"
[agents.movies]
api_key_env = "X"
"#;
        assert!(AppConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_invalid_movies_url() {
        let toml_content = r#"
[[agents]]
name = "movies"
kind = "movies"
[agents.movies]
base_url = "not a url"
"#;
        assert!(AppConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_unknown_strategy_is_parse_error() {
        let toml_content = r#"
[[routing.chain]]
strategy = "llm"
"#;
        assert!(matches!(
            AppConfig::from_toml_str(toml_content),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_movies_api_key_from_env() {
        let section = MoviesSection {
            api_key_env: "SWITCHBOARD_CONFIG_TEST_MOVIES_KEY".to_string(),
            ..MoviesSection::default()
        };

        assert!(matches!(
            AppConfig::movies_api_key(&section),
            Err(ConfigError::EnvVarNotFound(ref name)) if name == "SWITCHBOARD_CONFIG_TEST_MOVIES_KEY"
        ));

        std::env::set_var("SWITCHBOARD_CONFIG_TEST_MOVIES_KEY", "abc123");
        assert_eq!(AppConfig::movies_api_key(&section).unwrap(), "abc123");
        std::env::remove_var("SWITCHBOARD_CONFIG_TEST_MOVIES_KEY");
    }

    #[test]
    fn test_test_config_is_valid() {
        let config = AppConfig::test_config();
        config.validate().unwrap();
        assert_eq!(config.agents.len(), 1);
        assert!(config.routing.is_some());
    }
}

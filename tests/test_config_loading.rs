//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error handling.

mod test_helpers;

use std::path::Path;
use switchboard::bootstrap::build_dispatcher;
use switchboard::config::{AgentKind, AppConfig, ConfigError, RoutingStrategy};
use switchboard::ResponseStatus;
use test_helpers::config_file;

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let file = config_file(
        r#"
[server]
host = "127.0.0.1"
port = 3000

[[agents]]
name = "echo"
kind = "echo"

[[agents]]
name = "clock"
kind = "clock"

[[routing.chain]]
strategy = "pattern"
patterns = [{ agent = "clock", pattern = '\b(time|date)\b' }]

[[routing.chain]]
strategy = "single"
agent = "echo"
"#,
    );

    let config = AppConfig::load_from_file(file.path()).unwrap();

    assert_eq!(config.bind_address(), "127.0.0.1:3000");
    assert_eq!(config.agents.len(), 2);
    assert_eq!(config.agents[1].kind, AgentKind::Clock);

    let chain = &config.routing.unwrap().chain;
    assert_eq!(chain[0].strategy, RoutingStrategy::Pattern);
    assert_eq!(chain[1].strategy, RoutingStrategy::Single);
}

#[test]
fn test_missing_file_is_file_read_error() {
    let result = AppConfig::load_from_file(Path::new("/nonexistent/switchboard.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let file = config_file("[[agents]\nname = ");
    let result = AppConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_invalid_agent_name_rejected() {
    let file = config_file(
        r#"
[[agents]]
name = "bad name!"
kind = "echo"
"#,
    );

    let result = AppConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidAgentName(_))));
}

#[test]
fn test_unknown_kind_rejected() {
    let file = config_file(
        r#"
[[agents]]
name = "weather"
kind = "weather"
"#,
    );

    assert!(AppConfig::load_from_file(file.path()).is_err());
}

#[test]
fn test_zero_timeout_rejected() {
    let file = config_file(
        r#"
[dispatch]
timeout_ms = 0
"#,
    );

    assert!(matches!(
        AppConfig::load_from_file(file.path()),
        Err(ConfigError::InvalidConfig(_))
    ));
}

#[test]
fn test_bad_pattern_rejected_at_load() {
    let file = config_file(
        r#"
[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "pattern"
patterns = [{ agent = "echo", pattern = "(unclosed" }]
"#,
    );

    // Rejected before any router is built, so `config` and `serve` agree
    assert!(matches!(
        AppConfig::load_from_file(file.path()),
        Err(ConfigError::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn test_loaded_config_dispatches_end_to_end() {
    let file = config_file(
        r#"
[[agents]]
name = "clock"
kind = "clock"

[[agents]]
name = "echo"
kind = "echo"

[[routing.chain]]
strategy = "keyword"
keywords = [{ agent = "clock", words = ["time", "date"] }]

[[routing.chain]]
strategy = "single"
agent = "echo"
"#,
    );

    let config = AppConfig::load_from_file(file.path()).unwrap();
    let dispatcher = build_dispatcher(&config).unwrap();

    let time = dispatcher.dispatch_text("What time is it?").await;
    assert_eq!(time.status(), ResponseStatus::Answered);
    assert!(time.text().starts_with("It is "));

    let echoed = dispatcher.dispatch_text("good morning").await;
    assert_eq!(echoed.text(), "good morning");
}

#[tokio::test]
async fn test_config_without_routing_is_unavailable() {
    let file = config_file(
        r#"
[[agents]]
name = "echo"
kind = "echo"
"#,
    );

    let config = AppConfig::load_from_file(file.path()).unwrap();
    let dispatcher = build_dispatcher(&config).unwrap();

    let response = dispatcher.dispatch_text("hello").await;
    assert_eq!(response.status(), ResponseStatus::Unavailable);
    assert_eq!(response.text(), switchboard::NOT_CONFIGURED_TEXT);
}

#[test]
fn test_shipped_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/switchboard.toml");
    let config = AppConfig::load_from_file(&path).unwrap();

    assert_eq!(config.agents.len(), 3);
    assert_eq!(config.routing.unwrap().chain.len(), 3);
}

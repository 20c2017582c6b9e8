//! Error types for agent registration, routing, and startup
//!
//! Everything here is a startup-phase error. Request-phase conditions never
//! surface as errors past the dispatcher; they are turned into a
//! [`Response`](crate::protocol::Response) instead.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors raised while registering agents
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Agent name '{name}' is already registered to a different agent")]
    DuplicateName { name: String },

    #[error("Agent name must not be empty")]
    EmptyName,
}

/// Errors raised by routers
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("{router} used before initialize()")]
    NotInitialized { router: &'static str },

    #[error("{router} references unregistered agent '{agent}'")]
    UnknownAgent { router: &'static str, agent: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl RouterError {
    pub fn not_initialized(router: &'static str) -> Self {
        Self::NotInitialized { router }
    }

    pub fn unknown_agent<S: Into<String>>(router: &'static str, agent: S) -> Self {
        Self::UnknownAgent {
            router,
            agent: agent.into(),
        }
    }
}

/// Top-level error type for building and running the application
#[derive(Debug, Error)]
pub enum SwitchboardError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Registry error: {0}")]
    RegistryError(#[from] RegistryError),

    #[error("Routing error: {0}")]
    RoutingError(#[from] RouterError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] crate::http::HttpError),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl SwitchboardError {
    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Result type for startup operations
pub type SwitchboardResult<T> = Result<T, SwitchboardError>;

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*[^\s&]+").expect("valid secret pattern")
});

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("valid path pattern")
});

const MAX_MESSAGE_LEN: usize = 500;

/// Scrub credentials and sensitive paths from text that may reach a user
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN
        .replace_all(message, "${1}=***")
        .to_string();

    sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

//! Request and response types exchanged between the dispatcher and agents
//!
//! A [`Request`] carries nothing but the raw user text (plus an id used to
//! correlate log lines). A [`Response`] is always produced, even when nothing
//! could answer; the [`ResponseStatus`] tag says which of the outcomes it is.
//!
//! # Examples
//! ```
//! use switchboard::protocol::{Request, Response, ResponseStatus};
//!
//! let request = Request::new("what time is it?");
//! assert_eq!(request.text(), "what time is it?");
//!
//! let response = Response::answered("It is 14:03.");
//! assert!(response.understood());
//! assert_eq!(response.status(), ResponseStatus::Answered);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Text returned when no router has been wired into the dispatcher
pub const NOT_CONFIGURED_TEXT: &str = "The application is not configured to answer requests.";

/// Text returned when no agent claims a request
pub const UNHANDLED_TEXT: &str = "Sorry, I don't know how to help with that.";

/// Immutable user request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    id: Uuid,
    text: String,
}

impl Request {
    /// Create a request from raw user text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }

    /// Correlation id for logging
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Raw user text
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Outcome carried by a [`Response`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// An agent answered the request
    Answered,
    /// The selected agent could not make sense of the request
    NotUnderstood,
    /// The selected agent (or its invocation) failed
    Failed,
    /// No agent was proposed for the request
    Unhandled,
    /// The dispatcher has no working router
    Unavailable,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Answered => "answered",
            ResponseStatus::NotUnderstood => "not_understood",
            ResponseStatus::Failed => "failed",
            ResponseStatus::Unhandled => "unhandled",
            ResponseStatus::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable response produced by an agent or by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    text: String,
    status: ResponseStatus,
    payload: Option<Value>,
}

impl Response {
    fn with_status(text: impl Into<String>, status: ResponseStatus) -> Self {
        Self {
            text: text.into(),
            status,
            payload: None,
        }
    }

    /// Successful answer
    pub fn answered(text: impl Into<String>) -> Self {
        Self::with_status(text, ResponseStatus::Answered)
    }

    /// The agent did not understand; `text` is its apology
    pub fn not_understood(text: impl Into<String>) -> Self {
        Self::with_status(text, ResponseStatus::NotUnderstood)
    }

    /// The agent failed; `text` is the user-facing explanation
    pub fn failed(text: impl Into<String>) -> Self {
        Self::with_status(text, ResponseStatus::Failed)
    }

    /// No agent claimed the request
    pub fn unhandled() -> Self {
        Self::with_status(UNHANDLED_TEXT, ResponseStatus::Unhandled)
    }

    /// The dispatcher is not configured
    pub fn unavailable() -> Self {
        Self::with_status(NOT_CONFIGURED_TEXT, ResponseStatus::Unavailable)
    }

    /// Attach a structured result
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// True only when an agent answered
    pub fn understood(&self) -> bool {
        self.status == ResponseStatus::Answered
    }

    /// Boundary shape rendered by the HTTP and CLI layers
    pub fn body(&self) -> ResponseBody {
        ResponseBody {
            text: self.text.clone(),
            understood: self.understood(),
            status: self.status,
            payload: self.payload.clone(),
        }
    }
}

/// Serialized form of a [`Response`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub text: String,
    pub understood: bool,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Discovery metadata for an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub name: String,
    pub summary: String,
    pub example: String,
}

impl Description {
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            example: example.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_ids_are_unique() {
        let a = Request::new("hello");
        let b = Request::new("hello");

        assert_eq!(a.text(), b.text());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_only_answered_counts_as_understood() {
        assert!(Response::answered("ok").understood());
        assert!(!Response::not_understood("sorry").understood());
        assert!(!Response::failed("boom").understood());
        assert!(!Response::unhandled().understood());
        assert!(!Response::unavailable().understood());
    }

    #[test]
    fn test_dispatcher_responses_use_fixed_text() {
        assert_eq!(Response::unhandled().text(), UNHANDLED_TEXT);
        assert_eq!(Response::unavailable().text(), NOT_CONFIGURED_TEXT);
        assert_ne!(UNHANDLED_TEXT, NOT_CONFIGURED_TEXT);
    }

    #[test]
    fn test_body_serialization() {
        let body = Response::answered("hello").body();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            json!({"text": "hello", "understood": true, "status": "answered"})
        );
    }

    #[test]
    fn test_body_includes_payload_when_present() {
        let body = Response::answered("The film, Alien, is 117 minutes long.")
            .with_payload(json!({"runtime": 117}))
            .body();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["payload"]["runtime"], 117);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ResponseStatus::NotUnderstood.to_string(), "not_understood");
        assert_eq!(
            serde_json::to_value(ResponseStatus::Unavailable).unwrap(),
            json!("unavailable")
        );
    }
}

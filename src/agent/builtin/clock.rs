//! Agent answering "what time is it" and "what is the date" questions

use crate::agent::Agent;
use crate::protocol::{Description, Request, Response};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};
use serde_json::json;

pub const CLOCK_AGENT_NAME: &str = "clock";

const SUMMARY: &str = "Tells you the current time or date.";
const EXAMPLE: &str = "What time is it?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockQuestion {
    Time,
    Date,
}

#[derive(Debug, Clone)]
pub struct ClockAgent {
    name: String,
    fixed_now: Option<DateTime<FixedOffset>>,
}

impl Default for ClockAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockAgent {
    pub fn new() -> Self {
        Self {
            name: CLOCK_AGENT_NAME.to_string(),
            fixed_now: None,
        }
    }

    /// Clock frozen at `now`
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self {
            fixed_now: Some(now),
            ..Self::new()
        }
    }

    /// Register under a name other than `clock`
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.fixed_now.unwrap_or_else(|| Local::now().into())
    }

    fn classify(text: &str) -> Option<ClockQuestion> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if words.contains(&"time") {
            Some(ClockQuestion::Time)
        } else if ["date", "day", "today"].iter().any(|w| words.contains(w)) {
            Some(ClockQuestion::Date)
        } else {
            None
        }
    }
}

#[async_trait]
impl Agent for ClockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<Description> {
        Some(Description::new(self.name.clone(), SUMMARY, EXAMPLE))
    }

    async fn process(&self, request: &Request) -> Response {
        let Some(question) = Self::classify(request.text()) else {
            return Response::not_understood(
                "I'm sorry, I can only tell you the time or the date.",
            );
        };

        let now = self.now();
        let text = match question {
            ClockQuestion::Time => format!("It is {}.", now.format("%H:%M")),
            ClockQuestion::Date => format!("Today is {}.", now.format("%A, %B %-d, %Y")),
        };

        Response::answered(text).with_payload(json!({ "now": now.to_rfc3339() }))
    }
}

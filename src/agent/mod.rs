//! Agent contract and registry
//!
//! An agent is a named, independently pluggable handler. It knows nothing
//! about routing: it receives a [`Request`] and always returns a
//! [`Response`], including when it does not understand the request or when a
//! third-party service it relies on fails.

use crate::protocol::{Description, Request, Response};
use async_trait::async_trait;

pub mod builtin;
pub mod registry;

pub use registry::AgentRegistry;

/// Capability unit selected by routers and invoked by the dispatcher
///
/// Implementations must not panic or hang for ordinary failures; the
/// dispatcher still guards every call with a timeout and converts a panic
/// into a failed response.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique name used as the registry key
    fn name(&self) -> &str;

    /// Discovery metadata; `None` hides the agent from listings
    fn description(&self) -> Option<Description>;

    /// Handle a request
    async fn process(&self, request: &Request) -> Response;
}

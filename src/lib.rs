//! Switchboard
//!
//! Routes a free-text request to exactly one capable agent out of a
//! registered set and returns that agent's response.
//!
//! # Overview
//!
//! - [`agent`]: the [`Agent`] contract, the [`AgentRegistry`], and built-in agents
//! - [`routing`]: the [`Router`] contract, [`ChainRouter`] (first non-empty
//!   child wins), and single-agent, keyword, and pattern strategies
//! - [`dispatcher`]: the [`Dispatcher`], which applies a per-agent timeout and
//!   always produces a [`Response`]
//! - [`config`] and [`bootstrap`]: TOML configuration and wiring
//! - [`server`]: the warp HTTP front end
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use switchboard::agent::builtin::EchoAgent;
//! use switchboard::{AgentRegistry, ChainRouter, DispatchSettings, Dispatcher, SingleAgentRouter};
//!
//! # tokio_test::block_on(async {
//! let registry = AgentRegistry::new()
//!     .with_agent(Arc::new(EchoAgent::new()))
//!     .unwrap();
//!
//! let chain = ChainRouter::new(vec![Box::new(SingleAgentRouter::new("echo"))]);
//! let dispatcher =
//!     Dispatcher::new(Arc::new(registry), Box::new(chain), DispatchSettings::default()).unwrap();
//!
//! let response = dispatcher.dispatch_text("hello").await;
//! assert_eq!(response.text(), "hello");
//! assert!(response.understood());
//! # });
//! ```

pub mod agent;
pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod observability;
pub mod protocol;
pub mod routing;
pub mod server;
pub mod testing;

pub use agent::{Agent, AgentRegistry};
pub use config::AppConfig;
pub use dispatcher::{DispatchSettings, Dispatcher};
pub use error::{RegistryError, RouterError, SwitchboardError, SwitchboardResult};
pub use protocol::*;
pub use routing::{ChainRouter, KeywordRouter, PatternRouter, Router, SingleAgentRouter};

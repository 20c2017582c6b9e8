//! Routing infrastructure
//!
//! The [`Router`] trait is the selection contract. Strategy routers
//! ([`SingleAgentRouter`], [`KeywordRouter`], [`PatternRouter`]) each apply
//! one heuristic; [`ChainRouter`] composes them as an ordered fallback where
//! the first non-empty answer wins.

pub mod chain_router;
pub mod keyword_router;
pub mod pattern_router;
pub mod router;
pub mod single_agent_router;

pub use chain_router::ChainRouter;
pub use keyword_router::{KeywordRouter, KeywordRule};
pub use pattern_router::{PatternRouter, PatternRule};
pub use router::Router;
pub use single_agent_router::SingleAgentRouter;

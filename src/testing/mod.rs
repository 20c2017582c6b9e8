//! Testing utilities and mock implementations
//!
//! Mock agents, routers, and HTTP clients for exercising routing and dispatch
//! without third-party services.

pub mod mocks;

pub use mocks::*;

//! Message types shared by agents, routers, and the dispatcher

pub mod messages;

pub use messages::*;

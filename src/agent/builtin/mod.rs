//! Built-in agents

pub mod clock;
pub mod echo;
pub mod movies;

pub use clock::ClockAgent;
pub use echo::EchoAgent;
pub use movies::{MovieField, MoviesAgent, MoviesAgentConfig};

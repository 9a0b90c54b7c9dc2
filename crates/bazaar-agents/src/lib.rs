pub mod consumer;
pub mod error;
mod pacing;
pub mod producer;

pub mod test_support;

pub use consumer::ConsumerAgent;
pub use error::AgentError;
pub use producer::{ProducerAgent, ProducerOutcome};

use serde::{Deserialize, Serialize};

/// Top-level configuration for a bazaar session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BazaarConfig {
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// How the marketplace guards its shared state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LockingStrategy {
    /// One lock over every producer and cart.
    Coarse,
    /// One lock per producer and per cart.
    #[default]
    Sharded,
}

/// Configuration for the marketplace core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketConfig {
    /// Publish slots granted to every producer at registration.
    #[serde(default = "default_queue_size")]
    pub queue_size_per_producer: usize,
    #[serde(default)]
    pub locking: LockingStrategy,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            queue_size_per_producer: default_queue_size(),
            locking: LockingStrategy::default(),
        }
    }
}

/// Configuration for running producers and consumers against a market.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Cancel the whole session after this many seconds. None = run until consumers finish.
    #[serde(default)]
    pub total_timeout_seconds: Option<u64>,
    /// Retry wait used by scripts that do not set their own.
    #[serde(default = "default_retry_wait_ms")]
    pub default_retry_wait_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_timeout_seconds: None,
            default_retry_wait_ms: default_retry_wait_ms(),
        }
    }
}

fn default_queue_size() -> usize {
    8
}
fn default_retry_wait_ms() -> u64 {
    100
}

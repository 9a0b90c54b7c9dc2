use bazaar_models::{CartId, ProducerId};
use thiserror::Error;

/// Caller-contract violations and lock failures.
///
/// Transient unavailability (no capacity, item not in stock, nothing to
/// remove) is never an error; it is reported as `Ok(false)`.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Unknown producer: {0}")]
    UnknownProducer(ProducerId),

    #[error("Unknown cart: {0}")]
    UnknownCart(CartId),

    #[error("Cart already checked out: {0}")]
    CartCheckedOut(CartId),

    #[error("queue_size_per_producer must be positive, got {0}")]
    InvalidCapacity(usize),

    #[error("Marketplace lock poisoned: {0}")]
    Poisoned(String),
}

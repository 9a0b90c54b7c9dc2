use bazaar_models::{CartId, ProducerId, Product, Purchase};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// The shared marketplace between producers and consumers.
///
/// Every method is a single critical section: a check and the mutation it
/// guards are never split across two lock acquisitions, and an operation either
/// applies all of its effect or none of it. `Ok(false)` means "try again later".
pub trait Marketplace: Send + Sync {
    /// Mint the next producer id and give it a full set of publish slots.
    fn register_producer(&self) -> Result<ProducerId, MarketError>;

    /// Stage `product` in the producer's inventory if it has a free slot.
    fn publish(&self, producer_id: ProducerId, product: Product) -> Result<bool, MarketError>;

    fn new_cart(&self) -> Result<CartId, MarketError>;

    /// Move one matching product from the lowest-id producer holding it into the cart.
    /// Returns `Ok(false)` when no producer has it or the cart does not exist.
    fn add_to_cart(&self, cart_id: CartId, product: &Product) -> Result<bool, MarketError>;

    /// Return the first matching cart line to the producer it came from.
    /// Returns `Ok(false)` when the cart holds no such product or does not exist.
    fn remove_from_cart(&self, cart_id: CartId, product: &Product) -> Result<bool, MarketError>;

    /// Close the cart and hand back its lines in the order they were added.
    fn checkout(&self, cart_id: CartId) -> Result<Vec<Purchase>, MarketError>;

    /// Read a producer's capacity and inventory size together.
    fn producer_stock(&self, producer_id: ProducerId) -> Result<ProducerStock, MarketError>;
}

/// Point-in-time view of one producer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProducerStock {
    /// Remaining publish slots. Negative when returned cart items overfilled the inventory.
    pub capacity: i64,
    /// Unreserved items currently staged.
    pub inventory: usize,
}

impl ProducerStock {
    /// Capacity plus inventory. Stays equal to the configured ceiling.
    pub fn footprint(&self) -> i64 {
        self.capacity + self.inventory as i64
    }
}

pub(crate) fn ceiling_from(queue_size_per_producer: usize) -> Result<i64, MarketError> {
    match i64::try_from(queue_size_per_producer) {
        Ok(ceiling) if ceiling > 0 => Ok(ceiling),
        _ => Err(MarketError::InvalidCapacity(queue_size_per_producer)),
    }
}

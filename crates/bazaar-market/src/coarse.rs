use std::sync::{Mutex, MutexGuard};

use bazaar_models::{CartId, ProducerId, Product, Purchase};
use tracing::{debug, info};

use crate::error::MarketError;
use crate::marketplace::{ceiling_from, Marketplace, ProducerStock};
use crate::slot::{CartSlot, ProducerSlot};

#[derive(Debug, Default)]
struct Ledger {
    producers: Vec<ProducerSlot>,
    carts: Vec<CartSlot>,
}

/// Marketplace guarded by a single mutex.
///
/// Every operation, registration and cart creation included, runs inside the
/// same critical section. Slot vectors are indexed by `id - 1`.
pub struct CoarseMarketplace {
    ceiling: i64,
    ledger: Mutex<Ledger>,
}

impl CoarseMarketplace {
    pub fn new(queue_size_per_producer: usize) -> Result<Self, MarketError> {
        Ok(Self {
            ceiling: ceiling_from(queue_size_per_producer)?,
            ledger: Mutex::new(Ledger::default()),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, MarketError> {
        self.ledger
            .lock()
            .map_err(|e| MarketError::Poisoned(format!("ledger mutex poisoned: {e}")))
    }
}

impl Ledger {
    fn producer_mut(&mut self, id: ProducerId) -> Result<&mut ProducerSlot, MarketError> {
        id.index()
            .and_then(|i| self.producers.get_mut(i))
            .ok_or(MarketError::UnknownProducer(id))
    }
}

impl Marketplace for CoarseMarketplace {
    fn register_producer(&self) -> Result<ProducerId, MarketError> {
        let mut ledger = self.lock()?;
        ledger.producers.push(ProducerSlot::new(self.ceiling));
        let id = ProducerId(ledger.producers.len() as u64);
        info!(producer = %id, "Registered producer");
        Ok(id)
    }

    fn publish(&self, producer_id: ProducerId, product: Product) -> Result<bool, MarketError> {
        let mut ledger = self.lock()?;
        let slot = ledger.producer_mut(producer_id)?;
        debug!(producer = %producer_id, product = %product, "Publish requested");
        let published = slot.try_publish(product);
        if !published {
            debug!(producer = %producer_id, "Publish rejected, no free slot");
        }
        Ok(published)
    }

    fn new_cart(&self) -> Result<CartId, MarketError> {
        let mut ledger = self.lock()?;
        ledger.carts.push(CartSlot::default());
        let id = CartId(ledger.carts.len() as u64);
        info!(cart = %id, "Opened cart");
        Ok(id)
    }

    fn add_to_cart(&self, cart_id: CartId, product: &Product) -> Result<bool, MarketError> {
        let mut guard = self.lock()?;
        let ledger = &mut *guard;
        let Some(cart) = cart_id.index().and_then(|i| ledger.carts.get_mut(i)) else {
            debug!(cart = %cart_id, "Add to unknown cart");
            return Ok(false);
        };
        cart.ensure_open(cart_id)?;

        for (i, producer) in ledger.producers.iter_mut().enumerate() {
            if producer.take(product) {
                let producer_id = ProducerId(i as u64 + 1);
                cart.push(producer_id, product.clone());
                debug!(cart = %cart_id, producer = %producer_id, product = %product, "Added to cart");
                return Ok(true);
            }
        }

        debug!(cart = %cart_id, product = %product, "Product not in stock");
        Ok(false)
    }

    fn remove_from_cart(&self, cart_id: CartId, product: &Product) -> Result<bool, MarketError> {
        let mut guard = self.lock()?;
        let ledger = &mut *guard;
        let Some(cart) = cart_id.index().and_then(|i| ledger.carts.get_mut(i)) else {
            debug!(cart = %cart_id, "Remove from unknown cart");
            return Ok(false);
        };
        cart.ensure_open(cart_id)?;

        let Some((pos, producer_id)) = cart.find(product) else {
            debug!(cart = %cart_id, product = %product, "Product not in cart");
            return Ok(false);
        };
        let producer = producer_id
            .index()
            .and_then(|i| ledger.producers.get_mut(i))
            .ok_or(MarketError::UnknownProducer(producer_id))?;

        let line = cart.remove_at(pos);
        producer.restore(line.product);
        debug!(cart = %cart_id, producer = %producer_id, product = %product, "Removed from cart");
        Ok(true)
    }

    fn checkout(&self, cart_id: CartId) -> Result<Vec<Purchase>, MarketError> {
        let mut ledger = self.lock()?;
        let cart = cart_id
            .index()
            .and_then(|i| ledger.carts.get_mut(i))
            .ok_or(MarketError::UnknownCart(cart_id))?;
        let purchases = cart.checkout(cart_id)?;
        info!(cart = %cart_id, items = purchases.len(), "Checked out");
        Ok(purchases)
    }

    fn producer_stock(&self, producer_id: ProducerId) -> Result<ProducerStock, MarketError> {
        let mut ledger = self.lock()?;
        Ok(ledger.producer_mut(producer_id)?.stock())
    }
}

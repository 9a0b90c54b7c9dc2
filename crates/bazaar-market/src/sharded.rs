use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use bazaar_models::{CartId, ProducerId, Product, Purchase};
use tracing::{debug, info};

use crate::error::MarketError;
use crate::marketplace::{ceiling_from, Marketplace, ProducerStock};
use crate::slot::{CartSlot, ProducerSlot};

type Shared<T> = Arc<Mutex<T>>;

/// Marketplace with one lock per producer and one per cart.
///
/// Registration and cart creation take the write side of their registry and
/// nothing else. Publish locks a single producer. Add and remove lock the cart
/// first and then producers one at a time, lowest id first; no path locks a
/// producer before a cart, which keeps the lock graph acyclic.
pub struct ShardedMarketplace {
    ceiling: i64,
    producers: RwLock<Vec<Shared<ProducerSlot>>>,
    carts: RwLock<Vec<Shared<CartSlot>>>,
}

impl ShardedMarketplace {
    pub fn new(queue_size_per_producer: usize) -> Result<Self, MarketError> {
        Ok(Self {
            ceiling: ceiling_from(queue_size_per_producer)?,
            producers: RwLock::new(Vec::new()),
            carts: RwLock::new(Vec::new()),
        })
    }

    fn producer(&self, id: ProducerId) -> Result<Shared<ProducerSlot>, MarketError> {
        let producers = self
            .producers
            .read()
            .map_err(|e| MarketError::Poisoned(format!("producer registry poisoned: {e}")))?;
        id.index()
            .and_then(|i| producers.get(i))
            .cloned()
            .ok_or(MarketError::UnknownProducer(id))
    }

    /// Snapshot of every producer registered so far, in id order.
    fn all_producers(&self) -> Result<Vec<Shared<ProducerSlot>>, MarketError> {
        self.producers
            .read()
            .map(|producers| producers.clone())
            .map_err(|e| MarketError::Poisoned(format!("producer registry poisoned: {e}")))
    }

    fn cart(&self, id: CartId) -> Result<Option<Shared<CartSlot>>, MarketError> {
        let carts = self
            .carts
            .read()
            .map_err(|e| MarketError::Poisoned(format!("cart registry poisoned: {e}")))?;
        Ok(id.index().and_then(|i| carts.get(i)).cloned())
    }
}

fn lock<'a, T>(slot: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, MarketError> {
    slot.lock()
        .map_err(|e| MarketError::Poisoned(format!("{what} mutex poisoned: {e}")))
}

impl Marketplace for ShardedMarketplace {
    fn register_producer(&self) -> Result<ProducerId, MarketError> {
        let mut producers = self
            .producers
            .write()
            .map_err(|e| MarketError::Poisoned(format!("producer registry poisoned: {e}")))?;
        producers.push(Arc::new(Mutex::new(ProducerSlot::new(self.ceiling))));
        let id = ProducerId(producers.len() as u64);
        info!(producer = %id, "Registered producer");
        Ok(id)
    }

    fn publish(&self, producer_id: ProducerId, product: Product) -> Result<bool, MarketError> {
        let slot = self.producer(producer_id)?;
        let mut slot = lock(&slot, "producer")?;
        debug!(producer = %producer_id, product = %product, "Publish requested");
        let published = slot.try_publish(product);
        if !published {
            debug!(producer = %producer_id, "Publish rejected, no free slot");
        }
        Ok(published)
    }

    fn new_cart(&self) -> Result<CartId, MarketError> {
        let mut carts = self
            .carts
            .write()
            .map_err(|e| MarketError::Poisoned(format!("cart registry poisoned: {e}")))?;
        carts.push(Arc::new(Mutex::new(CartSlot::default())));
        let id = CartId(carts.len() as u64);
        info!(cart = %id, "Opened cart");
        Ok(id)
    }

    fn add_to_cart(&self, cart_id: CartId, product: &Product) -> Result<bool, MarketError> {
        let Some(cart) = self.cart(cart_id)? else {
            debug!(cart = %cart_id, "Add to unknown cart");
            return Ok(false);
        };
        let mut cart = lock(&cart, "cart")?;
        cart.ensure_open(cart_id)?;

        for (i, producer) in self.all_producers()?.iter().enumerate() {
            let mut producer = lock(producer, "producer")?;
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
        let Some(cart) = self.cart(cart_id)? else {
            debug!(cart = %cart_id, "Remove from unknown cart");
            return Ok(false);
        };
        let mut cart = lock(&cart, "cart")?;
        cart.ensure_open(cart_id)?;

        let Some((pos, producer_id)) = cart.find(product) else {
            debug!(cart = %cart_id, product = %product, "Product not in cart");
            return Ok(false);
        };
        let producer = self.producer(producer_id)?;
        let mut producer = lock(&producer, "producer")?;

        let line = cart.remove_at(pos);
        producer.restore(line.product);
        debug!(cart = %cart_id, producer = %producer_id, product = %product, "Removed from cart");
        Ok(true)
    }

    fn checkout(&self, cart_id: CartId) -> Result<Vec<Purchase>, MarketError> {
        let cart = self
            .cart(cart_id)?
            .ok_or(MarketError::UnknownCart(cart_id))?;
        let purchases = lock(&cart, "cart")?.checkout(cart_id)?;
        info!(cart = %cart_id, items = purchases.len(), "Checked out");
        Ok(purchases)
    }

    fn producer_stock(&self, producer_id: ProducerId) -> Result<ProducerStock, MarketError> {
        let slot = self.producer(producer_id)?;
        let stock = lock(&slot, "producer")?.stock();
        Ok(stock)
    }
}

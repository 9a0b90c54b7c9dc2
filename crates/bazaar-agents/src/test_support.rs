//! Test doubles for exercising agents against a marketplace whose answers can be
//! inspected and nudged.
//!
//! `RecordingMarketplace` delegates to a real [`CoarseMarketplace`] and keeps a
//! log of every call with its outcome. It can also be told to turn away the
//! next N add-to-cart requests so retry loops can be observed deterministically.

use std::sync::{Mutex, MutexGuard};

use bazaar_market::{CoarseMarketplace, MarketError, Marketplace, ProducerStock};
use bazaar_models::{CartId, ProducerId, Product, Purchase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RegisterProducer(ProducerId),
    Publish { producer_id: ProducerId, accepted: bool },
    NewCart(CartId),
    AddToCart { cart_id: CartId, accepted: bool },
    RemoveFromCart { cart_id: CartId, accepted: bool },
    Checkout { cart_id: CartId, lines: usize },
}

pub struct RecordingMarketplace {
    inner: CoarseMarketplace,
    calls: Mutex<Vec<Call>>,
    pending_add_rejections: Mutex<u32>,
}

impl RecordingMarketplace {
    pub fn new(queue_size_per_producer: usize) -> Result<Self, MarketError> {
        Ok(Self {
            inner: CoarseMarketplace::new(queue_size_per_producer)?,
            calls: Mutex::new(Vec::new()),
            pending_add_rejections: Mutex::new(0),
        })
    }

    /// Answer `false` to the next `count` add-to-cart calls without touching state.
    pub fn reject_next_adds(&self, count: u32) {
        if let Ok(mut pending) = self.pending_add_rejections.lock() {
            *pending = count;
        }
    }

    /// Register a producer and publish `units` copies of `product` straight away.
    pub fn seed(&self, product: &Product, units: usize) -> Result<ProducerId, MarketError> {
        let producer_id = self.inner.register_producer()?;
        for _ in 0..units {
            self.inner.publish(producer_id, product.clone())?;
        }
        Ok(producer_id)
    }

    pub fn calls(&self) -> Vec<Call> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    fn log(&self) -> Result<MutexGuard<'_, Vec<Call>>, MarketError> {
        self.calls
            .lock()
            .map_err(|e| MarketError::Poisoned(format!("call log poisoned: {e}")))
    }

    fn take_rejection(&self) -> Result<bool, MarketError> {
        let mut pending = self
            .pending_add_rejections
            .lock()
            .map_err(|e| MarketError::Poisoned(format!("rejection counter poisoned: {e}")))?;
        if *pending > 0 {
            *pending -= 1;
            return Ok(true);
        }
        Ok(false)
    }
}

impl Marketplace for RecordingMarketplace {
    fn register_producer(&self) -> Result<ProducerId, MarketError> {
        let id = self.inner.register_producer()?;
        self.log()?.push(Call::RegisterProducer(id));
        Ok(id)
    }

    fn publish(&self, producer_id: ProducerId, product: Product) -> Result<bool, MarketError> {
        let accepted = self.inner.publish(producer_id, product)?;
        self.log()?.push(Call::Publish {
            producer_id,
            accepted,
        });
        Ok(accepted)
    }

    fn new_cart(&self) -> Result<CartId, MarketError> {
        let id = self.inner.new_cart()?;
        self.log()?.push(Call::NewCart(id));
        Ok(id)
    }

    fn add_to_cart(&self, cart_id: CartId, product: &Product) -> Result<bool, MarketError> {
        let accepted = if self.take_rejection()? {
            false
        } else {
            self.inner.add_to_cart(cart_id, product)?
        };
        self.log()?.push(Call::AddToCart { cart_id, accepted });
        Ok(accepted)
    }

    fn remove_from_cart(&self, cart_id: CartId, product: &Product) -> Result<bool, MarketError> {
        let accepted = self.inner.remove_from_cart(cart_id, product)?;
        self.log()?.push(Call::RemoveFromCart { cart_id, accepted });
        Ok(accepted)
    }

    fn checkout(&self, cart_id: CartId) -> Result<Vec<Purchase>, MarketError> {
        let purchases = self.inner.checkout(cart_id)?;
        self.log()?.push(Call::Checkout {
            cart_id,
            lines: purchases.len(),
        });
        Ok(purchases)
    }

    fn producer_stock(&self, producer_id: ProducerId) -> Result<ProducerStock, MarketError> {
        self.inner.producer_stock(producer_id)
    }
}

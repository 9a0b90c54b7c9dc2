//! Per-producer and per-cart state shared by both marketplace implementations.
//! Callers hold whatever lock guards a slot; the methods here do the
//! check-and-mutate work in one step.

use bazaar_models::{CartId, ProducerId, Product, Purchase};

use crate::error::MarketError;
use crate::marketplace::ProducerStock;

#[derive(Debug)]
pub(crate) struct ProducerSlot {
    capacity: i64,
    inventory: Vec<Product>,
}

impl ProducerSlot {
    pub(crate) fn new(ceiling: i64) -> Self {
        Self {
            capacity: ceiling,
            inventory: Vec::new(),
        }
    }

    pub(crate) fn try_publish(&mut self, product: Product) -> bool {
        if self.capacity <= 0 {
            return false;
        }
        self.inventory.push(product);
        self.capacity -= 1;
        true
    }

    /// Remove the first equal item and free its slot.
    pub(crate) fn take(&mut self, product: &Product) -> bool {
        match self.inventory.iter().position(|p| p == product) {
            Some(pos) => {
                self.inventory.remove(pos);
                self.capacity += 1;
                true
            }
            None => false,
        }
    }

    /// Put a product back from a cart, consuming a slot.
    pub(crate) fn restore(&mut self, product: Product) {
        self.inventory.push(product);
        self.capacity -= 1;
    }

    pub(crate) fn stock(&self) -> ProducerStock {
        ProducerStock {
            capacity: self.capacity,
            inventory: self.inventory.len(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CartSlot {
    lines: Vec<Purchase>,
    checked_out: bool,
}

impl CartSlot {
    pub(crate) fn ensure_open(&self, cart_id: CartId) -> Result<(), MarketError> {
        if self.checked_out {
            return Err(MarketError::CartCheckedOut(cart_id));
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, producer_id: ProducerId, product: Product) {
        self.lines.push(Purchase {
            producer_id,
            product,
        });
    }

    /// Index and producer of the first line holding `product`.
    pub(crate) fn find(&self, product: &Product) -> Option<(usize, ProducerId)> {
        self.lines
            .iter()
            .position(|line| &line.product == product)
            .map(|pos| (pos, self.lines[pos].producer_id))
    }

    pub(crate) fn remove_at(&mut self, pos: usize) -> Purchase {
        self.lines.remove(pos)
    }

    pub(crate) fn checkout(&mut self, cart_id: CartId) -> Result<Vec<Purchase>, MarketError> {
        self.ensure_open(cart_id)?;
        self.checked_out = true;
        Ok(std::mem::take(&mut self.lines))
    }
}

use std::sync::Arc;
use std::time::Duration;

use bazaar_market::Marketplace;
use bazaar_models::{CartId, CartStep, OperationKind, Product, Receipt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::pacing::pause;

/// Runs a consumer's cart scripts one cart at a time.
pub struct ConsumerAgent {
    name: String,
    market: Arc<dyn Marketplace>,
    carts: Vec<Vec<CartStep>>,
    retry_wait: Duration,
}

impl ConsumerAgent {
    pub fn new(
        name: String,
        market: Arc<dyn Marketplace>,
        carts: Vec<Vec<CartStep>>,
        retry_wait: Duration,
    ) -> Self {
        Self {
            name,
            market,
            carts,
            retry_wait,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open, fill and check out every scripted cart in order.
    ///
    /// Adds are retried every `retry_wait` until stock shows up; removes are
    /// issued once. Returns one receipt per cart.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Vec<Receipt>, AgentError> {
        let mut receipts = Vec::with_capacity(self.carts.len());

        for script in &self.carts {
            let cart_id = self.market.new_cart()?;
            debug!(consumer = %self.name, cart = %cart_id, ops = script.len(), "Filling cart");

            for step in script {
                match step.kind {
                    OperationKind::Add => {
                        for _ in 0..step.quantity {
                            self.add_one(cart_id, &step.product, cancel).await?;
                        }
                    }
                    OperationKind::Remove => {
                        for _ in 0..step.quantity {
                            if !self.market.remove_from_cart(cart_id, &step.product)? {
                                warn!(
                                    consumer = %self.name,
                                    cart = %cart_id,
                                    product = %step.product,
                                    "Nothing to remove"
                                );
                            }
                        }
                    }
                }
            }

            let purchases = self.market.checkout(cart_id)?;
            for purchase in &purchases {
                info!(consumer = %self.name, product = %purchase.product, "Bought");
            }
            receipts.push(Receipt {
                consumer: self.name.clone(),
                cart_id,
                purchases,
                checked_out_at: chrono::Utc::now(),
            });
        }

        Ok(receipts)
    }

    async fn add_one(
        &self,
        cart_id: CartId,
        product: &Product,
        cancel: &CancellationToken,
    ) -> Result<(), AgentError> {
        let mut attempts = 1u32;
        while !self.market.add_to_cart(cart_id, product)? {
            if !pause(cancel, self.retry_wait).await {
                return Err(AgentError::Cancelled(format!(
                    "{} waiting for {product} in cart {cart_id}",
                    self.name
                )));
            }
            attempts += 1;
        }
        if attempts > 1 {
            debug!(consumer = %self.name, cart = %cart_id, attempts, "Added after retries");
        }
        Ok(())
    }
}

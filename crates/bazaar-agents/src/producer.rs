use std::sync::Arc;
use std::time::Duration;

use bazaar_market::Marketplace;
use bazaar_models::{ProducerId, ProductionStep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::pacing::pause;

/// Keeps a producer's inventory topped up by cycling through its production plan.
pub struct ProducerAgent {
    name: String,
    producer_id: ProducerId,
    market: Arc<dyn Marketplace>,
    plan: Vec<ProductionStep>,
    republish_wait: Duration,
}

/// How a producer's run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerOutcome {
    pub name: String,
    pub producer_id: ProducerId,
    pub published: u64,
}

impl ProducerAgent {
    /// Register with the marketplace. The id is fixed from here on.
    pub fn register(
        name: String,
        market: Arc<dyn Marketplace>,
        plan: Vec<ProductionStep>,
        republish_wait: Duration,
    ) -> Result<Self, AgentError> {
        let producer_id = market.register_producer()?;
        info!(producer = %name, id = %producer_id, steps = plan.len(), "Producer registered");
        Ok(Self {
            name,
            producer_id,
            market,
            plan,
            republish_wait,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn producer_id(&self) -> ProducerId {
        self.producer_id
    }

    /// Publish the plan over and over until cancelled.
    ///
    /// After each accepted unit the agent waits the step's production time;
    /// after a rejection it waits `republish_wait` and offers the same unit again.
    pub async fn run(&self, cancel: CancellationToken) -> Result<ProducerOutcome, AgentError> {
        let mut published = 0u64;

        if self.plan.is_empty() {
            cancel.cancelled().await;
            return Ok(self.outcome(published));
        }

        loop {
            for step in &self.plan {
                for _ in 0..step.quantity {
                    loop {
                        if self.market.publish(self.producer_id, step.product.clone())? {
                            published += 1;
                            if !pause(&cancel, step.production_time).await {
                                return Ok(self.outcome(published));
                            }
                            break;
                        }
                        debug!(producer = %self.name, product = %step.product, "Inventory full, waiting");
                        if !pause(&cancel, self.republish_wait).await {
                            return Ok(self.outcome(published));
                        }
                    }
                }
            }
        }
    }

    fn outcome(&self, published: u64) -> ProducerOutcome {
        info!(producer = %self.name, published, "Producer stopped");
        ProducerOutcome {
            name: self.name.clone(),
            producer_id: self.producer_id,
            published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, RecordingMarketplace};
    use bazaar_models::{Product, Tea};

    fn mint() -> Product {
        Product::Tea(Tea {
            name: "Mint".to_string(),
            price: 2,
            tea_type: "Herbal".to_string(),
        })
    }

    #[tokio::test]
    async fn fills_inventory_then_retries_until_cancelled() {
        let market = Arc::new(RecordingMarketplace::new(3).unwrap());
        let agent = ProducerAgent::register(
            "prod1".to_string(),
            market.clone(),
            vec![ProductionStep {
                product: mint(),
                quantity: 2,
                production_time: Duration::ZERO,
            }],
            Duration::from_millis(1),
        )
        .unwrap();
        assert_eq!(agent.producer_id(), ProducerId(1));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let probe = market.clone();
        tokio::spawn(async move {
            while probe.count(|c| matches!(c, Call::Publish { accepted: false, .. })) < 3 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            trigger.cancel();
        });

        let outcome = agent.run(cancel).await.unwrap();
        assert_eq!(outcome.published, 3);
        assert_eq!(outcome.name, "prod1");

        let stock = market.producer_stock(ProducerId(1)).unwrap();
        assert_eq!(stock.capacity, 0);
        assert_eq!(stock.inventory, 3);
    }

    #[tokio::test]
    async fn empty_plan_idles_until_cancelled() {
        let market = Arc::new(RecordingMarketplace::new(1).unwrap());
        let agent = ProducerAgent::register(
            "idle".to_string(),
            market.clone(),
            vec![],
            Duration::from_millis(1),
        )
        .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = agent.run(cancel).await.unwrap();
        assert_eq!(outcome.published, 0);
        assert_eq!(market.count(|c| matches!(c, Call::Publish { .. })), 0);
    }
}

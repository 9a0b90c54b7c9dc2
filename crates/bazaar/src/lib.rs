//! Bazaar - a shared marketplace between concurrent producers and consumers.
//!
//! Producers publish products into bounded per-producer inventories; consumers
//! fill carts from whatever is on offer and check out. All coordination lives in
//! the [`Marketplace`](market::Marketplace) implementations.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use bazaar::models::{BazaarConfig, Scenario};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo(json: &str) -> anyhow::Result<()> {
//! let scenario = Scenario::from_json(json)?;
//! let report = bazaar::run_session(&BazaarConfig::default(), &scenario, CancellationToken::new()).await?;
//! for receipt in &report.receipts {
//!     for line in receipt.report_lines() {
//!         println!("{line}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub use bazaar_agents as agents;
pub use bazaar_market as market;
pub use bazaar_models as models;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bazaar_agents::{ConsumerAgent, ProducerAgent};
use bazaar_market::{CoarseMarketplace, MarketError, Marketplace, ProducerStock, ShardedMarketplace};
use bazaar_models::{BazaarConfig, LockingStrategy, MarketConfig, ProducerId, Receipt, Scenario};
use serde::Serialize;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Everything a finished session produced.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Receipts grouped by consumer in script order, carts in the order they ran.
    pub receipts: Vec<Receipt>,
    pub producers: Vec<ProducerSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProducerSummary {
    pub name: String,
    pub producer_id: ProducerId,
    pub published: u64,
    /// Stock left behind when the session ended.
    pub stock: ProducerStock,
}

impl SessionReport {
    pub fn units_sold(&self) -> usize {
        self.receipts.iter().map(|r| r.purchases.len()).sum()
    }
}

/// Build the marketplace implementation selected by configuration.
pub fn build_marketplace(config: &MarketConfig) -> Result<Arc<dyn Marketplace>, MarketError> {
    let market: Arc<dyn Marketplace> = match config.locking {
        LockingStrategy::Coarse => Arc::new(CoarseMarketplace::new(config.queue_size_per_producer)?),
        LockingStrategy::Sharded => {
            Arc::new(ShardedMarketplace::new(config.queue_size_per_producer)?)
        }
    };
    Ok(market)
}

/// Cancel `session` after `timeout` unless it ends first.
fn spawn_deadline(session: CancellationToken, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = session.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout_seconds = timeout.as_secs(), "Session timed out");
                session.cancel();
            }
        }
    })
}

/// Run every producer and consumer in `scenario` against a fresh marketplace.
///
/// Producers run until the last consumer has checked out its last cart, then
/// they are cancelled. Cancelling `cancel` (or hitting the configured total
/// timeout) aborts the session with an error.
pub async fn run_session(
    config: &BazaarConfig,
    scenario: &Scenario,
    cancel: CancellationToken,
) -> Result<SessionReport, anyhow::Error> {
    scenario.validate().context("Invalid scenario")?;

    let mut market_config = config.market.clone();
    if let Some(queue_size) = scenario.queue_size_per_producer {
        market_config.queue_size_per_producer = queue_size;
    }
    let market = build_marketplace(&market_config).context("Failed to build marketplace")?;
    let fallback_wait = Duration::from_millis(config.session.default_retry_wait_ms);

    let session = cancel.child_token();
    // Every return path below, early `?` included, tears the session down.
    let _session_guard = session.clone().drop_guard();
    if let Some(secs) = config.session.total_timeout_seconds {
        spawn_deadline(session.clone(), Duration::from_secs(secs));
    }

    info!(
        producers = scenario.producers.len(),
        consumers = scenario.consumers.len(),
        queue_size = market_config.queue_size_per_producer,
        locking = ?market_config.locking,
        "Session starting"
    );

    // Producers register in script order so prod{n} gets id n.
    let production = session.child_token();
    let mut producers = JoinSet::new();
    for (i, script) in scenario.producers.iter().enumerate() {
        let name = script.display_name(i);
        let plan = scenario.resolve_production(script, &name)?;
        let republish_wait = script.republish_wait(&name, fallback_wait)?;
        let agent = ProducerAgent::register(name, Arc::clone(&market), plan, republish_wait)?;
        let token = production.clone();
        producers.spawn(async move { agent.run(token).await });
    }

    let mut consumers = JoinSet::new();
    for (i, script) in scenario.consumers.iter().enumerate() {
        let name = script.display_name(i);
        let carts = scenario.resolve_carts(script, &name)?;
        let retry_wait = script.retry_wait(&name, fallback_wait)?;
        let agent = ConsumerAgent::new(name, Arc::clone(&market), carts, retry_wait);
        let token = session.clone();
        consumers.spawn(async move { (i, agent.run(&token).await) });
    }

    let mut per_consumer: Vec<Vec<Receipt>> = vec![Vec::new(); scenario.consumers.len()];
    while let Some(joined) = consumers.join_next().await {
        let (i, result) = joined.context("Consumer task panicked")?;
        match result {
            Ok(receipts) => per_consumer[i] = receipts,
            Err(e) => return Err(e).context("Consumer failed"),
        }
    }

    production.cancel();
    let mut summaries = Vec::with_capacity(scenario.producers.len());
    while let Some(joined) = producers.join_next().await {
        let outcome = joined.context("Producer task panicked")??;
        let stock = market.producer_stock(outcome.producer_id)?;
        summaries.push(ProducerSummary {
            name: outcome.name,
            producer_id: outcome.producer_id,
            published: outcome.published,
            stock,
        });
    }
    summaries.sort_by_key(|s| s.producer_id);

    let report = SessionReport {
        receipts: per_consumer.into_iter().flatten().collect(),
        producers: summaries,
    };
    info!(
        receipts = report.receipts.len(),
        sold = report.units_sold(),
        "Session complete"
    );
    Ok(report)
}

//! Integration tests: producer and consumer agents sharing a real marketplace.
//!
//! Run with:
//! ```bash
//! cargo test -p bazaar-agents --test sessions
//! ```

use std::sync::Arc;
use std::time::Duration;

use bazaar_agents::{AgentError, ConsumerAgent, ProducerAgent};
use bazaar_market::{Marketplace, ShardedMarketplace};
use bazaar_models::{CartStep, Coffee, OperationKind, Product, ProductionStep, RoastLevel, Tea};
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

fn ethiopia() -> Product {
    Product::Coffee(Coffee {
        name: "Ethiopia".to_string(),
        price: 10,
        acidity: dec!(5.09),
        roast_level: RoastLevel::High,
    })
}

fn wild_cherry() -> Product {
    Product::Tea(Tea {
        name: "Wild Cherry".to_string(),
        price: 5,
        tea_type: "Black".to_string(),
    })
}

fn add(product: Product, quantity: u32) -> CartStep {
    CartStep {
        kind: OperationKind::Add,
        product,
        quantity,
    }
}

/// A consumer that starts before any stock exists waits for the producer.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn consumer_waits_for_late_producer() {
    let market: Arc<dyn Marketplace> = Arc::new(ShardedMarketplace::new(2).unwrap());
    let cancel = CancellationToken::new();

    let consumer = ConsumerAgent::new(
        "cons1".to_string(),
        market.clone(),
        vec![vec![add(ethiopia(), 5)]],
        Duration::from_millis(2),
    );
    let consumer_cancel = cancel.clone();
    let consumer_task = tokio::spawn(async move { consumer.run(&consumer_cancel).await });

    tokio::time::sleep(Duration::from_millis(20)).await;

    let producer = ProducerAgent::register(
        "prod1".to_string(),
        market.clone(),
        vec![ProductionStep {
            product: ethiopia(),
            quantity: 1,
            production_time: Duration::from_millis(1),
        }],
        Duration::from_millis(2),
    )
    .unwrap();
    let producer_cancel = cancel.clone();
    let producer_task = tokio::spawn(async move { producer.run(producer_cancel).await });

    let receipts = tokio::time::timeout(Duration::from_secs(10), consumer_task)
        .await
        .expect("consumer never finished")
        .expect("consumer task panicked")
        .unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].purchases.len(), 5);
    assert!(receipts[0]
        .purchases
        .iter()
        .all(|p| p.product == ethiopia()));

    cancel.cancel();
    let outcome = producer_task
        .await
        .expect("producer task panicked")
        .unwrap();
    assert!(outcome.published >= 5);

    let stock = market.producer_stock(outcome.producer_id).unwrap();
    assert_eq!(stock.footprint(), 2);
    assert_eq!(outcome.published as usize, 5 + stock.inventory);
}

/// Several consumers compete for two producers' output; every unit bought is
/// accounted for by the producers.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn competing_consumers_share_producer_output() {
    let market: Arc<dyn Marketplace> = Arc::new(ShardedMarketplace::new(3).unwrap());
    let cancel = CancellationToken::new();

    let mut producers = tokio::task::JoinSet::new();
    for (name, product) in [("coffee", ethiopia()), ("tea", wild_cherry())] {
        let agent = ProducerAgent::register(
            name.to_string(),
            market.clone(),
            vec![ProductionStep {
                product,
                quantity: 2,
                production_time: Duration::from_millis(1),
            }],
            Duration::from_millis(1),
        )
        .unwrap();
        let token = cancel.clone();
        producers.spawn(async move { agent.run(token).await });
    }

    let mut consumers = tokio::task::JoinSet::new();
    for i in 0..4 {
        let agent = ConsumerAgent::new(
            format!("cons{}", i + 1),
            market.clone(),
            vec![
                vec![add(ethiopia(), 2), add(wild_cherry(), 1)],
                vec![add(wild_cherry(), 2)],
            ],
            Duration::from_millis(1),
        );
        let token = cancel.clone();
        consumers.spawn(async move { agent.run(&token).await });
    }

    let mut bought = 0usize;
    while let Some(joined) = tokio::time::timeout(Duration::from_secs(20), consumers.join_next())
        .await
        .expect("consumers never finished")
    {
        let receipts = joined.expect("consumer task panicked").unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].purchases.len(), 3);
        assert_eq!(receipts[1].purchases.len(), 2);
        bought += receipts.iter().map(|r| r.purchases.len()).sum::<usize>();
    }
    assert_eq!(bought, 20);

    cancel.cancel();
    let mut published = 0u64;
    let mut staged = 0usize;
    while let Some(joined) = producers.join_next().await {
        let outcome = joined.expect("producer task panicked").unwrap();
        let stock = market.producer_stock(outcome.producer_id).unwrap();
        assert_eq!(stock.footprint(), 3);
        published += outcome.published;
        staged += stock.inventory;
    }
    assert_eq!(published as usize, bought + staged);
}

/// A consumer asking for something nobody makes is stopped by cancellation.
#[tokio::test]
async fn starving_consumer_reports_cancellation() {
    let market: Arc<dyn Marketplace> = Arc::new(ShardedMarketplace::new(1).unwrap());
    let consumer = ConsumerAgent::new(
        "cons1".to_string(),
        market,
        vec![vec![add(wild_cherry(), 1)]],
        Duration::from_millis(1),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(15)).await;
        trigger.cancel();
    });

    match consumer.run(&cancel).await {
        Err(AgentError::Cancelled(reason)) => assert!(reason.contains("cons1")),
        other => panic!("expected cancellation, got {other:?}"),
    }
}

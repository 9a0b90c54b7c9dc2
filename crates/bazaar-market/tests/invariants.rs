//! Property tests: random operation sequences applied to both marketplaces.
//!
//! The two implementations must agree on every result, every producer's
//! capacity plus inventory must stay at the ceiling, and every published unit
//! must be accounted for in exactly one place.

use bazaar_market::{CoarseMarketplace, MarketError, Marketplace, ShardedMarketplace};
use bazaar_models::{CartId, ProducerId, Product, Tea};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Register,
    Publish(u64, usize),
    NewCart,
    Add(u64, usize),
    Remove(u64, usize),
    Checkout(u64),
}

fn catalog(i: usize) -> Product {
    let names = ["Sencha", "Linden", "Rooibos"];
    Product::Tea(Tea {
        name: names[i % names.len()].to_string(),
        price: 3,
        tea_type: "Loose".to_string(),
    })
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::Register),
        4 => (1..5u64, 0..3usize).prop_map(|(p, i)| Op::Publish(p, i)),
        1 => Just(Op::NewCart),
        4 => (1..5u64, 0..3usize).prop_map(|(c, i)| Op::Add(c, i)),
        2 => (1..5u64, 0..3usize).prop_map(|(c, i)| Op::Remove(c, i)),
        1 => (1..5u64).prop_map(Op::Checkout),
    ]
}

/// Result of one operation in a form both implementations can be compared on.
#[derive(Debug, PartialEq)]
enum Outcome {
    Id(u64),
    Flag(bool),
    Lines(Vec<(ProducerId, Product)>),
    Failed(String),
}

fn failed(e: MarketError) -> Outcome {
    Outcome::Failed(e.to_string())
}

fn apply(market: &dyn Marketplace, op: &Op) -> Outcome {
    let result = match op {
        Op::Register => market.register_producer().map(|id| Outcome::Id(id.0)),
        Op::Publish(p, i) => market.publish(ProducerId(*p), catalog(*i)).map(Outcome::Flag),
        Op::NewCart => market.new_cart().map(|id| Outcome::Id(id.0)),
        Op::Add(c, i) => market.add_to_cart(CartId(*c), &catalog(*i)).map(Outcome::Flag),
        Op::Remove(c, i) => market
            .remove_from_cart(CartId(*c), &catalog(*i))
            .map(Outcome::Flag),
        Op::Checkout(c) => market.checkout(CartId(*c)).map(|lines| {
            Outcome::Lines(
                lines
                    .into_iter()
                    .map(|l| (l.producer_id, l.product))
                    .collect(),
            )
        }),
    };
    result.unwrap_or_else(failed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn implementations_agree_and_conserve_units(
        ceiling in 1usize..4,
        ops in prop::collection::vec(op_strategy(), 1..120),
    ) {
        let coarse = CoarseMarketplace::new(ceiling).unwrap();
        let sharded = ShardedMarketplace::new(ceiling).unwrap();

        let mut producers = 0u64;
        let mut published = 0usize;
        let mut in_carts = 0usize;
        let mut sold = 0usize;

        for op in &ops {
            let a = apply(&coarse, op);
            let b = apply(&sharded, op);
            prop_assert_eq!(&a, &b, "diverged on {:?}", op);

            match (op, &a) {
                (Op::Register, Outcome::Id(_)) => producers += 1,
                (Op::Publish(..), Outcome::Flag(true)) => published += 1,
                (Op::Add(..), Outcome::Flag(true)) => in_carts += 1,
                (Op::Remove(..), Outcome::Flag(true)) => in_carts -= 1,
                (Op::Checkout(_), Outcome::Lines(lines)) => {
                    in_carts -= lines.len();
                    sold += lines.len();
                }
                _ => {}
            }

            let mut staged = 0usize;
            for id in 1..=producers {
                let stock = coarse.producer_stock(ProducerId(id)).unwrap();
                prop_assert_eq!(stock, sharded.producer_stock(ProducerId(id)).unwrap());
                prop_assert_eq!(stock.footprint(), ceiling as i64);
                staged += stock.inventory;
            }
            prop_assert_eq!(published, staged + in_carts + sold);
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CartId, ProducerId};
use crate::product::Product;

/// One reserved line of a cart: the product and the producer whose stock it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Purchase {
    pub producer_id: ProducerId,
    pub product: Product,
}

/// What a consumer reports after checking a cart out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub consumer: String,
    pub cart_id: CartId,
    /// Purchases in the order they were added, net of removals.
    pub purchases: Vec<Purchase>,
    pub checked_out_at: DateTime<Utc>,
}

impl Receipt {
    /// Report lines in the `<consumer> bought <product>` format.
    pub fn report_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.purchases
            .iter()
            .map(move |p| format!("{} bought {}", self.consumer, p.product))
    }

    pub fn total_price(&self) -> u64 {
        self.purchases
            .iter()
            .map(|p| u64::from(p.product.price()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Tea;

    fn tea(name: &str, price: u32) -> Product {
        Product::Tea(Tea {
            name: name.to_string(),
            price,
            tea_type: "Herbal".to_string(),
        })
    }

    #[test]
    fn report_lines_follow_purchase_order() {
        let receipt = Receipt {
            consumer: "cons1".to_string(),
            cart_id: CartId(1),
            purchases: vec![
                Purchase {
                    producer_id: ProducerId(2),
                    product: tea("Linden", 9),
                },
                Purchase {
                    producer_id: ProducerId(1),
                    product: tea("Mint", 4),
                },
            ],
            checked_out_at: Utc::now(),
        };

        let lines: Vec<String> = receipt.report_lines().collect();
        assert_eq!(
            lines,
            vec![
                "cons1 bought Tea(name='Linden', price=9, type='Herbal')",
                "cons1 bought Tea(name='Mint', price=4, type='Herbal')",
            ]
        );
        assert_eq!(receipt.total_price(), 13);
    }

    #[test]
    fn empty_receipt_has_no_lines() {
        let receipt = Receipt {
            consumer: "cons2".to_string(),
            cart_id: CartId(4),
            purchases: vec![],
            checked_out_at: Utc::now(),
        };
        assert_eq!(receipt.report_lines().count(), 0);
        assert_eq!(receipt.total_price(), 0);
    }
}

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoastLevel {
    Light,
    Medium,
    High,
}

impl RoastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Light => "LIGHT",
            RoastLevel::Medium => "MEDIUM",
            RoastLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Coffee {
    pub name: String,
    pub price: u32,
    pub acidity: Decimal,
    pub roast_level: RoastLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tea {
    pub name: String,
    pub price: u32,
    #[serde(rename = "type")]
    pub tea_type: String,
}

/// An item offered on the marketplace.
///
/// Matching between carts and inventories is by value: two products are the
/// same item when every descriptive field is equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "product_type")]
pub enum Product {
    Coffee(Coffee),
    Tea(Tea),
}

impl Product {
    pub fn name(&self) -> &str {
        match self {
            Product::Coffee(c) => &c.name,
            Product::Tea(t) => &t.name,
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            Product::Coffee(c) => c.price,
            Product::Tea(t) => t.price,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Product::Coffee(c) => write!(
                f,
                "Coffee(name='{}', price={}, acidity='{}', roast_level='{}')",
                c.name,
                c.price,
                c.acidity.normalize(),
                c.roast_level.as_str()
            ),
            Product::Tea(t) => write!(
                f,
                "Tea(name='{}', price={}, type='{}')",
                t.name, t.price, t.tea_type
            ),
        }
    }
}

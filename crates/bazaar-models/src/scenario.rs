//! Scenario scripts: the products on offer, what each producer makes and what
//! each consumer puts in its carts.
//!
//! Scripts refer to products by key; the `resolve_*` methods turn them into
//! steps carrying the actual [`Product`] values the agents publish and buy.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;
use crate::product::Product;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    /// Overrides `MarketConfig::queue_size_per_producer` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_size_per_producer: Option<usize>,
    pub products: BTreeMap<String, Product>,
    #[serde(default)]
    pub producers: Vec<ProducerScript>,
    #[serde(default)]
    pub consumers: Vec<ConsumerScript>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProducerScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub products: Vec<ProductionEntry>,
    /// Seconds to wait after a rejected publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub republish_wait_time: Option<f64>,
}

/// `[product key, quantity, seconds to produce one unit]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "(String, u32, f64)", into = "(String, u32, f64)")]
pub struct ProductionEntry {
    pub product: String,
    pub quantity: u32,
    pub wait_time: f64,
}

impl From<(String, u32, f64)> for ProductionEntry {
    fn from((product, quantity, wait_time): (String, u32, f64)) -> Self {
        Self {
            product,
            quantity,
            wait_time,
        }
    }
}

impl From<ProductionEntry> for (String, u32, f64) {
    fn from(entry: ProductionEntry) -> Self {
        (entry.product, entry.quantity, entry.wait_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumerScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// One entry per cart, each an ordered list of operations.
    pub carts: Vec<Vec<CartOperation>>,
    /// Seconds to wait after a rejected add.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_wait_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Remove,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartOperation {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub product: String,
    pub quantity: u32,
}

/// A resolved production entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionStep {
    pub product: Product,
    pub quantity: u32,
    pub production_time: Duration,
}

/// A resolved cart operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CartStep {
    pub kind: OperationKind,
    pub product: Product,
    pub quantity: u32,
}

impl ProducerScript {
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("prod{}", index + 1))
    }

    pub fn republish_wait(&self, owner: &str, fallback: Duration) -> Result<Duration, ScenarioError> {
        match self.republish_wait_time {
            Some(secs) => to_duration(secs, owner),
            None => Ok(fallback),
        }
    }
}

impl ConsumerScript {
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("cons{}", index + 1))
    }

    pub fn retry_wait(&self, owner: &str, fallback: Duration) -> Result<Duration, ScenarioError> {
        match self.retry_wait_time {
            Some(secs) => to_duration(secs, owner),
            None => Ok(fallback),
        }
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a product by its script key.
    pub fn product(&self, key: &str, owner: &str) -> Result<&Product, ScenarioError> {
        self.products
            .get(key)
            .ok_or_else(|| ScenarioError::UnknownProduct {
                key: key.to_string(),
                owner: owner.to_string(),
            })
    }

    pub fn resolve_production(
        &self,
        script: &ProducerScript,
        owner: &str,
    ) -> Result<Vec<ProductionStep>, ScenarioError> {
        script
            .products
            .iter()
            .map(|entry| {
                if entry.quantity == 0 {
                    return Err(ScenarioError::ZeroQuantity {
                        key: entry.product.clone(),
                        owner: owner.to_string(),
                    });
                }
                Ok(ProductionStep {
                    product: self.product(&entry.product, owner)?.clone(),
                    quantity: entry.quantity,
                    production_time: to_duration(entry.wait_time, owner)?,
                })
            })
            .collect()
    }

    pub fn resolve_carts(
        &self,
        script: &ConsumerScript,
        owner: &str,
    ) -> Result<Vec<Vec<CartStep>>, ScenarioError> {
        script
            .carts
            .iter()
            .map(|cart| {
                cart.iter()
                    .map(|op| {
                        // A zero-quantity cart operation is kept and does nothing.
                        Ok(CartStep {
                            kind: op.kind,
                            product: self.product(&op.product, owner)?.clone(),
                            quantity: op.quantity,
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Check every reference and wait time in the script without building anything.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.queue_size_per_producer == Some(0) {
            return Err(ScenarioError::ZeroQueueSize);
        }
        for (i, script) in self.producers.iter().enumerate() {
            let owner = script.display_name(i);
            self.resolve_production(script, &owner)?;
            script.republish_wait(&owner, Duration::ZERO)?;
        }
        for (i, script) in self.consumers.iter().enumerate() {
            let owner = script.display_name(i);
            self.resolve_carts(script, &owner)?;
            script.retry_wait(&owner, Duration::ZERO)?;
        }
        Ok(())
    }
}

fn to_duration(secs: f64, owner: &str) -> Result<Duration, ScenarioError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ScenarioError::InvalidWait {
        owner: owner.to_string(),
        value: secs,
    })
}

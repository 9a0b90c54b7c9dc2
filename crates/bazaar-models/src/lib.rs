pub mod config;
pub mod error;
pub mod ids;
pub mod product;
pub mod purchase;
pub mod scenario;

pub use config::{BazaarConfig, LockingStrategy, MarketConfig, SessionConfig};
pub use error::ScenarioError;
pub use ids::{CartId, ProducerId};
pub use product::{Coffee, Product, RoastLevel, Tea};
pub use purchase::{Purchase, Receipt};
pub use scenario::{
    CartOperation, CartStep, ConsumerScript, OperationKind, ProducerScript, ProductionEntry,
    ProductionStep, Scenario,
};

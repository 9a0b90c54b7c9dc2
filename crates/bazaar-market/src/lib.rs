pub mod coarse;
pub mod error;
pub mod marketplace;
pub mod sharded;
mod slot;

pub use coarse::CoarseMarketplace;
pub use error::MarketError;
pub use marketplace::{Marketplace, ProducerStock};
pub use sharded::ShardedMarketplace;

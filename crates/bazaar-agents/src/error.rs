use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Marketplace error: {0}")]
    Market(#[from] bazaar_market::MarketError),

    #[error("Agent cancelled: {0}")]
    Cancelled(String),
}

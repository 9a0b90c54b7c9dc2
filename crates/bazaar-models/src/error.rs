use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown product '{key}' referenced by {owner}")]
    UnknownProduct { key: String, owner: String },

    #[error("Invalid wait time for {owner}: {value}")]
    InvalidWait { owner: String, value: f64 },

    #[error("Zero quantity for product '{key}' in {owner}")]
    ZeroQuantity { key: String, owner: String },

    #[error("queue_size_per_producer must be positive")]
    ZeroQueueSize,
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Hotel not found: {0}")]
    HotelNotFound(String),

    #[error("Invalid {chain} record: {reason}")]
    InvalidRecord { chain: String, reason: String },

    #[error("Invalid chain: {0}")]
    InvalidChain(String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("Invalid fee interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid amount rule: {0}")]
    InvalidAmountRule(String),

    #[error("Invalid scoring strategy: {0}")]
    InvalidScorer(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Table has no transferable columns: {0}")]
    EmptySchema(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

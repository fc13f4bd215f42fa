//! Error types and Result alias for PerkPocket

use thiserror::Error;

/// Main error type for PerkPocket
#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog load failed: {0}")]
    LoadError(String),

    #[error("Invalid offer URL: {0}")]
    InvalidUrl(String),

    #[error("Offer already completed today: {0}")]
    AlreadyCompletedToday(String),

    #[error("Daily limit of {limit} offers reached")]
    DailyLimitReached { limit: u32 },

    #[error("No matching record: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::LoadError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}

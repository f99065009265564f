//! Error types for Tiingo API operations.

use thiserror::Error;

use crate::source::FetchError;

/// Errors from Tiingo API operations.
#[derive(Error, Debug)]
pub enum TiingoError {
    #[error("Rate limited by Tiingo API")]
    RateLimited,
    #[error("Invalid API key (HTTP 401)")]
    InvalidApiKey,
    #[error("Ticker not found on Tiingo: {0}")]
    NotFound(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    ParseFailed(String),
    #[error("Network error")]
    Network(#[from] reqwest::Error),
}

impl From<TiingoError> for FetchError {
    fn from(e: TiingoError) -> Self {
        match e {
            TiingoError::RateLimited => FetchError::RateLimited("Tiingo".to_string()),
            TiingoError::InvalidApiKey => FetchError::InvalidApiKey,
            TiingoError::NotFound(symbol) => FetchError::NotFound(symbol),
            TiingoError::Http { status, body } => FetchError::Http { status, body },
            TiingoError::ParseFailed(msg) => FetchError::Parse(msg),
            TiingoError::Network(err) => FetchError::Network(err.to_string()),
        }
    }
}

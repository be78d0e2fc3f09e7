//! Error types for the rate cache

use thiserror::Error;

/// Main error type for rate caching and conversion.
///
/// The enum is `Clone` because a coalesced refresh hands the same outcome to
/// every waiting caller; foreign errors are flattened into their message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateCacheError {
    #[error("Rate provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Malformed persisted data: {0}")]
    MalformedPersistedData(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    #[error("Invalid rate for {code}: {rate}")]
    InvalidRate { code: String, rate: f64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RateCacheError {
    /// Wrap any other failure surfaced by a rate provider
    pub fn into_provider_error(self) -> Self {
        match self {
            RateCacheError::ProviderUnavailable(_) => self,
            other => RateCacheError::ProviderUnavailable(other.to_string()),
        }
    }
}

impl From<std::io::Error> for RateCacheError {
    fn from(err: std::io::Error) -> Self {
        RateCacheError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for RateCacheError {
    fn from(err: serde_json::Error) -> Self {
        RateCacheError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for RateCacheError {
    fn from(err: toml::de::Error) -> Self {
        RateCacheError::Config(err.to_string())
    }
}

impl From<csv::Error> for RateCacheError {
    fn from(err: csv::Error) -> Self {
        RateCacheError::Serialization(err.to_string())
    }
}

/// Result type alias for rate cache operations
pub type Result<T> = std::result::Result<T, RateCacheError>;

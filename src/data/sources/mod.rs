//! Exchange-rate sources
//!
//! This module provides the providers a [`RateCache`](crate::data::fx::RateCache)
//! can pull rates from:
//! - ExchangeApi: a market-data JSON endpoint (`/latest/USD`)
//! - ChatCompletion: an LLM chat endpoint prompted to emit rates as JSON
//! - InMemory: a fixed table, optionally loaded from CSV

#[cfg(feature = "http")]
pub mod chat_completion;
#[cfg(feature = "http")]
pub mod exchange_api;

#[cfg(feature = "http")]
pub use chat_completion::ChatCompletionSource;
#[cfg(feature = "http")]
pub use exchange_api::ExchangeApiSource;

use crate::config::{ProviderConfig, ProviderKind};
use crate::data::fx::{InMemoryRateProvider, RateTable};
use crate::error::{RateCacheError, Result};
use std::future::Future;
use std::sync::Arc;

/// Something that can produce a current rate table quoted against USD
pub trait RateProvider: Send + Sync + 'static {
    /// Fetch the latest rates
    ///
    /// Failures should be reported as `ProviderUnavailable`; the cache maps
    /// any other error into that variant.
    fn fetch_rates(&self) -> impl Future<Output = Result<RateTable>> + Send;

    /// Get the provider name (for logs)
    fn name(&self) -> &str;
}

impl<P: RateProvider> RateProvider for Arc<P> {
    fn fetch_rates(&self) -> impl Future<Output = Result<RateTable>> + Send {
        (**self).fetch_rates()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Provider selected at runtime from configuration
pub enum ConfiguredProvider {
    #[cfg(feature = "http")]
    ExchangeApi(ExchangeApiSource),
    #[cfg(feature = "http")]
    ChatCompletion(ChatCompletionSource),
    InMemory(InMemoryRateProvider),
}

impl ConfiguredProvider {
    /// Build the provider described by `config`
    pub fn from_config(config: &ProviderConfig, timeout_secs: u64) -> Result<Self> {
        match config.kind {
            #[cfg(feature = "http")]
            ProviderKind::ExchangeApi => {
                let base_url = config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| exchange_api::DEFAULT_BASE_URL.to_string());
                Ok(Self::ExchangeApi(ExchangeApiSource::with_base_url(
                    base_url,
                    timeout_secs,
                )?))
            }
            #[cfg(feature = "http")]
            ProviderKind::ChatCompletion => {
                let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                    RateCacheError::Config(format!(
                        "Environment variable {} is not set",
                        config.api_key_env
                    ))
                })?;
                let mut source = ChatCompletionSource::new(api_key, timeout_secs)?;
                if let Some(base_url) = &config.base_url {
                    source = source.with_endpoint(base_url.clone());
                }
                if let Some(model) = &config.model {
                    source = source.with_model(model.clone());
                }
                Ok(Self::ChatCompletion(source))
            }
            #[cfg(not(feature = "http"))]
            ProviderKind::ExchangeApi | ProviderKind::ChatCompletion => {
                Err(RateCacheError::Config(format!(
                    "Provider {:?} requires the `http` feature",
                    config.kind
                )))
            }
            ProviderKind::InMemory => {
                let path = config.rates_csv.as_ref().ok_or_else(|| {
                    RateCacheError::Config("in-memory provider needs `rates_csv`".to_string())
                })?;
                let csv_data = std::fs::read_to_string(path).map_err(|e| {
                    RateCacheError::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Ok(Self::InMemory(InMemoryRateProvider::from_csv(&csv_data)?))
            }
        }
    }
}

impl RateProvider for ConfiguredProvider {
    async fn fetch_rates(&self) -> Result<RateTable> {
        match self {
            #[cfg(feature = "http")]
            Self::ExchangeApi(source) => source.fetch_rates().await,
            #[cfg(feature = "http")]
            Self::ChatCompletion(source) => source.fetch_rates().await,
            Self::InMemory(source) => source.fetch_rates().await,
        }
    }

    fn name(&self) -> &str {
        match self {
            #[cfg(feature = "http")]
            Self::ExchangeApi(source) => source.name(),
            #[cfg(feature = "http")]
            Self::ChatCompletion(source) => source.name(),
            Self::InMemory(source) => source.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_in_memory_from_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "currency,rate\nUSD,1.0\nMYR,4.7").unwrap();

        let config = ProviderConfig {
            kind: ProviderKind::InMemory,
            rates_csv: Some(file.path().to_path_buf()),
            ..ProviderConfig::default()
        };

        let provider = ConfiguredProvider::from_config(&config, 5).unwrap();
        assert_eq!(provider.name(), "in-memory");

        let table = provider.fetch_rates().await.unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_in_memory_requires_csv_path() {
        let config = ProviderConfig {
            kind: ProviderKind::InMemory,
            ..ProviderConfig::default()
        };
        assert!(matches!(
            ConfiguredProvider::from_config(&config, 5),
            Err(RateCacheError::Config(_))
        ));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_chat_completion_requires_api_key() {
        let config = ProviderConfig {
            kind: ProviderKind::ChatCompletion,
            api_key_env: "FX_RATECACHE_TEST_UNSET_KEY".to_string(),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            ConfiguredProvider::from_config(&config, 5),
            Err(RateCacheError::Config(_))
        ));
    }
}

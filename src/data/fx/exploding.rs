//! Exploding rate provider - testing stub
//!
//! This provider panics when asked for rates. Use it to prove that a code
//! path never reaches the network, e.g. that a cache initialized from a fresh
//! persisted entry does not refresh.

use super::table::RateTable;
use crate::data::sources::RateProvider;
use crate::error::Result;

/// Exploding rate provider
///
/// # Example
/// ```should_panic
/// use fx_ratecache::data::fx::ExplodingRateProvider;
/// use fx_ratecache::data::sources::RateProvider;
///
/// let provider = ExplodingRateProvider::new();
/// let runtime = tokio::runtime::Runtime::new().unwrap();
///
/// // This will panic!
/// runtime.block_on(provider.fetch_rates()).unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplodingRateProvider {
    /// Custom panic message
    message: Option<&'static str>,
}

impl ExplodingRateProvider {
    /// Create new exploding provider with default message
    pub fn new() -> Self {
        Self { message: None }
    }

    /// Create with custom panic message
    pub fn with_message(message: &'static str) -> Self {
        Self {
            message: Some(message),
        }
    }

    fn panic_message(&self) -> &'static str {
        self.message
            .unwrap_or("Rate fetch not allowed! This cache was expected to serve persisted rates.")
    }
}

impl RateProvider for ExplodingRateProvider {
    async fn fetch_rates(&self) -> Result<RateTable> {
        panic!("{}", self.panic_message())
    }

    fn name(&self) -> &str {
        "exploding"
    }
}

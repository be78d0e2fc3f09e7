//! # fx_ratecache
//!
//! Exchange-rate caching and currency conversion for a personal-finance
//! tracker.
//!
//! A [`RateCache`](data::fx::RateCache) keeps an always-available table of
//! rates quoted against USD. It restores the last table from durable storage
//! on startup, refreshes it from a rate provider once it is an hour old, and
//! converts amounts between any two currencies without ever blocking or
//! failing.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fx_ratecache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = FileStore::open("/tmp/fx")?;
//!     let cache = RateCache::new(ExchangeApiSource::new()?, store);
//!
//!     // Serves persisted rates immediately, refreshing in the background
//!     cache.initialize();
//!
//!     let myr = cache.convert(25.0, CurrencyCode::USD, CurrencyCode::MYR);
//!     println!("{}", format_amount(myr, CurrencyCode::MYR));
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod currency;
pub mod data;
pub mod error;
pub mod preference;
pub mod storage;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::FxConfig;
    pub use crate::currency::{format_amount, CurrencyCode, BASE_CURRENCY};
    pub use crate::data::fx::{CacheEntry, CacheStatus, InMemoryRateProvider, RateCache, RateTable};
    #[cfg(feature = "http")]
    pub use crate::data::sources::{ChatCompletionSource, ExchangeApiSource};
    pub use crate::data::sources::{ConfiguredProvider, RateProvider};
    pub use crate::error::{RateCacheError, Result};
    pub use crate::preference::PreferenceStore;
    pub use crate::storage::{FileStore, MemoryStore, PersistentKV};
}

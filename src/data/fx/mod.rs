//! Foreign Exchange (FX) rate cache
//!
//! Keeps an always-available table of exchange rates for multi-currency
//! accounts and expenses, refreshed from a [`RateProvider`](crate::data::sources::RateProvider)
//! and persisted across restarts.
//!
//! # Components
//!
//! - **table**: `RateTable`, rates quoted against USD with parity fallback
//! - **entry**: `CacheEntry`, a table stamped with its capture time
//! - **cache**: `RateCache`, TTL staleness, coalesced refresh, persistence
//! - **in_memory**: fixed-table provider (CSV snapshots, tests)
//! - **exploding**: testing stub that panics when fetched
//! - **utils**: batch conversion and multi-currency totals
//!
//! # Example
//!
//! ```rust
//! use fx_ratecache::currency::CurrencyCode;
//! use fx_ratecache::data::fx::{total_in, RateTable};
//!
//! let table = RateTable::from_quotes([
//!     (CurrencyCode::MYR, 4.7),
//!     (CurrencyCode::EUR, 0.92),
//! ]).unwrap();
//!
//! let balances = [(100.0, CurrencyCode::USD), (30.0, CurrencyCode::MYR)];
//! let total = total_in(&table, &balances, CurrencyCode::MYR);
//! assert!((total - 500.0).abs() < 1e-9);
//! ```

pub mod cache;
pub mod entry;
pub mod exploding;
pub mod in_memory;
pub mod table;
pub mod utils;

pub use cache::{CacheStatus, Initialization, RateCache, RateCacheBuilder, RefreshHandle, DEFAULT_TTL_SECS};
pub use entry::CacheEntry;
pub use exploding::ExplodingRateProvider;
pub use in_memory::InMemoryRateProvider;
pub use table::{RateTable, PARITY_RATE};
pub use utils::{convert_amounts, total_in, unpriced_codes};

//! In-memory rate provider
//!
//! Serves a fixed rate table. Useful offline (rates loaded from a CSV file)
//! and as a deterministic provider in tests.

use super::table::RateTable;
use crate::data::sources::RateProvider;
use crate::error::{RateCacheError, Result};
use serde::Deserialize;
use std::sync::{PoisonError, RwLock};

/// Fixed-table rate provider
///
/// # Example
/// ```
/// use fx_ratecache::currency::CurrencyCode;
/// use fx_ratecache::data::fx::InMemoryRateProvider;
///
/// let provider = InMemoryRateProvider::from_csv("currency,rate\nMYR,4.7\nEUR,0.92").unwrap();
/// assert_eq!(provider.table().get(CurrencyCode::MYR), Some(4.7));
/// ```
#[derive(Debug)]
pub struct InMemoryRateProvider {
    table: RwLock<RateTable>,
}

#[derive(Debug, Deserialize)]
struct RateRow {
    currency: String,
    rate: f64,
}

impl InMemoryRateProvider {
    pub fn new(table: RateTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Load rates from CSV data
    ///
    /// Expected format: a `currency,rate` header followed by one row per
    /// currency, rates quoted against USD. Lines starting with `#` are ignored.
    pub fn from_csv(csv_data: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(csv_data.as_bytes());

        let mut rows = Vec::new();
        for (line_num, result) in reader.deserialize::<RateRow>().enumerate() {
            let row = result.map_err(|e| {
                RateCacheError::Serialization(format!("Invalid CSV row {}: {}", line_num + 1, e))
            })?;
            rows.push(row);
        }

        let table =
            RateTable::from_raw_quotes(rows.iter().map(|row| (row.currency.as_str(), row.rate)))?;
        log::debug!("Loaded {} rates from CSV", table.len());
        Ok(Self::new(table))
    }

    /// Replace the served table (simulates the market moving)
    pub fn set_table(&self, table: RateTable) {
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = table;
    }

    pub fn table(&self) -> RateTable {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RateProvider for InMemoryRateProvider {
    async fn fetch_rates(&self) -> Result<RateTable> {
        Ok(self.table())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

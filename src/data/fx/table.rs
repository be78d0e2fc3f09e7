//! Rate table - currency rates quoted against the base currency

use crate::currency::{CurrencyCode, BASE_CURRENCY};
use crate::error::{RateCacheError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rate used for codes missing from the table ("assume parity")
pub const PARITY_RATE: f64 = 1.0;

/// Mapping of currency code to its rate relative to [`BASE_CURRENCY`]
///
/// A rate `r` for code `C` means `1 USD = r C`. Every stored rate is finite
/// and positive, and the base currency is always present at exactly 1.0.
///
/// # Example
/// ```
/// use fx_ratecache::currency::CurrencyCode;
/// use fx_ratecache::data::fx::RateTable;
///
/// let table = RateTable::from_quotes([
///     (CurrencyCode::MYR, 4.7),
///     (CurrencyCode::EUR, 0.92),
/// ]).unwrap();
///
/// assert_eq!(table.convert(100.0, CurrencyCode::USD, CurrencyCode::MYR), 470.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<CurrencyCode, f64>", into = "BTreeMap<CurrencyCode, f64>")]
pub struct RateTable {
    rates: BTreeMap<CurrencyCode, f64>,
}

impl RateTable {
    /// The table used before any rates are known: `{ USD: 1.0 }`
    pub fn degenerate() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(BASE_CURRENCY, 1.0);
        Self { rates }
    }

    /// Build a table from quotes delivered by a rate provider
    ///
    /// Non-finite and non-positive quotes are dropped. If the provider quotes
    /// the base currency at something other than 1.0 the whole table is
    /// rescaled so the base becomes exactly 1.0. Fails when no usable rate
    /// other than the base remains.
    pub fn from_quotes<I>(quotes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CurrencyCode, f64)>,
    {
        let mut rates = BTreeMap::new();
        for (code, rate) in quotes {
            if !is_valid_rate(rate) {
                log::warn!("Dropping invalid rate for {}: {}", code, rate);
                continue;
            }
            rates.insert(code, rate);
        }

        if let Some(base_rate) = rates.get(&BASE_CURRENCY).copied() {
            if base_rate != 1.0 {
                log::warn!(
                    "Provider quoted {} at {}; rescaling table to base 1.0",
                    BASE_CURRENCY,
                    base_rate
                );
                for rate in rates.values_mut() {
                    *rate /= base_rate;
                }
            }
        }
        rates.insert(BASE_CURRENCY, 1.0);

        if rates.len() < 2 {
            return Err(RateCacheError::ProviderUnavailable(
                "provider returned no usable rates".to_string(),
            ));
        }

        Ok(Self { rates })
    }

    /// Build a table from raw string-keyed quotes (e.g. a decoded JSON object)
    ///
    /// Keys that are not well-formed currency codes are skipped.
    pub fn from_raw_quotes<'a, I>(quotes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let parsed = quotes.into_iter().filter_map(|(code, rate)| {
            match CurrencyCode::parse(code) {
                Ok(code) => Some((code, rate)),
                Err(_) => {
                    log::warn!("Skipping quote with malformed code {:?}", code);
                    None
                }
            }
        });
        Self::from_quotes(parsed)
    }

    /// Rate for `code`, or `None` if the table has no quote for it
    pub fn get(&self, code: CurrencyCode) -> Option<f64> {
        self.rates.get(&code).copied()
    }

    /// Rate for `code`, falling back to parity for unknown codes
    pub fn rate(&self, code: CurrencyCode) -> f64 {
        self.get(code).unwrap_or(PARITY_RATE)
    }

    pub fn contains(&self, code: CurrencyCode) -> bool {
        self.rates.contains_key(&code)
    }

    /// Convert `amount` from one currency to another via the base currency
    ///
    /// Unknown codes are treated as parity with the base, so this never fails.
    pub fn convert(&self, amount: f64, from: CurrencyCode, to: CurrencyCode) -> f64 {
        let from_rate = self.rate(from);
        let to_rate = self.rate(to);
        amount / from_rate * to_rate
    }

    /// Strict conversion: codes missing from the table are an error
    pub fn try_convert(&self, amount: f64, from: CurrencyCode, to: CurrencyCode) -> Result<f64> {
        let from_rate = self
            .get(from)
            .ok_or_else(|| RateCacheError::UnsupportedCurrency(from.to_string()))?;
        let to_rate = self
            .get(to)
            .ok_or_else(|| RateCacheError::UnsupportedCurrency(to.to_string()))?;
        Ok(amount / from_rate * to_rate)
    }

    /// Currency codes present in the table, in code order
    pub fn codes(&self) -> impl Iterator<Item = CurrencyCode> + '_ {
        self.rates.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CurrencyCode, f64)> + '_ {
        self.rates.iter().map(|(code, rate)| (*code, *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// True for the `{ USD: 1.0 }` placeholder table
    pub fn is_degenerate(&self) -> bool {
        self.rates.len() == 1
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::degenerate()
    }
}

impl TryFrom<BTreeMap<CurrencyCode, f64>> for RateTable {
    type Error = RateCacheError;

    /// Used when reading persisted tables: unlike [`RateTable::from_quotes`]
    /// nothing is dropped or rescaled, any violation rejects the whole table.
    fn try_from(mut rates: BTreeMap<CurrencyCode, f64>) -> Result<Self> {
        if let Some((code, rate)) = rates.iter().find(|(_, rate)| !is_valid_rate(**rate)) {
            return Err(RateCacheError::InvalidRate {
                code: code.to_string(),
                rate: *rate,
            });
        }
        match rates.get(&BASE_CURRENCY) {
            Some(rate) if *rate != 1.0 => {
                return Err(RateCacheError::InvalidRate {
                    code: BASE_CURRENCY.to_string(),
                    rate: *rate,
                });
            }
            Some(_) => {}
            None => {
                rates.insert(BASE_CURRENCY, 1.0);
            }
        }
        Ok(Self { rates })
    }
}

impl From<RateTable> for BTreeMap<CurrencyCode, f64> {
    fn from(table: RateTable) -> Self {
        table.rates
    }
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn sample() -> RateTable {
        RateTable::from_quotes([(CurrencyCode::MYR, 4.7), (CurrencyCode::EUR, 0.92)]).unwrap()
    }

    #[test]
    fn test_degenerate_table() {
        let table = RateTable::degenerate();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(BASE_CURRENCY), Some(1.0));
        assert!(table.is_degenerate());
        assert_eq!(table.convert(42.0, CurrencyCode::EUR, CurrencyCode::MYR), 42.0);
    }

    #[test]
    fn test_base_inserted_at_parity() {
        let table = sample();
        assert_eq!(table.get(BASE_CURRENCY), Some(1.0));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_scenario_conversions() {
        let table = sample();
        assert_relative_eq!(
            table.convert(100.0, CurrencyCode::USD, CurrencyCode::MYR),
            470.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            table.convert(470.0, CurrencyCode::MYR, CurrencyCode::USD),
            100.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            table.convert(50.0, CurrencyCode::EUR, CurrencyCode::MYR),
            255.434_782_608_695_6,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_unknown_code_parity_fallback() {
        let table = sample();
        assert_eq!(table.rate(code("ZZZ")), PARITY_RATE);
        assert_eq!(table.convert(50.0, code("ZZZ"), CurrencyCode::USD), 50.0);
        assert_eq!(table.convert(50.0, CurrencyCode::USD, code("ZZZ")), 50.0);
    }

    #[test]
    fn test_try_convert_rejects_unknown_codes() {
        let table = sample();
        let err = table
            .try_convert(10.0, code("ZZZ"), CurrencyCode::USD)
            .unwrap_err();
        assert_eq!(err, RateCacheError::UnsupportedCurrency("ZZZ".to_string()));
        assert_relative_eq!(
            table.try_convert(10.0, CurrencyCode::USD, CurrencyCode::EUR).unwrap(),
            9.2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_invalid_quotes_dropped() {
        let table = RateTable::from_quotes([
            (CurrencyCode::MYR, 4.7),
            (CurrencyCode::EUR, -1.0),
            (CurrencyCode::GBP, 0.0),
            (CurrencyCode::JPY, f64::NAN),
            (CurrencyCode::SGD, f64::INFINITY),
        ])
        .unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.contains(CurrencyCode::MYR));
        assert!(!table.contains(CurrencyCode::EUR));
    }

    #[test]
    fn test_rescales_when_base_not_one() {
        // Quotes against a base worth half a dollar
        let table = RateTable::from_quotes([
            (CurrencyCode::USD, 2.0),
            (CurrencyCode::MYR, 9.4),
        ])
        .unwrap();

        assert_eq!(table.get(BASE_CURRENCY), Some(1.0));
        assert_relative_eq!(table.rate(CurrencyCode::MYR), 4.7, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_quotes_rejected() {
        let err = RateTable::from_quotes(Vec::new()).unwrap_err();
        assert!(matches!(err, RateCacheError::ProviderUnavailable(_)));

        let err = RateTable::from_quotes([(CurrencyCode::USD, 1.0)]).unwrap_err();
        assert!(matches!(err, RateCacheError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_raw_quotes_skip_malformed_codes() {
        let table =
            RateTable::from_raw_quotes([("myr", 4.7), ("not-a-code", 3.0), ("EUR", 0.92)]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(CurrencyCode::MYR), Some(4.7));
    }

    #[test]
    fn test_deserialize_rejects_bad_rates() {
        assert!(serde_json::from_str::<RateTable>(r#"{"USD":1.0,"MYR":-4.7}"#).is_err());
        assert!(serde_json::from_str::<RateTable>(r#"{"USD":2.0,"MYR":4.7}"#).is_err());

        let table: RateTable = serde_json::from_str(r#"{"MYR":4.7}"#).unwrap();
        assert_eq!(table.get(BASE_CURRENCY), Some(1.0));
    }
}

//! Cache entry - a rate table stamped with its capture time

use super::table::RateTable;
use crate::error::{RateCacheError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Unit of persistence for the rate cache
///
/// Serialized as `{"rates": {...}, "timestamp": <epoch millis>}`, so a
/// round trip through storage keeps millisecond precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub rates: RateTable,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(rates: RateTable, timestamp: DateTime<Utc>) -> Self {
        Self { rates, timestamp }
    }

    /// Time elapsed since capture (negative if the clock went backwards)
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    /// An entry is stale once `now - timestamp >= ttl`
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a persisted entry; any failure is `MalformedPersistedData`
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| RateCacheError::MalformedPersistedData(e.to_string()))
    }
}

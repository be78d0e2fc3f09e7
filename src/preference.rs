//! User's preferred display currency
//!
//! Stored under its own key, independent of the rate cache, and never
//! expires.

use crate::currency::{CurrencyCode, BASE_CURRENCY};
use crate::error::Result;
use crate::storage::{PersistentKV, PREFERENCE_KEY};

/// Reads and writes the currency preference
#[derive(Debug, Clone)]
pub struct PreferenceStore<S> {
    store: S,
}

impl<S: PersistentKV> PreferenceStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored preference, or the base currency when absent or unreadable
    pub fn load(&self) -> CurrencyCode {
        let raw = match self.store.get(PREFERENCE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BASE_CURRENCY,
            Err(e) => {
                log::warn!("Failed to read currency preference: {}", e);
                return BASE_CURRENCY;
            }
        };

        // Older clients stored the code JSON-quoted.
        let trimmed = raw.trim().trim_matches('"');
        match CurrencyCode::parse(trimmed) {
            Ok(code) => code,
            Err(e) => {
                log::warn!("Ignoring malformed currency preference: {}", e);
                BASE_CURRENCY
            }
        }
    }

    pub fn save(&self, code: CurrencyCode) -> Result<()> {
        self.store.set(PREFERENCE_KEY, code.as_str())?;
        log::debug!("Currency preference set to {}", code);
        Ok(())
    }

    /// Forget the preference; subsequent loads return the base currency
    pub fn clear(&self) -> Result<()> {
        self.store.remove(PREFERENCE_KEY)
    }
}

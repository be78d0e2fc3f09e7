//! Durable key-value storage backing the rate cache
//!
//! The cache treats storage as a passive mirror: values are written after a
//! successful refresh and read back once at startup.
//!
//! # Components
//!
//! - **memory**: process-local store for tests and ephemeral sessions
//! - **file**: one file per key under a data directory

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use std::sync::Arc;

/// Key holding the serialized rate cache entry
pub const RATES_CACHE_KEY: &str = "fx_rates_cache";

/// Key holding the user's preferred display currency
pub const PREFERENCE_KEY: &str = "preferred_currency";

/// String key-value storage that survives process restarts
pub trait PersistentKV: Send + Sync + 'static {
    /// Read a value; `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: PersistentKV + ?Sized> PersistentKV for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

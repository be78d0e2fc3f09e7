//! Rate cache - always-available, eventually-fresh exchange rates
//!
//! The cache owns the current [`CacheEntry`] and mirrors it into a
//! [`PersistentKV`] store so the next process start can reuse it. Reads
//! (`convert`, `is_stale`) never wait on the network: they see the last fully
//! committed table, which a refresh replaces with a single pointer swap.
//!
//! Overlapping `refresh()` calls share one provider fetch and all receive the
//! same outcome.

use super::entry::CacheEntry;
use super::table::RateTable;
use crate::clock::{Clock, SystemClock};
use crate::currency::{CurrencyCode, BASE_CURRENCY};
use crate::data::sources::RateProvider;
use crate::error::{RateCacheError, Result};
use crate::storage::{PersistentKV, RATES_CACHE_KEY};
use chrono::Duration;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinHandle;

/// Age at which cached rates count as stale
pub const DEFAULT_TTL_SECS: i64 = 60 * 60;

type RefreshFuture = BoxFuture<'static, Result<Arc<CacheEntry>>>;

/// Handle to a background refresh started by the cache
pub type RefreshHandle = JoinHandle<Result<Arc<CacheEntry>>>;

/// Lifecycle state as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Neither `initialize()` nor a refresh has produced rates yet
    Uninitialized,
    /// Current rates are younger than the TTL
    Fresh,
    /// Rates are missing or at least TTL old; still served until replaced
    Stale,
}

/// Result of [`RateCache::initialize`]
#[derive(Debug)]
pub struct Initialization {
    pub status: CacheStatus,
    /// Whether a persisted entry was adopted
    pub restored: bool,
    /// Background refresh, when one was started
    pub refresh: Option<RefreshHandle>,
}

/// Exchange-rate cache
///
/// Cloning is cheap and yields another handle to the same cache.
///
/// # Example
/// ```
/// use fx_ratecache::currency::CurrencyCode;
/// use fx_ratecache::data::fx::{InMemoryRateProvider, RateCache, RateTable};
/// use fx_ratecache::storage::MemoryStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let provider = InMemoryRateProvider::new(
///     RateTable::from_quotes([(CurrencyCode::MYR, 4.7)]).unwrap(),
/// );
/// let cache = RateCache::new(provider, MemoryStore::new());
///
/// let init = cache.initialize();
/// init.refresh.unwrap().await.unwrap().unwrap();
///
/// assert_eq!(cache.convert(100.0, CurrencyCode::USD, CurrencyCode::MYR), 470.0);
/// # });
/// ```
pub struct RateCache<P, S, C = SystemClock> {
    inner: Arc<Inner<P, S, C>>,
}

struct Inner<P, S, C> {
    provider: P,
    store: S,
    clock: C,
    ttl: Duration,
    degenerate: RateTable,
    initialized: AtomicBool,
    current: RwLock<Option<Arc<CacheEntry>>>,
    in_flight: Mutex<Option<WeakShared<RefreshFuture>>>,
    last_error: RwLock<Option<RateCacheError>>,
}

impl<P, S, C> Clone for RateCache<P, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builder for [`RateCache`] with a custom clock or TTL
pub struct RateCacheBuilder<P, S, C> {
    provider: P,
    store: S,
    clock: C,
    ttl: Duration,
}

impl<P, S, C> RateCacheBuilder<P, S, C>
where
    P: RateProvider,
    S: PersistentKV,
    C: Clock,
{
    pub fn clock<C2: Clock>(self, clock: C2) -> RateCacheBuilder<P, S, C2> {
        RateCacheBuilder {
            provider: self.provider,
            store: self.store,
            clock,
            ttl: self.ttl,
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn build(self) -> RateCache<P, S, C> {
        RateCache {
            inner: Arc::new(Inner {
                provider: self.provider,
                store: self.store,
                clock: self.clock,
                ttl: self.ttl,
                degenerate: RateTable::degenerate(),
                initialized: AtomicBool::new(false),
                current: RwLock::new(None),
                in_flight: Mutex::new(None),
                last_error: RwLock::new(None),
            }),
        }
    }
}

impl<P, S> RateCache<P, S, SystemClock>
where
    P: RateProvider,
    S: PersistentKV,
{
    /// Create a cache using the wall clock and the default one-hour TTL
    pub fn new(provider: P, store: S) -> Self {
        Self::builder(provider, store).build()
    }

    pub fn builder(provider: P, store: S) -> RateCacheBuilder<P, S, SystemClock> {
        RateCacheBuilder {
            provider,
            store,
            clock: SystemClock,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }
}

impl<P, S, C> RateCache<P, S, C>
where
    P: RateProvider,
    S: PersistentKV,
    C: Clock,
{
    /// Adopt persisted rates and start a background refresh if they are stale
    ///
    /// A fresh persisted entry is used as-is and no fetch happens. A stale one
    /// is served provisionally while the refresh runs. With nothing persisted
    /// the cache serves the `{ USD: 1.0 }` table. Unreadable or malformed
    /// storage counts as nothing persisted. Never fails.
    ///
    /// The refresh is spawned on the current tokio runtime; outside a runtime
    /// it is skipped and `refresh` is `None`.
    pub fn initialize(&self) -> Initialization {
        let persisted = self.inner.load_persisted();
        let now = self.inner.clock.now();
        self.inner.initialized.store(true, Ordering::Release);

        match persisted {
            Some(entry) if !entry.is_stale(now, self.inner.ttl) => {
                log::info!(
                    "Restored {} cached rates from {} (fresh)",
                    entry.rates.len(),
                    entry.timestamp
                );
                self.inner.publish(Arc::new(entry));
                Initialization {
                    status: CacheStatus::Fresh,
                    restored: true,
                    refresh: None,
                }
            }
            persisted => {
                let restored = persisted.is_some();
                match persisted {
                    Some(entry) => {
                        log::info!(
                            "Restored {} cached rates from {} (stale, refreshing)",
                            entry.rates.len(),
                            entry.timestamp
                        );
                        self.inner.publish(Arc::new(entry));
                    }
                    None => log::info!("No cached rates; serving base-only table until refresh"),
                }
                Initialization {
                    status: CacheStatus::Stale,
                    restored,
                    refresh: self.spawn_refresh(),
                }
            }
        }
    }

    /// Fetch new rates, joining a refresh that is already in flight
    ///
    /// On success the new entry is persisted and then swapped in. On failure
    /// the current rates stay in place and the error is returned (and kept in
    /// [`last_error`](Self::last_error)).
    pub async fn refresh(&self) -> Result<Arc<CacheEntry>> {
        let pending = self.join_or_start_refresh();
        pending.await
    }

    /// Start a background refresh when the rates are stale and none is running
    pub fn refresh_if_stale(&self) -> Option<RefreshHandle> {
        if self.is_stale() && !self.is_refreshing() {
            self.spawn_refresh()
        } else {
            None
        }
    }

    /// Convert `amount` between currencies using the current rates
    ///
    /// Codes without a rate are treated as parity with USD.
    pub fn convert(&self, amount: f64, from: CurrencyCode, to: CurrencyCode) -> f64 {
        match self.snapshot() {
            Some(entry) => entry.rates.convert(amount, from, to),
            None => self.inner.degenerate.convert(amount, from, to),
        }
    }

    /// Like [`convert`](Self::convert) for raw code strings
    ///
    /// Malformed codes degrade to parity the same way unknown ones do.
    pub fn convert_codes(&self, amount: f64, from: &str, to: &str) -> f64 {
        match (CurrencyCode::parse(from), CurrencyCode::parse(to)) {
            (Ok(from), Ok(to)) => self.convert(amount, from, to),
            (Ok(from), Err(_)) => self.convert(amount, from, BASE_CURRENCY),
            (Err(_), Ok(to)) => self.convert(amount, BASE_CURRENCY, to),
            (Err(_), Err(_)) => amount,
        }
    }

    /// Strict conversion: codes missing from the current table are an error
    pub fn try_convert(&self, amount: f64, from: CurrencyCode, to: CurrencyCode) -> Result<f64> {
        self.rates().try_convert(amount, from, to)
    }

    /// True when there are no fetched rates or they are at least TTL old
    pub fn is_stale(&self) -> bool {
        match self.snapshot() {
            Some(entry) => entry.is_stale(self.inner.clock.now(), self.inner.ttl),
            None => true,
        }
    }

    /// `Uninitialized` only until rates are restored or fetched
    pub fn status(&self) -> CacheStatus {
        if !self.inner.initialized.load(Ordering::Acquire) && self.snapshot().is_none() {
            CacheStatus::Uninitialized
        } else if self.is_stale() {
            CacheStatus::Stale
        } else {
            CacheStatus::Fresh
        }
    }

    /// Whether a refresh is currently in flight ("rates updating…")
    pub fn is_refreshing(&self) -> bool {
        let slot = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().and_then(WeakShared::upgrade).is_some()
    }

    /// Current entry, if rates were ever restored or fetched
    pub fn snapshot(&self) -> Option<Arc<CacheEntry>> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current rate table (the base-only table when nothing is cached)
    pub fn rates(&self) -> RateTable {
        match self.snapshot() {
            Some(entry) => entry.rates.clone(),
            None => self.inner.degenerate.clone(),
        }
    }

    /// Age of the current rates
    pub fn age(&self) -> Option<Duration> {
        self.snapshot()
            .map(|entry| entry.age(self.inner.clock.now()))
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Most recent refresh failure; cleared by the next successful refresh
    pub fn last_error(&self) -> Option<RateCacheError> {
        self.inner
            .last_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    fn join_or_start_refresh(&self) -> Shared<RefreshFuture> {
        let mut slot = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(pending) = slot.as_ref().and_then(WeakShared::upgrade) {
            log::debug!("Joining in-flight rate refresh");
            return pending;
        }

        let inner = Arc::clone(&self.inner);
        let pending = async move {
            let outcome = inner.fetch_and_commit().await;
            inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            outcome
        }
        .boxed()
        .shared();

        // The slot only holds a weak handle: once every caller has dropped
        // its future, the fetch is abandoned and the next call starts anew.
        *slot = pending.downgrade();
        pending
    }

    fn spawn_refresh(&self) -> Option<RefreshHandle> {
        match tokio::runtime::Handle::try_current() {
            // Register before spawning so callers arriving first join this fetch.
            Ok(handle) => Some(handle.spawn(self.join_or_start_refresh())),
            Err(_) => {
                log::warn!("No async runtime available; background rate refresh skipped");
                None
            }
        }
    }
}

impl<P, S, C> Inner<P, S, C>
where
    P: RateProvider,
    S: PersistentKV,
    C: Clock,
{
    async fn fetch_and_commit(&self) -> Result<Arc<CacheEntry>> {
        let name = self.provider.name();
        log::debug!("Fetching rates via {}", name);

        let table = match self.provider.fetch_rates().await {
            Ok(table) => table,
            Err(e) => {
                let e = e.into_provider_error();
                log::warn!("Rate refresh via {} failed: {}", name, e);
                self.set_last_error(Some(e.clone()));
                return Err(e);
            }
        };

        let entry = Arc::new(CacheEntry::new(table, self.clock.now()));
        self.persist(&entry);
        self.publish(Arc::clone(&entry));
        self.set_last_error(None);

        log::info!("Refreshed {} rates via {}", entry.rates.len(), name);
        Ok(entry)
    }

    fn load_persisted(&self) -> Option<CacheEntry> {
        let raw = match self.store.get(RATES_CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read cached rates: {}", e);
                return None;
            }
        };

        match CacheEntry::from_json(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Ignoring cached rates: {}", e);
                None
            }
        }
    }

    fn persist(&self, entry: &CacheEntry) {
        let result = entry
            .to_json()
            .and_then(|json| self.store.set(RATES_CACHE_KEY, &json));
        if let Err(e) = result {
            // Memory stays authoritative; the next refresh retries the write.
            log::warn!("Failed to persist rates: {}", e);
        }
    }

    fn publish(&self, entry: Arc<CacheEntry>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }

    fn set_last_error(&self, error: Option<RateCacheError>) {
        *self
            .last_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = error;
    }
}

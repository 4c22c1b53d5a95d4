//! Price cache store with shared-lock lookups and merge-on-write upserts

use crate::cache::{
    config::PriceCacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheStats, OnDemandPrices, PriceKind, PriceSnapshot, SpotPrices, Tenancy},
};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Time-bounded in-memory cache of on-demand and spot prices
///
/// This implementation provides:
/// - One entry per (instance type, region, tenancy) key
/// - A single lifetime shared by both price kinds of an entry
/// - Lookups under a shared lock, upserts under an exclusive lock
/// - No eviction: stale entries are ignored until the next write
///
/// There is no per-key coordination. Two tasks that miss on the same key
/// both go upstream and both upsert; the final state is still correct.
pub struct PriceCache {
    config: PriceCacheConfig,

    /// Internal storage
    store: RwLock<CacheStore>,

    counters: Counters,
}

/// Internal cache storage
struct CacheStore {
    /// Scanned linearly; keys are unique by construction
    entries: Vec<CacheEntry>,

    /// Current lifetime, may differ from `config.cache_lifetime`
    lifetime: Duration,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl PriceCache {
    /// Create a new cache with the given configuration
    pub fn new(config: PriceCacheConfig) -> Self {
        info!(
            "Initializing price cache (lifetime: {:?})",
            config.cache_lifetime
        );

        let store = CacheStore {
            entries: Vec::new(),
            lifetime: config.cache_lifetime,
        };

        Self {
            config,
            store: RwLock::new(store),
            counters: Counters::default(),
        }
    }

    /// Create a cache with default settings and the given lifetime
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self::new(PriceCacheConfig::builder().cache_lifetime(lifetime).build())
    }

    /// Configuration the cache was created with
    ///
    /// `cache_lifetime` here is the initial value only. Use
    /// [`lifetime`](Self::lifetime) for the one in effect after
    /// [`set_lifetime`](Self::set_lifetime).
    pub fn config(&self) -> &PriceCacheConfig {
        &self.config
    }

    /// Find a valid snapshot of `kind` for the key
    ///
    /// Returns the first entry matching the key that is within the lifetime
    /// and holds data of the requested kind.
    pub async fn lookup(
        &self,
        instance_type: &str,
        region: &str,
        tenancy: Tenancy,
        kind: PriceKind,
    ) -> Option<PriceSnapshot> {
        let store = self.store.read().await;
        let now = Utc::now();

        let found = store
            .entries
            .iter()
            .find(|entry| {
                entry.key.matches(instance_type, region, tenancy)
                    && entry.is_valid_for(kind, store.lifetime, now)
            })
            .and_then(|entry| entry.snapshot(kind));

        match &found {
            Some(_) => {
                debug!("Cache hit ({}): {}/{}/{}", kind, instance_type, region, tenancy);
                self.record(&self.counters.hits);
            }
            None => {
                debug!("Cache miss ({}): {}/{}/{}", kind, instance_type, region, tenancy);
                self.record(&self.counters.misses);
            }
        }

        found
    }

    /// Valid on-demand prices for the key
    pub async fn lookup_on_demand(
        &self,
        instance_type: &str,
        region: &str,
        tenancy: Tenancy,
    ) -> Option<OnDemandPrices> {
        self.lookup(instance_type, region, tenancy, PriceKind::OnDemand)
            .await
            .and_then(PriceSnapshot::into_on_demand)
    }

    /// Valid spot prices for the key, which always carries `Tenancy::Unspecified`
    pub async fn lookup_spot(&self, instance_type: &str, region: &str) -> Option<SpotPrices> {
        self.lookup(instance_type, region, Tenancy::Unspecified, PriceKind::Spot)
            .await
            .and_then(PriceSnapshot::into_spot)
    }

    /// Insert or merge prices for the key
    ///
    /// An existing entry gets `last_written = now` and only the provided
    /// kinds replaced. A missing entry is appended.
    pub async fn upsert(
        &self,
        instance_type: &str,
        region: &str,
        tenancy: Tenancy,
        on_demand: Option<OnDemandPrices>,
        spot: Option<SpotPrices>,
    ) {
        let mut store = self.store.write().await;
        let now = Utc::now();

        let position = store
            .entries
            .iter()
            .position(|entry| entry.key.matches(instance_type, region, tenancy));

        match position {
            Some(index) => {
                let existing = &mut store.entries[index];
                debug!("Updating cache entry: {}", existing.key);
                existing.merge(on_demand, spot, now);
            }
            None => {
                let key = CacheKey::new(instance_type, region, tenancy);
                debug!("Inserting cache entry: {}", key);
                store
                    .entries
                    .push(CacheEntry::written_at(key, on_demand, spot, now));
            }
        }

        self.record(&self.counters.writes);
    }

    /// Raw entry for a key, regardless of freshness
    pub async fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        let store = self.store.read().await;
        store.entries.iter().find(|entry| &entry.key == key).cloned()
    }

    /// Current lifetime
    pub async fn lifetime(&self) -> Duration {
        self.store.read().await.lifetime
    }

    /// Change the lifetime used by all future lookups
    ///
    /// Write times are untouched; existing entries are judged against the
    /// new lifetime from the next lookup on.
    pub async fn set_lifetime(&self, lifetime: Duration) {
        let mut store = self.store.write().await;
        info!(
            "Changing price cache lifetime from {:?} to {:?}",
            store.lifetime, lifetime
        );
        store.lifetime = lifetime;
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = self.len().await;
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            entries,
        }
    }

    /// Number of distinct keys ever written
    pub async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.entries.is_empty()
    }

    fn record(&self, counter: &AtomicU64) {
        if self.config.enable_metrics {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(PriceCacheConfig::default())
    }
}

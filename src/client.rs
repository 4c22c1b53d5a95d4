//! Caller-facing price client
//!
//! Bundles one [`PriceCache`] with both fetchers. Several clients may share
//! a cache by passing the same `Arc`, or keep independent ones.

use crate::cache::{CacheStats, OnDemandPrices, PriceCache, PriceCacheConfig, SpotPrices, Tenancy};
use crate::error::Result;
use crate::fetch::{OnDemandFetcher, SpotFetcher};
use crate::provider::{PricingCatalog, SpotPriceHistory};
use std::sync::Arc;

/// Cached on-demand and spot price lookups
pub struct PriceClient {
    cache: Arc<PriceCache>,
    on_demand: OnDemandFetcher,
    spot: SpotFetcher,
}

impl PriceClient {
    /// Create a client with its own cache
    pub fn new(
        config: PriceCacheConfig,
        catalog: Arc<dyn PricingCatalog>,
        history: Arc<dyn SpotPriceHistory>,
    ) -> Self {
        Self::with_cache(Arc::new(PriceCache::new(config)), catalog, history)
    }

    /// Create a client over an existing cache
    pub fn with_cache(
        cache: Arc<PriceCache>,
        catalog: Arc<dyn PricingCatalog>,
        history: Arc<dyn SpotPriceHistory>,
    ) -> Self {
        Self {
            on_demand: OnDemandFetcher::new(Arc::clone(&cache), catalog),
            spot: SpotFetcher::new(Arc::clone(&cache), history),
            cache,
        }
    }

    /// Hourly on-demand prices for an instance type in a region
    pub async fn get_on_demand_prices(
        &self,
        instance_type: &str,
        region: &str,
        tenancy: Tenancy,
    ) -> Result<OnDemandPrices> {
        self.on_demand.fetch(instance_type, region, tenancy).await
    }

    /// Recent spot prices for an instance type in a region, by zone
    pub async fn get_spot_prices(&self, instance_type: &str, region: &str) -> Result<SpotPrices> {
        self.spot.fetch(instance_type, region).await
    }

    /// The underlying cache
    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

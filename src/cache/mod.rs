//! # Price Cache
//!
//! Time-bounded in-memory cache for EC2 on-demand and spot prices.
//!
//! ## Features
//!
//! - **Composite keys**: one entry per (instance type, region, tenancy)
//! - **Shared freshness**: a write of either price kind refreshes the whole entry
//! - **Merge on write**: writing one kind never clears the other
//! - **Reader/writer locking**: lookups share a lock, upserts take it exclusively
//! - **No eviction**: stale entries are ignored and overwritten on the next write
//!
//! ## Example
//!
//! ```rust
//! use ec2_price_cache::cache::{PriceCache, PriceCacheConfig, Tenancy};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PriceCacheConfig::builder()
//!     .cache_lifetime(Duration::from_secs(3600))
//!     .build();
//!
//! let cache = PriceCache::new(config);
//!
//! cache
//!     .upsert("m5.large", "us-east-1", Tenancy::Shared, Some(vec![0.096]), None)
//!     .await;
//!
//! if let Some(prices) = cache.lookup_on_demand("m5.large", "us-east-1", Tenancy::Shared).await {
//!     println!("Cache hit: {:?}", prices);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod store;
pub mod types;

pub use config::{PriceCacheConfig, PriceCacheConfigBuilder};
pub use entry::CacheEntry;
pub use store::PriceCache;
pub use types::{
    AvailabilityZone, CacheKey, CacheStats, OnDemandPrices, PriceKind, PriceSnapshot, SpotPrices,
    Tenancy,
};

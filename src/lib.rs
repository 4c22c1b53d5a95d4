//! # EC2 Price Cache (ec2-price-cache)
//!
//! Answers "what does instance type X cost in region Y right now?" from a
//! pricing catalog (on-demand rates) and a spot price history (spot rates),
//! keeping results in a time-bounded in-memory cache.
//!
//! ## Features
//!
//! - One cache entry per (instance type, region, tenancy)
//! - Independently populated on-demand and spot prices per entry
//! - Single configurable lifetime, one hour by default
//! - Paginated upstream fetches with classified errors and no partial writes
//! - Async-first design using tokio
//!
//! ## Usage
//!
//! The upstream services are reached through the [`PricingCatalog`] and
//! [`SpotPriceHistory`] traits. The in-memory scripted providers stand in
//! for them here.
//!
//! ```no_run
//! use ec2_price_cache::{
//!     PriceCacheConfig, PriceClient, ScriptedCatalog, ScriptedSpotHistory, Tenancy,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PriceClient::new(
//!         PriceCacheConfig::from_env()?,
//!         Arc::new(ScriptedCatalog::new()),
//!         Arc::new(ScriptedSpotHistory::new()),
//!     );
//!
//!     let on_demand = client
//!         .get_on_demand_prices("m5.large", "us-east-1", Tenancy::Shared)
//!         .await?;
//!     let spot = client.get_spot_prices("m5.large", "us-east-1").await?;
//!
//!     println!("on-demand: {:?}, spot: {:?}", on_demand, spot);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod fetch;
pub mod provider;

// Re-export main types for convenience
pub use cache::{
    AvailabilityZone, CacheEntry, CacheKey, CacheStats, OnDemandPrices, PriceCache,
    PriceCacheConfig, PriceCacheConfigBuilder, PriceKind, PriceSnapshot, SpotPrices, Tenancy,
};
pub use client::PriceClient;
pub use error::{classify, PricingError, ProviderErrorKind, Result, UpstreamError};
pub use fetch::{OnDemandFetcher, SpotFetcher};
pub use provider::{
    PricingCatalog, ProductFilter, ProductPage, ProductQuery, ScriptedCatalog, ScriptedSpotHistory,
    SpotPriceHistory, SpotPriceHistoryQuery, SpotPricePage, SpotPriceRecord,
};

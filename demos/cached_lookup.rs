//! Cached Price Lookup Demo
//!
//! Runs on-demand and spot lookups twice against in-memory providers to show
//! the second round being answered from the cache.
//!
//! Usage:
//!   cargo run --example cached_lookup
//!
//! Environment variables:
//!   RUST_LOG                      - log filter (default: ec2_price_cache=debug)
//!   PRICE_CACHE_LIFETIME_SECS     - cache lifetime in seconds (default: 3600)
//!   PRICE_CACHE_PAGE_SIZE         - upstream page-size hint (default: 100)
//!   PRICE_CACHE_SPOT_WINDOW_SECS  - spot history window in seconds (default: 60)

use ec2_price_cache::{
    PriceCacheConfig, PriceClient, ProductPage, ScriptedCatalog, ScriptedSpotHistory,
    SpotPricePage, SpotPriceRecord, Tenancy,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ec2_price_cache=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PriceCacheConfig::from_env()?;
    info!("Using cache lifetime {:?}", config.cache_lifetime);

    let catalog = Arc::new(
        ScriptedCatalog::with_pages(vec![
            ProductPage::new(vec![hourly_product("0.0960000000")], Some("next".to_string())),
            ProductPage::new(vec![hourly_product("0.0960000000")], None),
        ])
        .await,
    );
    let history = Arc::new(
        ScriptedSpotHistory::with_pages(vec![SpotPricePage::new(
            vec![
                SpotPriceRecord::new("us-east-1a", "0.030000"),
                SpotPriceRecord::new("us-east-1a", "0.031000"),
                SpotPriceRecord::new("us-east-1b", "0.029000"),
            ],
            None,
        )])
        .await,
    );

    let client = PriceClient::new(config, catalog.clone(), history.clone());

    for round in 1..=2 {
        info!("\n--- Round {} ---", round);

        let on_demand = client
            .get_on_demand_prices("m5.large", "us-east-1", Tenancy::Shared)
            .await?;
        info!("On-demand m5.large in us-east-1: {:?}", on_demand);

        let spot = client.get_spot_prices("m5.large", "us-east-1").await?;
        let mut zones: Vec<_> = spot.iter().collect();
        zones.sort_by(|a, b| a.0.cmp(b.0));
        for (zone, prices) in zones {
            info!("Spot m5.large in {}: {:?}", zone, prices);
        }
    }

    info!(
        "Catalog calls: {}, spot history calls: {}",
        catalog.calls(),
        history.calls()
    );
    info!("{}", client.stats().await);

    Ok(())
}

fn hourly_product(usd: &str) -> serde_json::Value {
    json!({
        "product": { "attributes": { "instanceType": "m5.large", "regionCode": "us-east-1" } },
        "terms": {
            "OnDemand": {
                "6Z4FRH2GQVQTFR2J.JRTCKXETXF": {
                    "priceDimensions": {
                        "6Z4FRH2GQVQTFR2J.JRTCKXETXF.6YS6EN2CT7": {
                            "unit": "Hrs",
                            "pricePerUnit": { "USD": usd }
                        }
                    }
                }
            }
        }
    })
}

//! On-demand price fetcher backed by the pricing catalog

use crate::cache::{OnDemandPrices, PriceCache, Tenancy};
use crate::error::{classify, PricingError, Result};
use crate::fetch::continuation;
use crate::provider::catalog::{PricingCatalog, ProductFilter, ProductQuery, EC2_SERVICE_CODE};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Unit the catalog uses for hourly prices
pub const HOURLY_UNIT: &str = "Hrs";

/// Currency read from `pricePerUnit`
pub const PRICE_CURRENCY: &str = "USD";

#[derive(Debug, Deserialize)]
struct ProductDocument {
    terms: ProductTerms,
}

#[derive(Debug, Deserialize)]
struct ProductTerms {
    #[serde(rename = "OnDemand")]
    on_demand: BTreeMap<String, OnDemandTerm>,
}

#[derive(Debug, Deserialize)]
struct OnDemandTerm {
    #[serde(rename = "priceDimensions")]
    price_dimensions: BTreeMap<String, PriceDimension>,
}

#[derive(Debug, Deserialize)]
struct PriceDimension {
    unit: String,
    #[serde(rename = "pricePerUnit")]
    price_per_unit: HashMap<String, String>,
}

/// Fetches hourly on-demand prices, answering from the cache when it can
pub struct OnDemandFetcher {
    cache: Arc<PriceCache>,
    catalog: Arc<dyn PricingCatalog>,
}

impl OnDemandFetcher {
    pub fn new(cache: Arc<PriceCache>, catalog: Arc<dyn PricingCatalog>) -> Self {
        Self { cache, catalog }
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    /// On-demand hourly prices for the key
    ///
    /// A valid cached value is returned without calling the catalog.
    /// Otherwise every page is fetched and parsed; the concatenated list is
    /// cached and returned only if all pages succeed.
    pub async fn fetch(
        &self,
        instance_type: &str,
        region: &str,
        tenancy: Tenancy,
    ) -> Result<OnDemandPrices> {
        if let Some(prices) = self
            .cache
            .lookup_on_demand(instance_type, region, tenancy)
            .await
        {
            return Ok(prices);
        }

        let mut query = self.build_query(instance_type, region, tenancy);
        let mut prices = OnDemandPrices::new();
        let mut pages = 0usize;

        loop {
            let page = self.catalog.get_products(&query).await.map_err(|e| {
                warn!(
                    "{} request failed for {}/{}/{} after {} page(s): {}",
                    self.catalog.provider_name(),
                    instance_type,
                    region,
                    tenancy,
                    pages,
                    e
                );
                classify(e)
            })?;
            pages += 1;

            for product in &page.price_list {
                prices.extend(parse_product(product)?);
            }
            debug!(
                "Catalog page {} for {}/{}/{}: {} product(s)",
                pages,
                instance_type,
                region,
                tenancy,
                page.price_list.len()
            );

            match continuation(page.next_token) {
                Some(token) => query.next_token = Some(token),
                None => break,
            }
        }

        self.cache
            .upsert(instance_type, region, tenancy, Some(prices.clone()), None)
            .await;

        info!(
            "Fetched {} on-demand price(s) for {}/{}/{} in {} page(s)",
            prices.len(),
            instance_type,
            region,
            tenancy,
            pages
        );
        Ok(prices)
    }

    /// Catalog query for the first page
    pub fn build_query(&self, instance_type: &str, region: &str, tenancy: Tenancy) -> ProductQuery {
        let config = self.cache.config();

        ProductQuery {
            service_code: EC2_SERVICE_CODE.to_string(),
            filters: vec![
                ProductFilter::term_match("instanceType", instance_type),
                ProductFilter::term_match("regionCode", region),
                ProductFilter::term_match("marketoption", "OnDemand"),
                ProductFilter::term_match("tenancy", tenancy.as_str()),
                // Excludes AllocatedCapacityReservation and UnusedCapacityReservation
                ProductFilter::term_match("capacitystatus", "Used"),
                ProductFilter::term_match("preInstalledSw", "NA"),
                ProductFilter::term_match("operatingSystem", config.operating_system.as_str()),
            ],
            max_results: config.page_size,
            next_token: None,
        }
    }
}

/// Hourly USD prices of every on-demand price dimension of one product
pub(crate) fn parse_product(product: &Value) -> Result<Vec<f64>> {
    let document = match product {
        Value::String(raw) => serde_json::from_str::<ProductDocument>(raw),
        other => ProductDocument::deserialize(other),
    }
    .map_err(|e| PricingError::MalformedPriceData(format!("unexpected product document: {}", e)))?;

    let mut prices = Vec::new();
    for term in document.terms.on_demand.values() {
        for dimension in term.price_dimensions.values() {
            if dimension.unit != HOURLY_UNIT {
                return Err(PricingError::MalformedPriceData(format!(
                    "unexpected price unit '{}', expected '{}'",
                    dimension.unit, HOURLY_UNIT
                )));
            }

            let raw = dimension.price_per_unit.get(PRICE_CURRENCY).ok_or_else(|| {
                PricingError::MalformedPriceData(format!(
                    "price dimension has no {} price",
                    PRICE_CURRENCY
                ))
            })?;

            let price = raw.parse::<f64>().map_err(|e| {
                PricingError::MalformedPriceData(format!("price is not a number '{}': {}", raw, e))
            })?;
            prices.push(price);
        }
    }

    Ok(prices)
}

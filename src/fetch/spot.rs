//! Spot price fetcher backed by the spot price history

use crate::cache::{PriceCache, SpotPrices, Tenancy};
use crate::error::{classify, PricingError, Result};
use crate::fetch::continuation;
use crate::provider::spot::{SpotPriceHistory, SpotPriceHistoryQuery, SpotPricePage};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Error code the spot history returns when credentials are rejected
pub const AUTH_FAILURE_CODE: &str = "AuthFailure";

/// Fetches recent spot prices per availability zone, answering from the
/// cache when it can
pub struct SpotFetcher {
    cache: Arc<PriceCache>,
    history: Arc<dyn SpotPriceHistory>,
}

impl SpotFetcher {
    pub fn new(cache: Arc<PriceCache>, history: Arc<dyn SpotPriceHistory>) -> Self {
        Self { cache, history }
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    /// Spot prices observed during the history window, grouped by zone
    ///
    /// Spot entries are cached under `Tenancy::Unspecified`. An
    /// authorization failure from the provider ends pagination quietly and
    /// whatever was collected is cached and returned. Every other failure
    /// aborts the fetch and names the region it was raised for.
    pub async fn fetch(&self, instance_type: &str, region: &str) -> Result<SpotPrices> {
        if let Some(prices) = self.cache.lookup_spot(instance_type, region).await {
            return Ok(prices);
        }

        let mut query = self.build_query(instance_type, region)?;
        let mut prices = SpotPrices::new();
        let mut pages = 0usize;

        loop {
            let page = match self.history.describe_spot_price_history(&query).await {
                Ok(page) => page,
                Err(e) if e.code() == Some(AUTH_FAILURE_CODE) => {
                    warn!(
                        "{} denied access for {} in {}, continuing with {} zone(s): {}",
                        self.history.provider_name(),
                        instance_type,
                        region,
                        prices.len(),
                        e
                    );
                    SpotPricePage::default()
                }
                Err(e) => {
                    warn!(
                        "{} request failed for {} in {} after {} page(s): {}",
                        self.history.provider_name(),
                        instance_type,
                        region,
                        pages,
                        e
                    );
                    return Err(classify(e).in_region(region));
                }
            };
            pages += 1;

            for record in &page.records {
                let price = record.spot_price.parse::<f64>().map_err(|source| {
                    PricingError::InvalidPriceFormat {
                        value: record.spot_price.clone(),
                        source,
                    }
                })?;
                prices
                    .entry(record.availability_zone.clone())
                    .or_default()
                    .push(price);
            }
            debug!(
                "Spot history page {} for {} in {}: {} record(s)",
                pages,
                instance_type,
                region,
                page.records.len()
            );

            match continuation(page.next_token) {
                Some(token) => query.next_token = Some(token),
                None => break,
            }
        }

        self.cache
            .upsert(instance_type, region, Tenancy::Unspecified, None, Some(prices.clone()))
            .await;

        info!(
            "Fetched spot prices for {} in {} across {} zone(s) in {} page(s)",
            instance_type,
            region,
            prices.len(),
            pages
        );
        Ok(prices)
    }

    /// Spot history query for the first page, ending now
    pub fn build_query(&self, instance_type: &str, region: &str) -> Result<SpotPriceHistoryQuery> {
        let config = self.cache.config();
        let window = chrono::Duration::from_std(config.spot_history_window)
            .map_err(|e| PricingError::Config(format!("spot_history_window: {}", e)))?;
        let end_time = Utc::now();
        let start_time = end_time.checked_sub_signed(window).ok_or_else(|| {
            PricingError::Config(format!(
                "spot_history_window {:?} reaches before the earliest timestamp",
                config.spot_history_window
            ))
        })?;

        Ok(SpotPriceHistoryQuery {
            region: region.to_string(),
            instance_types: vec![instance_type.to_string()],
            product_descriptions: vec![config.product_description.clone()],
            start_time,
            end_time,
            max_results: config.page_size,
            next_token: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, PriceCacheConfig};
    use crate::error::{ProviderErrorKind, UpstreamError};
    use std::time::Duration;
    use crate::provider::scripted::ScriptedSpotHistory;
    use crate::provider::spot::SpotPriceRecord;

    fn record(zone: &str, price: &str) -> SpotPriceRecord {
        SpotPriceRecord::new(zone, price)
    }

    fn fetcher(history: &Arc<ScriptedSpotHistory>) -> SpotFetcher {
        SpotFetcher::new(Arc::new(PriceCache::default()), history.clone())
    }

    #[tokio::test]
    async fn test_build_query() {
        let history = Arc::new(ScriptedSpotHistory::new());
        let fetcher = fetcher(&history);

        let query = fetcher.build_query("m5.large", "us-east-1").unwrap();

        assert_eq!(query.region, "us-east-1");
        assert_eq!(query.instance_types, vec!["m5.large".to_string()]);
        assert_eq!(query.product_descriptions, vec!["Linux/UNIX".to_string()]);
        assert_eq!(query.end_time - query.start_time, chrono::Duration::seconds(60));
        assert_eq!(query.max_results, 100);
        assert_eq!(query.next_token, None);
    }

    #[tokio::test]
    async fn test_oversized_window_is_a_config_error() {
        let history = Arc::new(ScriptedSpotHistory::new());
        let config = PriceCacheConfig::builder()
            .spot_history_window(Duration::from_secs(1_000_000_000_000_000))
            .build();
        let fetcher = SpotFetcher::new(Arc::new(PriceCache::new(config)), history.clone());

        let result = fetcher.fetch("m5.large", "us-east-1").await;

        assert!(matches!(result, Err(PricingError::Config(_))));
        assert_eq!(history.calls(), 0);
    }

    #[tokio::test]
    async fn test_groups_by_zone() {
        let history = Arc::new(
            ScriptedSpotHistory::with_pages(vec![SpotPricePage::new(
                vec![
                    record("us-east-1a", "0.03"),
                    record("us-east-1b", "0.029"),
                    record("us-east-1a", "0.031"),
                ],
                None,
            )])
            .await,
        );
        let fetcher = fetcher(&history);

        let prices = fetcher.fetch("m5.large", "us-east-1").await.unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices["us-east-1a"], vec![0.03, 0.031]);
        assert_eq!(prices["us-east-1b"], vec![0.029]);
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let history = Arc::new(
            ScriptedSpotHistory::with_pages(vec![SpotPricePage::new(
                vec![record("us-east-1a", "0.03")],
                None,
            )])
            .await,
        );
        let fetcher = fetcher(&history);

        let first = fetcher.fetch("m5.large", "us-east-1").await.unwrap();
        let second = fetcher.fetch("m5.large", "us-east-1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(history.calls(), 1);
        assert!(fetcher
            .cache()
            .entry(&CacheKey::spot("m5.large", "us-east-1"))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_pages_are_merged_per_zone() {
        let history = Arc::new(
            ScriptedSpotHistory::with_pages(vec![
                SpotPricePage::new(vec![record("us-east-1a", "0.03")], Some("t1".to_string())),
                SpotPricePage::new(
                    vec![record("us-east-1a", "0.031"), record("us-east-1c", "0.04")],
                    None,
                ),
            ])
            .await,
        );
        let fetcher = fetcher(&history);

        let prices = fetcher.fetch("m5.large", "us-east-1").await.unwrap();

        assert_eq!(prices["us-east-1a"], vec![0.03, 0.031]);
        assert_eq!(prices["us-east-1c"], vec![0.04]);
        assert_eq!(history.calls(), 2);
        let queries = history.queries().await;
        assert_eq!(queries[1].next_token.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_invalid_price_format() {
        let history = Arc::new(
            ScriptedSpotHistory::with_pages(vec![SpotPricePage::new(
                vec![record("us-east-1a", "0.03"), record("us-east-1b", "n/a")],
                None,
            )])
            .await,
        );
        let fetcher = fetcher(&history);

        let result = fetcher.fetch("m5.large", "us-east-1").await;

        match result {
            Err(PricingError::InvalidPriceFormat { value, .. }) => assert_eq!(value, "n/a"),
            other => panic!("expected invalid price format, got {:?}", other),
        }
        assert!(fetcher.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_padded_price_is_rejected() {
        let history = Arc::new(
            ScriptedSpotHistory::with_pages(vec![SpotPricePage::new(
                vec![record("us-east-1a", " 0.03 ")],
                None,
            )])
            .await,
        );
        let fetcher = fetcher(&history);

        let result = fetcher.fetch("m5.large", "us-east-1").await;

        match result {
            Err(PricingError::InvalidPriceFormat { value, .. }) => assert_eq!(value, " 0.03 "),
            other => panic!("expected invalid price format, got {:?}", other),
        }
        assert!(fetcher.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_auth_failure_is_tolerated() {
        let history = Arc::new(ScriptedSpotHistory::new());
        history
            .push_page(SpotPricePage::new(
                vec![record("us-east-1a", "0.03")],
                Some("t1".to_string()),
            ))
            .await;
        history
            .push_error(UpstreamError::service(
                "AuthFailure",
                "AWS was not able to validate the provided access credentials",
            ))
            .await;
        let fetcher = fetcher(&history);

        let prices = fetcher.fetch("m5.large", "us-east-1").await.unwrap();

        assert_eq!(prices["us-east-1a"], vec![0.03]);
        assert_eq!(history.calls(), 2);
        assert_eq!(
            fetcher.cache().lookup_spot("m5.large", "us-east-1").await,
            Some(prices)
        );
    }

    #[tokio::test]
    async fn test_auth_failure_on_first_page_yields_empty_result() {
        let history = Arc::new(ScriptedSpotHistory::new());
        history
            .push_error(UpstreamError::service("AuthFailure", "denied"))
            .await;
        let fetcher = fetcher(&history);

        let prices = fetcher.fetch("m5.large", "us-east-1").await.unwrap();

        assert!(prices.is_empty());
        assert_eq!(history.calls(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_abort() {
        let history = Arc::new(ScriptedSpotHistory::new());
        history
            .push_page(SpotPricePage::new(
                vec![record("us-east-1a", "0.03")],
                Some("t1".to_string()),
            ))
            .await;
        history
            .push_error(UpstreamError::transport("connection reset by peer"))
            .await;
        let fetcher = fetcher(&history);

        let result = fetcher.fetch("m5.large", "us-east-1").await;

        let error = result.unwrap_err();
        assert!(matches!(error, PricingError::Transport(_)));
        assert!(error.to_string().contains("region us-east-1"));
        assert!(fetcher
            .cache()
            .entry(&CacheKey::new("m5.large", "us-east-1", Tenancy::Unspecified))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_service_error_aborts_with_region() {
        let history = Arc::new(ScriptedSpotHistory::new());
        history
            .push_page(SpotPricePage::new(
                vec![record("eu-west-1a", "0.02")],
                Some("t1".to_string()),
            ))
            .await;
        history
            .push_error(UpstreamError::service("InvalidParameterValue", "bad filter"))
            .await;
        let fetcher = fetcher(&history);

        let error = fetcher.fetch("m5.large", "eu-west-1").await.unwrap_err();

        assert_eq!(error.provider_kind(), Some(ProviderErrorKind::Unclassified));
        let text = error.to_string();
        assert!(text.contains("InvalidParameterValue"));
        assert!(text.contains("region eu-west-1: bad filter"));
        assert_eq!(history.calls(), 2);
        assert!(fetcher.cache().is_empty().await);
    }
}

//! Spot price history provider interface

use crate::error::UpstreamError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A spot history request for one page of records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPriceHistoryQuery {
    /// Region the caller asked about
    pub region: String,
    pub instance_types: Vec<String>,
    pub product_descriptions: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Page-size hint
    pub max_results: u32,
    pub next_token: Option<String>,
}

/// One spot price observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPriceRecord {
    pub availability_zone: String,
    /// Price as reported, not yet parsed
    pub spot_price: String,
    pub timestamp: DateTime<Utc>,
}

impl SpotPriceRecord {
    pub fn new(availability_zone: impl Into<String>, spot_price: impl Into<String>) -> Self {
        Self {
            availability_zone: availability_zone.into(),
            spot_price: spot_price.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One page of spot history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPricePage {
    pub records: Vec<SpotPriceRecord>,
    pub next_token: Option<String>,
}

impl SpotPricePage {
    pub fn new(records: Vec<SpotPriceRecord>, next_token: Option<String>) -> Self {
        Self {
            records,
            next_token,
        }
    }
}

/// Source of spot price history pages
#[async_trait]
pub trait SpotPriceHistory: Send + Sync {
    /// Fetch one page of spot history matching the query
    async fn describe_spot_price_history(
        &self,
        query: &SpotPriceHistoryQuery,
    ) -> Result<SpotPricePage, UpstreamError>;

    /// Name of this provider for logging
    fn provider_name(&self) -> &str {
        "spot-price-history"
    }
}

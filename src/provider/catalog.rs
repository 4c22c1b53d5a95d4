//! Pricing catalog provider interface

use crate::error::UpstreamError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Service code of EC2 in the pricing catalog
pub const EC2_SERVICE_CODE: &str = "AmazonEC2";

/// Filter match type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    TermMatch,
}

/// One field/type/value filter of a catalog query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub field: String,
    pub filter_type: FilterType,
    pub value: String,
}

impl ProductFilter {
    pub fn term_match(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            filter_type: FilterType::TermMatch,
            value: value.into(),
        }
    }
}

/// A catalog request for one page of products
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub service_code: String,
    pub filters: Vec<ProductFilter>,
    /// Page-size hint
    pub max_results: u32,
    pub next_token: Option<String>,
}

impl ProductQuery {
    /// Value of the first filter on `field`
    pub fn filter_value(&self, field: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.value.as_str())
    }
}

/// One page of catalog results
///
/// Each product is a JSON document, either as an object or as a string
/// holding the serialized object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub price_list: Vec<Value>,
    pub next_token: Option<String>,
}

impl ProductPage {
    pub fn new(price_list: Vec<Value>, next_token: Option<String>) -> Self {
        Self {
            price_list,
            next_token,
        }
    }
}

/// Source of pricing catalog pages
#[async_trait]
pub trait PricingCatalog: Send + Sync {
    /// Fetch one page of products matching the query
    async fn get_products(&self, query: &ProductQuery) -> Result<ProductPage, UpstreamError>;

    /// Name of this provider for logging
    fn provider_name(&self) -> &str {
        "pricing-catalog"
    }
}

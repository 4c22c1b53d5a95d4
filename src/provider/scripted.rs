//! In-memory providers that replay a fixed sequence of responses
//!
//! Responses are served in the order they were added, one per call. Once
//! the script runs out every call fails with an `Unclassified` service
//! error. Every received query is recorded.

use crate::error::UpstreamError;
use crate::provider::catalog::{PricingCatalog, ProductPage, ProductQuery};
use crate::provider::spot::{SpotPriceHistory, SpotPriceHistoryQuery, SpotPricePage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Code returned once a script is exhausted
pub const SCRIPT_EXHAUSTED_CODE: &str = "ScriptExhausted";

struct Script<Q, P> {
    responses: Mutex<VecDeque<Result<P, UpstreamError>>>,
    queries: Mutex<Vec<Q>>,
    calls: AtomicUsize,
    latency: Option<Duration>,
}

impl<Q: Clone, P> Script<Q, P> {
    fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            latency: None,
        }
    }

    async fn push(&self, response: Result<P, UpstreamError>) {
        self.responses.lock().await.push_back(response);
    }

    async fn next(&self, query: &Q) -> Result<P, UpstreamError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.queries.lock().await.push(query.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let response = self.responses.lock().await.pop_front();
        debug!("Scripted provider call #{}", call);
        response.unwrap_or_else(|| {
            Err(UpstreamError::service(
                SCRIPT_EXHAUSTED_CODE,
                format!("no scripted response for call #{}", call),
            ))
        })
    }
}

/// Pricing catalog replaying scripted pages
pub struct ScriptedCatalog {
    script: Script<ProductQuery, ProductPage>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self {
            script: Script::new(),
        }
    }

    /// Build a catalog serving the given pages in order
    pub async fn with_pages(pages: Vec<ProductPage>) -> Self {
        let catalog = Self::new();
        for page in pages {
            catalog.push_page(page).await;
        }
        catalog
    }

    /// Delay every response
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.script.latency = Some(latency);
        self
    }

    pub async fn push_page(&self, page: ProductPage) {
        self.script.push(Ok(page)).await;
    }

    pub async fn push_error(&self, error: UpstreamError) {
        self.script.push(Err(error)).await;
    }

    /// Number of `get_products` calls so far
    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    /// Queries received so far, oldest first
    pub async fn queries(&self) -> Vec<ProductQuery> {
        self.script.queries.lock().await.clone()
    }
}

impl Default for ScriptedCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PricingCatalog for ScriptedCatalog {
    async fn get_products(&self, query: &ProductQuery) -> Result<ProductPage, UpstreamError> {
        self.script.next(query).await
    }

    fn provider_name(&self) -> &str {
        "scripted-catalog"
    }
}

/// Spot price history replaying scripted pages
pub struct ScriptedSpotHistory {
    script: Script<SpotPriceHistoryQuery, SpotPricePage>,
}

impl ScriptedSpotHistory {
    pub fn new() -> Self {
        Self {
            script: Script::new(),
        }
    }

    /// Build a history serving the given pages in order
    pub async fn with_pages(pages: Vec<SpotPricePage>) -> Self {
        let history = Self::new();
        for page in pages {
            history.push_page(page).await;
        }
        history
    }

    /// Delay every response
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.script.latency = Some(latency);
        self
    }

    pub async fn push_page(&self, page: SpotPricePage) {
        self.script.push(Ok(page)).await;
    }

    pub async fn push_error(&self, error: UpstreamError) {
        self.script.push(Err(error)).await;
    }

    /// Number of `describe_spot_price_history` calls so far
    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    /// Queries received so far, oldest first
    pub async fn queries(&self) -> Vec<SpotPriceHistoryQuery> {
        self.script.queries.lock().await.clone()
    }
}

impl Default for ScriptedSpotHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpotPriceHistory for ScriptedSpotHistory {
    async fn describe_spot_price_history(
        &self,
        query: &SpotPriceHistoryQuery,
    ) -> Result<SpotPricePage, UpstreamError> {
        self.script.next(query).await
    }

    fn provider_name(&self) -> &str {
        "scripted-spot-history"
    }
}

//! Configuration for the price cache and fetchers

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the cache lifetime, in seconds
pub const ENV_CACHE_LIFETIME_SECS: &str = "PRICE_CACHE_LIFETIME_SECS";
/// Environment variable overriding the upstream page-size hint
pub const ENV_PAGE_SIZE: &str = "PRICE_CACHE_PAGE_SIZE";
/// Environment variable overriding the spot history window, in seconds
pub const ENV_SPOT_WINDOW_SECS: &str = "PRICE_CACHE_SPOT_WINDOW_SECS";

/// Longest spot history window accepted, matching the 90 days of history
/// the spot price service retains
pub const MAX_SPOT_HISTORY_WINDOW: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Configuration for price lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCacheConfig {
    /// How long a written entry stays valid
    pub cache_lifetime: Duration,

    /// Page-size hint sent with every upstream request
    pub page_size: u32,

    /// How far back spot history is requested
    pub spot_history_window: Duration,

    /// Operating system filter for the pricing catalog
    pub operating_system: String,

    /// Product description filter for spot history
    pub product_description: String,

    /// Enable hit/miss counters
    pub enable_metrics: bool,
}

impl Default for PriceCacheConfig {
    fn default() -> Self {
        Self {
            cache_lifetime: Duration::from_secs(3600),
            page_size: 100,
            spot_history_window: Duration::from_secs(60),
            operating_system: "Linux".to_string(),
            product_description: "Linux/UNIX".to_string(),
            enable_metrics: true,
        }
    }
}

impl PriceCacheConfig {
    /// Create a new builder for the configuration
    pub fn builder() -> PriceCacheConfigBuilder {
        PriceCacheConfigBuilder::default()
    }

    /// Defaults overridden by `PRICE_CACHE_*` variables, reading `.env` first
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CACHE_LIFETIME_SECS)? {
            builder = builder.cache_lifetime(Duration::from_secs(secs));
        }
        if let Some(size) = parse_var::<u32, _>(&lookup, ENV_PAGE_SIZE)? {
            builder = builder.page_size(size);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_SPOT_WINDOW_SECS)? {
            builder = builder.spot_history_window(Duration::from_secs(secs));
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(PricingError::Config(
                "page_size must be greater than 0".to_string(),
            ));
        }

        if self.spot_history_window.is_zero() {
            return Err(PricingError::Config(
                "spot_history_window must be greater than 0".to_string(),
            ));
        }

        if self.spot_history_window > MAX_SPOT_HISTORY_WINDOW {
            return Err(PricingError::Config(format!(
                "spot_history_window must not exceed {:?}",
                MAX_SPOT_HISTORY_WINDOW
            )));
        }

        if self.operating_system.is_empty() || self.product_description.is_empty() {
            return Err(PricingError::Config(
                "operating_system and product_description must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PricingError::Config(format!("{}='{}': {}", name, raw, e))),
    }
}

/// Builder for the price cache configuration
#[derive(Debug, Default)]
pub struct PriceCacheConfigBuilder {
    cache_lifetime: Option<Duration>,
    page_size: Option<u32>,
    spot_history_window: Option<Duration>,
    operating_system: Option<String>,
    product_description: Option<String>,
    enable_metrics: Option<bool>,
}

impl PriceCacheConfigBuilder {
    /// Set how long entries stay valid
    pub fn cache_lifetime(mut self, lifetime: Duration) -> Self {
        self.cache_lifetime = Some(lifetime);
        self
    }

    /// Set the upstream page-size hint
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Set the spot history window
    pub fn spot_history_window(mut self, window: Duration) -> Self {
        self.spot_history_window = Some(window);
        self
    }

    pub fn operating_system(mut self, os: impl Into<String>) -> Self {
        self.operating_system = Some(os.into());
        self
    }

    pub fn product_description(mut self, description: impl Into<String>) -> Self {
        self.product_description = Some(description.into());
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the configuration
    pub fn build(self) -> PriceCacheConfig {
        let defaults = PriceCacheConfig::default();

        PriceCacheConfig {
            cache_lifetime: self.cache_lifetime.unwrap_or(defaults.cache_lifetime),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            spot_history_window: self
                .spot_history_window
                .unwrap_or(defaults.spot_history_window),
            operating_system: self.operating_system.unwrap_or(defaults.operating_system),
            product_description: self
                .product_description
                .unwrap_or(defaults.product_description),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PriceCacheConfig::default();
        assert_eq!(config.cache_lifetime, Duration::from_secs(3600));
        assert_eq!(config.page_size, 100);
        assert_eq!(config.spot_history_window, Duration::from_secs(60));
        assert_eq!(config.operating_system, "Linux");
        assert_eq!(config.product_description, "Linux/UNIX");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PriceCacheConfig::builder()
            .cache_lifetime(Duration::from_secs(600))
            .page_size(50)
            .enable_metrics(false)
            .build();

        assert_eq!(config.cache_lifetime, Duration::from_secs(600));
        assert_eq!(config.page_size, 50);
        assert!(!config.enable_metrics);
        assert_eq!(config.product_description, "Linux/UNIX");
    }

    #[test]
    fn test_config_validation() {
        let config = PriceCacheConfig::builder().page_size(0).build();
        assert!(matches!(config.validate(), Err(PricingError::Config(_))));

        let config = PriceCacheConfig::builder()
            .spot_history_window(Duration::from_secs(0))
            .build();
        assert!(config.validate().is_err());

        let config = PriceCacheConfig::builder()
            .spot_history_window(MAX_SPOT_HISTORY_WINDOW)
            .build();
        assert!(config.validate().is_ok());

        let config = PriceCacheConfig::builder()
            .spot_history_window(Duration::from_secs(1_000_000_000_000_000))
            .build();
        assert!(matches!(config.validate(), Err(PricingError::Config(_))));
    }

    #[test]
    fn test_from_lookup_rejects_oversized_window() {
        let result = PriceCacheConfig::from_lookup(|name| {
            (name == ENV_SPOT_WINDOW_SECS).then(|| "1000000000000000".to_string())
        });
        assert!(matches!(result, Err(PricingError::Config(_))));
    }

    #[test]
    fn test_zero_lifetime_is_allowed() {
        let config = PriceCacheConfig::builder()
            .cache_lifetime(Duration::from_secs(0))
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_CACHE_LIFETIME_SECS, "120"),
            (ENV_PAGE_SIZE, " 25 "),
            (ENV_SPOT_WINDOW_SECS, ""),
        ]
        .into_iter()
        .collect();

        let config =
            PriceCacheConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(config.cache_lifetime, Duration::from_secs(120));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.spot_history_window, Duration::from_secs(60));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = PriceCacheConfig::from_lookup(|name| {
            (name == ENV_CACHE_LIFETIME_SECS).then(|| "an hour".to_string())
        });

        match result {
            Err(PricingError::Config(message)) => {
                assert!(message.contains(ENV_CACHE_LIFETIME_SECS));
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup_validates() {
        let result =
            PriceCacheConfig::from_lookup(|name| (name == ENV_PAGE_SIZE).then(|| "0".to_string()));
        assert!(result.is_err());
    }
}

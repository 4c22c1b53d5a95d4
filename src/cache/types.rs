//! Core type definitions for the price cache

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Availability zone name, e.g. `us-east-1a`
pub type AvailabilityZone = String;

/// Hourly on-demand prices in USD, in provider order
pub type OnDemandPrices = Vec<f64>;

/// Spot prices in USD grouped by availability zone
pub type SpotPrices = HashMap<AvailabilityZone, Vec<f64>>;

/// Instance tenancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tenancy {
    /// Shared hardware
    #[default]
    Shared,
    /// Dedicated host
    Host,
    /// Dedicated instance
    Dedicated,
    /// No tenancy; spot entries are keyed with this
    #[serde(rename = "")]
    Unspecified,
}

impl Tenancy {
    /// Value used in catalog filters and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Tenancy::Shared => "Shared",
            Tenancy::Host => "Host",
            Tenancy::Dedicated => "Dedicated",
            Tenancy::Unspecified => "",
        }
    }
}

impl fmt::Display for Tenancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tenancy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Shared" | "shared" | "default" => Ok(Tenancy::Shared),
            "Host" | "host" => Ok(Tenancy::Host),
            "Dedicated" | "dedicated" => Ok(Tenancy::Dedicated),
            "" => Ok(Tenancy::Unspecified),
            other => Err(format!("unknown tenancy: {}", other)),
        }
    }
}

/// Which half of a cache entry a lookup is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceKind {
    OnDemand,
    Spot,
}

impl fmt::Display for PriceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceKind::OnDemand => write!(f, "on_demand"),
            PriceKind::Spot => write!(f, "spot"),
        }
    }
}

/// Composite cache key: instance type, region and tenancy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub instance_type: String,
    pub region: String,
    pub tenancy: Tenancy,
}

impl CacheKey {
    pub fn new(instance_type: impl Into<String>, region: impl Into<String>, tenancy: Tenancy) -> Self {
        Self {
            instance_type: instance_type.into(),
            region: region.into(),
            tenancy,
        }
    }

    /// Key used for spot prices
    pub fn spot(instance_type: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(instance_type, region, Tenancy::Unspecified)
    }

    pub fn matches(&self, instance_type: &str, region: &str, tenancy: Tenancy) -> bool {
        self.instance_type == instance_type && self.region == region && self.tenancy == tenancy
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.instance_type, self.region, self.tenancy)
    }
}

/// Price data returned by a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum PriceSnapshot {
    OnDemand(OnDemandPrices),
    Spot(SpotPrices),
}

impl PriceSnapshot {
    pub fn kind(&self) -> PriceKind {
        match self {
            PriceSnapshot::OnDemand(_) => PriceKind::OnDemand,
            PriceSnapshot::Spot(_) => PriceKind::Spot,
        }
    }

    pub fn into_on_demand(self) -> Option<OnDemandPrices> {
        match self {
            PriceSnapshot::OnDemand(prices) => Some(prices),
            PriceSnapshot::Spot(_) => None,
        }
    }

    pub fn into_spot(self) -> Option<SpotPrices> {
        match self {
            PriceSnapshot::Spot(prices) => Some(prices),
            PriceSnapshot::OnDemand(_) => None,
        }
    }
}

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,

    /// Lookups that found nothing valid
    pub misses: u64,

    /// Upserts applied
    pub writes: u64,

    /// Number of distinct keys held
    pub entries: usize,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, writes: {}, entries: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.writes,
            self.entries
        )
    }
}

//! Cache entry with independently populated on-demand and spot prices

use crate::cache::types::{CacheKey, OnDemandPrices, PriceKind, PriceSnapshot, SpotPrices};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One cached key
///
/// Both price kinds share `last_written`: writing either refreshes the
/// freshness of the whole entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// Time of the most recent write of either kind
    pub last_written: DateTime<Utc>,

    /// Absent until the first successful on-demand fetch
    pub on_demand: Option<OnDemandPrices>,

    /// Absent until the first successful spot fetch
    pub spot: Option<SpotPrices>,
}

impl CacheEntry {
    /// Create an entry written now
    pub fn new(key: CacheKey, on_demand: Option<OnDemandPrices>, spot: Option<SpotPrices>) -> Self {
        Self::written_at(key, on_demand, spot, Utc::now())
    }

    /// Create an entry with an explicit write time
    pub fn written_at(
        key: CacheKey,
        on_demand: Option<OnDemandPrices>,
        spot: Option<SpotPrices>,
        last_written: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            last_written,
            on_demand,
            spot,
        }
    }

    /// Time elapsed since the last write, zero if the clock went backwards
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_written)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    /// `now <= last_written + lifetime`
    pub fn is_fresh_at(&self, lifetime: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) <= lifetime
    }

    pub fn has(&self, kind: PriceKind) -> bool {
        match kind {
            PriceKind::OnDemand => self.on_demand.is_some(),
            PriceKind::Spot => self.spot.is_some(),
        }
    }

    /// Fresh and holding data of the requested kind
    pub fn is_valid_for(&self, kind: PriceKind, lifetime: Duration, now: DateTime<Utc>) -> bool {
        self.has(kind) && self.is_fresh_at(lifetime, now)
    }

    /// Copy out the requested kind
    pub fn snapshot(&self, kind: PriceKind) -> Option<PriceSnapshot> {
        match kind {
            PriceKind::OnDemand => self.on_demand.clone().map(PriceSnapshot::OnDemand),
            PriceKind::Spot => self.spot.clone().map(PriceSnapshot::Spot),
        }
    }

    /// Refresh `last_written` and merge in whichever kinds are present
    ///
    /// A `None` never clears data of that kind.
    pub fn merge(
        &mut self,
        on_demand: Option<OnDemandPrices>,
        spot: Option<SpotPrices>,
        now: DateTime<Utc>,
    ) {
        self.last_written = now;
        if let Some(prices) = on_demand {
            self.on_demand = Some(prices);
        }
        if let Some(prices) = spot {
            self.spot = Some(prices);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::types::Tenancy;
    use std::collections::HashMap;

    fn key() -> CacheKey {
        CacheKey::new("m5.large", "us-east-1", Tenancy::Shared)
    }

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new(key(), Some(vec![0.096]), None);

        assert_eq!(entry.key, key());
        assert!(entry.has(PriceKind::OnDemand));
        assert!(!entry.has(PriceKind::Spot));
        assert!(entry.is_fresh_at(Duration::from_secs(3600), Utc::now()));
    }

    #[test]
    fn test_freshness_boundary() {
        let written = Utc::now();
        let entry = CacheEntry::written_at(key(), Some(vec![0.1]), None, written);
        let lifetime = Duration::from_secs(60);

        assert!(entry.is_fresh_at(lifetime, written + chrono::Duration::seconds(60)));
        assert!(!entry.is_fresh_at(lifetime, written + chrono::Duration::seconds(61)));
    }

    #[test]
    fn test_clock_going_backwards_counts_as_fresh() {
        let written = Utc::now();
        let entry = CacheEntry::written_at(key(), Some(vec![0.1]), None, written);
        let earlier = written - chrono::Duration::seconds(5);

        assert_eq!(entry.age_at(earlier), Duration::from_secs(0));
        assert!(entry.is_fresh_at(Duration::from_secs(1), earlier));
    }

    #[test]
    fn test_valid_requires_kind() {
        let entry = CacheEntry::new(key(), Some(vec![0.1]), None);
        let now = Utc::now();
        let lifetime = Duration::from_secs(3600);

        assert!(entry.is_valid_for(PriceKind::OnDemand, lifetime, now));
        assert!(!entry.is_valid_for(PriceKind::Spot, lifetime, now));
    }

    #[test]
    fn test_merge_keeps_other_kind() {
        let written = Utc::now() - chrono::Duration::minutes(30);
        let mut entry = CacheEntry::written_at(key(), Some(vec![0.096]), None, written);

        let mut spot = HashMap::new();
        spot.insert("us-east-1a".to_string(), vec![0.03]);
        let now = Utc::now();
        entry.merge(None, Some(spot.clone()), now);

        assert_eq!(entry.last_written, now);
        assert_eq!(entry.on_demand, Some(vec![0.096]));
        assert_eq!(entry.spot, Some(spot));
    }

    #[test]
    fn test_merge_with_nothing_only_refreshes() {
        let written = Utc::now() - chrono::Duration::minutes(30);
        let mut entry = CacheEntry::written_at(key(), Some(vec![0.096]), None, written);
        let now = Utc::now();

        entry.merge(None, None, now);

        assert_eq!(entry.last_written, now);
        assert_eq!(entry.on_demand, Some(vec![0.096]));
        assert!(entry.spot.is_none());
    }

    #[test]
    fn test_snapshot() {
        let entry = CacheEntry::new(key(), Some(vec![0.096, 0.1]), None);
        assert_eq!(
            entry.snapshot(PriceKind::OnDemand),
            Some(PriceSnapshot::OnDemand(vec![0.096, 0.1]))
        );
        assert_eq!(entry.snapshot(PriceKind::Spot), None);
    }
}

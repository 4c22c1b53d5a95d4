//! Cache-through fetchers for on-demand and spot prices
//!
//! Both fetchers follow the same shape: consult the [`PriceCache`], and on a
//! miss page through the provider until it stops returning a continuation
//! token. Any failure aborts the whole fetch without touching the cache.
//! The cache lock is never held across a provider call.
//!
//! [`PriceCache`]: crate::cache::PriceCache

pub mod on_demand;
pub mod spot;

pub use on_demand::OnDemandFetcher;
pub use spot::SpotFetcher;

/// Token for the next request, `None` once pagination is over
///
/// An empty token ends pagination like a missing one.
pub(crate) fn continuation(next_token: Option<String>) -> Option<String> {
    match next_token {
        Some(token) if !token.is_empty() => Some(token),
        _ => None,
    }
}

//! Upstream provider interfaces
//!
//! The pricing catalog and the spot price history are external services.
//! The fetchers only see them through [`PricingCatalog`] and
//! [`SpotPriceHistory`]; wiring them to real endpoints and credentials is
//! left to the embedding application.

pub mod catalog;
pub mod scripted;
pub mod spot;

pub use catalog::{
    FilterType, PricingCatalog, ProductFilter, ProductPage, ProductQuery, EC2_SERVICE_CODE,
};
pub use scripted::{ScriptedCatalog, ScriptedSpotHistory};
pub use spot::{SpotPriceHistory, SpotPriceHistoryQuery, SpotPricePage, SpotPriceRecord};

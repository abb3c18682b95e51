//! Minimum Fare Domain
//!
//! This module applies the ATPCO minimum fare checks to a priced fare path.
//! Each check walks the intermediate city pairs of a pricing unit, selects a
//! comparable published fare for every sub-range and raises a plus-up when
//! that fare exceeds what was charged.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Service    │  ← Fare path orchestration (HIP/BHC, CTM, COP, COM)
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   Modules    │  ← Per-module drivers, posting plus-ups
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │ MinimumFare  │  ← Intermediate sweep, exclusions, comparison
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │  Selection   │  ← Normal/special/round trip fare selection
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   Matchers   │  ← Application, default logic, rule level tables
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │  Repository  │  ← Data handle (trait + in-memory implementation)
//! └──────────────┘
//! ```

pub mod cache;
pub mod diag;
pub mod error;
pub mod geo;
pub mod itinerary;
pub mod logic;
pub mod matchers;
pub mod metrics;
pub mod minimum_fare;
pub mod models;
pub mod modules;
pub mod repository;
pub mod selection;
pub mod service;
pub mod tables;
pub mod trx;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use cache::MinFareCache;
pub use diag::{DiagCollector, DiagnosticType};
pub use error::{MinFareError, MinFareResult};
pub use itinerary::{
    FareByRuleInfo, FareMarket, FarePath, FareUsage, Loc, MinFarePlusUp, MinFarePlusUpItem,
    OscPlusUp, PaxTypeFare, PlusUpInfo, PricingUnit, TravelSeg,
};
pub use minimum_fare::MinimumFare;
pub use models::{
    CabinType, CurrencyCode, EligibleFare, FareDirection, GeoTravelType, MinimumFareModule, Money,
    PaxTypeStatus, PricingUnitType,
};
pub use modules::{
    BhcMinimumFare, ComMinimumFare, CopMinimumFare, CtmMinimumFare, HipMinimumFare,
};
pub use repository::{DataSet, InMemoryDataHandle, MinFareDataHandle};
pub use service::{MinFareSummary, MinimumFareService};
pub use trx::{PricingRequest, PricingTrx};

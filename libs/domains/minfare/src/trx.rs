//! The pricing transaction the minimum fare checks run inside.

use chrono::NaiveDate;
use core_config::minfare::MinFareConfig;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use uuid::Uuid;

use crate::diag::{DiagCollector, DiagnosticType};
use crate::itinerary::{Loc, TravelSeg};
use crate::models::{CurrencyCode, SaleIndicator};
use crate::repository::MinFareDataHandle;

/// Request-level data of a pricing transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRequest {
    pub ticketing_date: NaiveDate,
    pub travel_segs: Vec<TravelSeg>,
    pub sale_loc: Loc,
    /// Defaults to the sale location
    #[serde(default)]
    pub ticketing_loc: Option<Loc>,
    pub ticketing_carrier: String,
    /// Currency of payment
    #[serde(default)]
    pub calculation_currency: CurrencyCode,
}

/// Transaction context: the itinerary arena plus the injected services.
pub struct PricingTrx {
    pub id: Uuid,
    pub ticketing_date: NaiveDate,
    pub travel_segs: Vec<TravelSeg>,
    pub sale_loc: Loc,
    pub ticketing_loc: Loc,
    pub ticketing_carrier: String,
    pub calculation_currency: CurrencyCode,
    data: Arc<dyn MinFareDataHandle>,
    config: MinFareConfig,
    diag: DiagCollector,
}

impl PricingTrx {
    pub fn new(
        request: PricingRequest,
        data: Arc<dyn MinFareDataHandle>,
        config: MinFareConfig,
    ) -> Self {
        let active = config
            .diagnostic
            .and_then(|number| match DiagnosticType::try_from(number) {
                Ok(diag) => Some(diag),
                Err(number) => {
                    tracing::warn!(diagnostic = number, "Unknown minimum fare diagnostic");
                    None
                }
            });
        let ticketing_loc = request
            .ticketing_loc
            .unwrap_or_else(|| request.sale_loc.clone());

        Self {
            id: Uuid::now_v7(),
            ticketing_date: request.ticketing_date,
            travel_segs: request.travel_segs,
            sale_loc: request.sale_loc,
            ticketing_loc,
            ticketing_carrier: request.ticketing_carrier,
            calculation_currency: request.calculation_currency,
            data,
            config,
            diag: DiagCollector::new(active),
        }
    }

    pub fn seg(&self, index: usize) -> &TravelSeg {
        &self.travel_segs[index]
    }

    pub fn segs(&self, range: Range<usize>) -> &[TravelSeg] {
        &self.travel_segs[range]
    }

    pub fn data(&self) -> &dyn MinFareDataHandle {
        self.data.as_ref()
    }

    pub fn config(&self) -> &MinFareConfig {
        &self.config
    }

    pub fn diag(&self) -> &DiagCollector {
        &self.diag
    }

    /// Whether every index in `range` addresses an itinerary segment
    pub fn contains(&self, range: &Range<usize>) -> bool {
        range.start <= range.end && range.end <= self.travel_segs.len()
    }

    /// Nation where the journey starts
    pub fn journey_origin_nation(&self) -> Option<&str> {
        self.travel_segs.first().map(|s| s.origin.nation.as_str())
    }

    /// Sale/ticketing location relative to the journey origin nation
    pub fn sale_indicator(&self) -> SaleIndicator {
        let origin = self.journey_origin_nation().unwrap_or_default();
        let sold_inside = self.sale_loc.nation == origin;
        let ticketed_inside = self.ticketing_loc.nation == origin;
        match (sold_inside, ticketed_inside) {
            (true, true) => SaleIndicator::Siti,
            (true, false) => SaleIndicator::Sito,
            (false, true) => SaleIndicator::Soti,
            (false, false) => SaleIndicator::Soto,
        }
    }
}

impl std::fmt::Debug for PricingTrx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingTrx")
            .field("id", &self.id)
            .field("ticketing_date", &self.ticketing_date)
            .field("segments", &self.travel_segs.len())
            .field("ticketing_carrier", &self.ticketing_carrier)
            .finish()
    }
}

//! Itinerary and transaction builders for unit tests.

use chrono::NaiveDate;
use core_config::minfare::MinFareConfig;
use std::sync::Arc;

use crate::itinerary::{FareMarket, FareUsage, Loc, PaxTypeFare, TravelSeg};
use crate::models::CurrencyCode;
use crate::repository::{InMemoryDataHandle, MinFareDataHandle};
use crate::trx::{PricingRequest, PricingTrx};

pub(crate) fn loc(code: &str, nation: &str, area: &str) -> Loc {
    Loc::new(code, nation, area)
}

pub(crate) fn ticketing_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
}

pub(crate) fn fare_usage(segs: std::ops::Range<usize>, carrier: &str, fare: PaxTypeFare) -> FareUsage {
    FareUsage::new(FareMarket::new(segs, carrier), fare)
}

pub(crate) struct TrxBuilder {
    segs: Vec<TravelSeg>,
    data: Arc<dyn MinFareDataHandle>,
    config: MinFareConfig,
    sale_loc: Option<Loc>,
    ticketing_loc: Option<Loc>,
    ticketing_carrier: String,
}

impl TrxBuilder {
    pub(crate) fn new() -> Self {
        Self {
            segs: Vec::new(),
            data: Arc::new(InMemoryDataHandle::new()),
            config: MinFareConfig::default(),
            sale_loc: None,
            ticketing_loc: None,
            ticketing_carrier: String::new(),
        }
    }

    fn next_order(&self) -> u16 {
        self.segs.len() as u16 + 1
    }

    pub(crate) fn air(mut self, origin: Loc, destination: Loc, carrier: &str) -> Self {
        let seg = TravelSeg::air(self.next_order(), origin, destination, carrier);
        self.segs.push(seg);
        self
    }

    pub(crate) fn arunk(mut self, origin: Loc, destination: Loc) -> Self {
        let seg = TravelSeg::arunk(self.next_order(), origin, destination);
        self.segs.push(seg);
        self
    }

    /// Adjusts the last added segment
    pub(crate) fn seg(mut self, f: impl FnOnce(TravelSeg) -> TravelSeg) -> Self {
        if let Some(last) = self.segs.pop() {
            self.segs.push(f(last));
        }
        self
    }

    pub(crate) fn data(mut self, data: impl MinFareDataHandle + 'static) -> Self {
        self.data = Arc::new(data);
        self
    }

    pub(crate) fn config(mut self, config: MinFareConfig) -> Self {
        self.config = config;
        self
    }

    pub(crate) fn sale(mut self, sale_loc: Loc, ticketing_loc: Loc) -> Self {
        self.sale_loc = Some(sale_loc);
        self.ticketing_loc = Some(ticketing_loc);
        self
    }

    pub(crate) fn ticketing_carrier(mut self, carrier: &str) -> Self {
        self.ticketing_carrier = carrier.to_string();
        self
    }

    pub(crate) fn build(self) -> PricingTrx {
        let origin = self
            .segs
            .first()
            .map(|s| s.origin.clone())
            .unwrap_or_default();
        let carrier = if self.ticketing_carrier.is_empty() {
            self.segs
                .iter()
                .find_map(|s| s.carrier.clone())
                .unwrap_or_default()
        } else {
            self.ticketing_carrier
        };
        let request = PricingRequest {
            ticketing_date: ticketing_date(),
            travel_segs: self.segs,
            sale_loc: self.sale_loc.unwrap_or_else(|| origin.clone()),
            ticketing_loc: self.ticketing_loc,
            ticketing_carrier: carrier,
            calculation_currency: CurrencyCode::NUC,
        };
        PricingTrx::new(request, self.data, self.config)
    }
}

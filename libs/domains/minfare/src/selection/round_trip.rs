//! Paired outbound/inbound fare selection.

use std::ops::Range;
use std::sync::Arc;

use super::{FareSelector, PtfPair, SelectionRequest, global_direction_of, is_rule_level_excluded};
use crate::cache::MinFareCache;
use crate::itinerary::{PaxTypeFare, PricingUnit};
use crate::logic::select_const_with_status;
use crate::models::{FareDirection, MinimumFareModule, Money, PaxTypeStatus};
use crate::trx::PricingTrx;

/// Outbound and inbound fares of a round trip comparison
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTripFare {
    pub outbound: PtfPair,
    pub inbound: PtfPair,
    /// Status both fares were selected at, when selected together
    pub pax_type_status: Option<PaxTypeStatus>,
}

impl RoundTripFare {
    pub fn amount(&self) -> Money {
        self.outbound.amount() + self.inbound.amount()
    }
}

/// Selects the fares of a round trip over two ranges of a pricing unit.
///
/// Both directions sharing a global direction are selected at one passenger
/// status; otherwise each direction escalates on its own.
pub struct RoundTripFareSelection<'a> {
    trx: &'a PricingTrx,
    pu: &'a PricingUnit,
    selector: FareSelector,
    base: SelectionRequest<'a>,
}

impl<'a> RoundTripFareSelection<'a> {
    pub fn new(trx: &'a PricingTrx, pu: &'a PricingUnit, base: SelectionRequest<'a>) -> Self {
        Self {
            trx,
            pu,
            selector: FareSelector::for_fare(base.thru_fare),
            base,
        }
    }

    /// Fares for `outbound` and for `inbound` (repriced in the reverse
    /// direction)
    pub fn select_fare(
        &self,
        cache: &mut MinFareCache,
        outbound: Range<usize>,
        inbound: Range<usize>,
    ) -> Option<RoundTripFare> {
        let reused = if self.base.module == MinimumFareModule::Ctm {
            self.reuse_thru_fare(&outbound, &inbound)
        } else {
            (None, None)
        };

        let ob_gd = global_direction_of(self.trx, outbound.clone());
        let ib_gd = global_direction_of(self.trx, inbound.clone());
        if ob_gd.is_some() && ob_gd == ib_gd {
            self.select_fare_same_gi(cache, outbound, inbound, reused)
        } else {
            self.select_fare_diff_gi(cache, outbound, inbound, reused)
        }
    }

    /// The pricing unit's own front and back thru fares, for directions whose
    /// range is exactly that fare usage's market and whose fare is not
    /// excluded at rule level
    pub fn reuse_thru_fare(
        &self,
        outbound: &Range<usize>,
        inbound: &Range<usize>,
    ) -> (Option<Arc<PaxTypeFare>>, Option<Arc<PaxTypeFare>>) {
        let reuse = |fu: Option<&crate::itinerary::FareUsage>, range: &Range<usize>| {
            fu.filter(|fu| fu.fare_market.segs == *range)
                .filter(|fu| {
                    !is_rule_level_excluded(self.trx, self.base.module, &fu.fare, range.clone())
                })
                .map(|fu| Arc::clone(&fu.fare))
        };
        (
            reuse(self.pu.fare_usages.first(), outbound),
            reuse(self.pu.fare_usages.last(), inbound),
        )
    }

    fn start_status(&self) -> PaxTypeStatus {
        self.base
            .pax_type_status
            .max(self.base.thru_fare.pax_type_status)
    }

    fn select_direction(
        &self,
        cache: &mut MinFareCache,
        segs: Range<usize>,
        direction: FareDirection,
        status: PaxTypeStatus,
    ) -> Option<PtfPair> {
        let req = self
            .base
            .with_segs(segs)
            .with_direction(direction)
            .with_pax_type_status(status);
        select_const_with_status(self.trx, cache, self.selector, &req)
    }

    fn select_fare_same_gi(
        &self,
        cache: &mut MinFareCache,
        outbound: Range<usize>,
        inbound: Range<usize>,
        reused: (Option<Arc<PaxTypeFare>>, Option<Arc<PaxTypeFare>>),
    ) -> Option<RoundTripFare> {
        let mut status = self.start_status();
        loop {
            let ob = match &reused.0 {
                Some(fare) => Some(PtfPair::single(Arc::clone(fare))),
                None => self.select_direction(cache, outbound.clone(), FareDirection::Outbound, status),
            };
            let ib = match &reused.1 {
                Some(fare) => Some(PtfPair::single(Arc::clone(fare))),
                None => self.select_direction(cache, inbound.clone(), FareDirection::Inbound, status),
            };
            if let (Some(outbound), Some(inbound)) = (ob, ib) {
                return Some(RoundTripFare {
                    outbound,
                    inbound,
                    pax_type_status: Some(status),
                });
            }
            status = status.escalate()?;
        }
    }

    fn select_fare_diff_gi(
        &self,
        cache: &mut MinFareCache,
        outbound: Range<usize>,
        inbound: Range<usize>,
        reused: (Option<Arc<PaxTypeFare>>, Option<Arc<PaxTypeFare>>),
    ) -> Option<RoundTripFare> {
        let ob = match reused.0 {
            Some(fare) => PtfPair::single(fare),
            None => self.escalating(cache, outbound, FareDirection::Outbound)?,
        };
        let ib = match reused.1 {
            Some(fare) => PtfPair::single(fare),
            None => self.escalating(cache, inbound, FareDirection::Inbound)?,
        };
        Some(RoundTripFare {
            outbound: ob,
            inbound: ib,
            pax_type_status: None,
        })
    }

    fn escalating(
        &self,
        cache: &mut MinFareCache,
        segs: Range<usize>,
        direction: FareDirection,
    ) -> Option<PtfPair> {
        let mut status = self.start_status();
        loop {
            if let Some(pair) = self.select_direction(cache, segs.clone(), direction, status) {
                return Some(pair);
            }
            status = status.escalate()?;
        }
    }
}

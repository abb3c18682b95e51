//! Circle Trip Minimum check.

use std::collections::BTreeMap;
use std::ops::Range;

use super::{post_on_pricing_unit, pricing_unit, pricing_unit_amount};
use crate::cache::MinFareCache;
use crate::error::{MinFareError, MinFareResult};
use crate::itinerary::{FarePath, PricingUnit};
use crate::logic::{
    Application, OverrideLogic, get_override_logic, is_mixed_cabin, is_thru_fare_excluded,
};
use crate::metrics::MinFareMetrics;
use crate::minimum_fare::MinimumFare;
use crate::models::{EligibleFare, MinimumFareModule, Money, PricingUnitType};
use crate::selection::{RoundTripFare, RoundTripFareSelection, SelectionRequest};
use crate::trx::PricingTrx;

const MODULE: MinimumFareModule = MinimumFareModule::Ctm;

/// A thru fare paired with one of its off points
#[derive(Debug, Clone)]
struct CtmCandidate {
    fu_index: usize,
    /// Index of the first segment after the off point
    off: usize,
    logic: OverrideLogic,
}

/// Highest round trip found from the unit origin to one point
#[derive(Debug, Clone)]
struct CtmFare {
    fare: RoundTripFare,
    outbound: Range<usize>,
}

/// Compares a circle trip with the highest round trip from its origin to
/// any of its points.
pub struct CtmMinimumFare<'a> {
    trx: &'a PricingTrx,
}

impl<'a> CtmMinimumFare<'a> {
    pub fn new(trx: &'a PricingTrx) -> Self {
        Self { trx }
    }

    fn qualifies(&self, pu: &PricingUnit) -> bool {
        match pu.pu_type {
            PricingUnitType::CircleTrip => true,
            PricingUnitType::RoundTrip => self.trx.config().ctm_on_round_trip,
            _ => false,
        }
    }

    /// Returns the CTM amount posted on the pricing unit. A thru fare with
    /// no application row fails the check.
    pub fn process(&self, fare_path: &mut FarePath, pu_index: usize) -> MinFareResult<Money> {
        let pu = pricing_unit(self.trx, fare_path, pu_index)?;
        if pu.exempt_min_fare || !self.qualifies(pu) {
            return Ok(Money::nuc(0));
        }
        MinFareMetrics::record_check(MODULE);

        let mut cache = MinFareCache::new();
        let candidates = self.build_candidates(&mut cache, pu)?;
        let (mixed, lowest_cabin) = is_mixed_cabin(&pu.fare_usages);
        let mf = MinimumFare::new(self.trx, MODULE);
        // Every city pair starts at the unit origin, so the off point keys it
        let mut highest: BTreeMap<String, CtmFare> = BTreeMap::new();
        for candidate in &candidates {
            let Some(fu) = pu.fare_usages.get(candidate.fu_index) else {
                continue;
            };
            let outbound = pu.segs.start..candidate.off;
            let inbound = candidate.off..pu.segs.end;
            let logic = &candidate.logic;
            if !mf.passes_sub_range_checks(logic, &fu.fare, pu.segs.clone(), outbound.clone()) {
                continue;
            }

            let cabin = if mixed { lowest_cabin } else { fu.fare.cabin };
            let req = SelectionRequest::new(MODULE, &fu.fare, pu.segs.clone())
                .with_eligible(EligibleFare::HalfRoundTrip)
                .with_pax_type_status(fare_path.pax_type_status)
                .with_cabin(cabin)
                .with_amount_pref(logic.module(MODULE).amount_pref);
            let selection = RoundTripFareSelection::new(self.trx, pu, req);
            let Some(fare) = selection.select_fare(&mut cache, outbound.clone(), inbound) else {
                MinFareMetrics::record_selection_miss(MODULE);
                continue;
            };

            let point = &self.trx.seg(candidate.off - 1).destination.city;
            let replace = highest
                .get(point)
                .is_none_or(|cur| fare.amount().amount > cur.fare.amount().amount);
            if replace {
                highest.insert(point.clone(), CtmFare { fare, outbound });
            }
        }

        let compared = pricing_unit_amount(pu);
        let mut cur_plus_up = None;
        for ctm in highest.values() {
            mf.compare_and_save_fare(
                compared,
                ctm.fare.amount(),
                &ctm.fare.outbound,
                ctm.outbound.clone(),
                &mut cur_plus_up,
            );
        }

        Ok(match cur_plus_up {
            Some(item) => post_on_pricing_unit(self.trx, fare_path, pu_index, MODULE, item),
            None => Money::nuc(0),
        })
    }

    /// Every (thru fare, off point) pair of the unit. Rule level exclusion
    /// and the application table are resolved once per thru fare.
    fn build_candidates(
        &self,
        cache: &mut MinFareCache,
        pu: &PricingUnit,
    ) -> MinFareResult<Vec<CtmCandidate>> {
        let mut candidates = Vec::new();
        for (fu_index, fu) in pu.fare_usages.iter().enumerate() {
            if fu.fare.fbr.as_ref().is_some_and(|fbr| fbr.ctm_exempt) {
                tracing::debug!(fu_index, "CTM exempt fare by rule");
                continue;
            }
            if is_thru_fare_excluded(self.trx, cache, MODULE, &fu.fare, fu.segs()) {
                tracing::debug!(fu_index, "Thru fare excluded at rule level");
                continue;
            }
            let gov_carrier = &fu.fare_market.governing_carrier;
            let segs = fu.segs();
            let appl = get_override_logic(self.trx, cache, MODULE, &fu.fare, gov_carrier, segs.clone());
            let logic = match appl {
                Application::Applies(logic) => logic,
                Application::Waived => continue,
                Application::Missing(details) => {
                    MinFareMetrics::record_missing_data(MODULE);
                    return Err(MinFareError::missing_data(MODULE, details));
                }
            };

            candidates.extend(
                (segs.start + 1..=segs.end)
                    .filter(|off| *off > pu.segs.start && *off < pu.segs.end)
                    .map(|off| CtmCandidate {
                        fu_index,
                        off,
                        logic: logic.clone(),
                    }),
            );
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::PaxTypeFare;
    use crate::repository::{InMemoryDataHandle, MockMinFareDataHandle};
    use crate::tables::MinFareAppl;
    use crate::test_support::{TrxBuilder, fare_usage, loc};

    fn appl() -> MinFareAppl {
        let mut row = MinFareAppl::new("ATP", "", 1);
        row.apply_default_logic = false;
        row
    }

    /// LON-PAR-ROM-LON priced LON-PAR-ROM / ROM-LON
    fn trx(data: InMemoryDataHandle) -> PricingTrx {
        TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("PAR", "FR", "2"), "BA")
            .air(loc("PAR", "FR", "2"), loc("ROM", "IT", "2"), "BA")
            .air(loc("ROM", "IT", "2"), loc("LON", "GB", "2"), "BA")
            .data(data)
            .build()
    }

    fn circle_trip() -> FarePath {
        let out = fare_usage(0..2, "BA", PaxTypeFare::new("BA", "LON", "ROM", "Y", 40_000));
        let inb =
            fare_usage(2..3, "BA", PaxTypeFare::new("BA", "LON", "ROM", "Y", 40_000)).inbound();
        FarePath::new(vec![PricingUnit::new(PricingUnitType::CircleTrip, vec![out, inb])])
    }

    #[test]
    fn test_circle_trip_raised_to_highest_round_trip() {
        let trx = trx(InMemoryDataHandle::new().with_appl(appl()).with_fares([
            PaxTypeFare::new("BA", "LON", "PAR", "Y", 45_000),
            PaxTypeFare::new("BA", "LON", "ROM", "Y", 40_000),
        ]));
        let mut fp = circle_trip();

        let posted = CtmMinimumFare::new(&trx).process(&mut fp, 0).unwrap();
        assert_eq!(posted.amount, 10_000);
        let items = fp.pricing_units[0].min_fare_plus_up.items(MODULE);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].off_point, "PAR");
        assert_eq!(items[0].base_amount.amount, 90_000);
    }

    #[test]
    fn test_missing_application_is_an_error() {
        let trx = trx(InMemoryDataHandle::new());
        let mut fp = circle_trip();
        let err = CtmMinimumFare::new(&trx).process(&mut fp, 0).unwrap_err();
        assert!(matches!(err, MinFareError::MissingData { module: MinimumFareModule::Ctm, .. }));
    }

    #[test]
    fn test_round_trip_only_when_configured() {
        let trx = trx(InMemoryDataHandle::new());
        let mut fp = circle_trip();
        fp.pricing_units[0].pu_type = PricingUnitType::RoundTrip;
        assert_eq!(CtmMinimumFare::new(&trx).process(&mut fp, 0).unwrap().amount, 0);
    }

    #[test]
    fn test_exempt_pricing_unit_performs_no_selection() {
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("PAR", "FR", "2"), "BA")
            .air(loc("PAR", "FR", "2"), loc("ROM", "IT", "2"), "BA")
            .air(loc("ROM", "IT", "2"), loc("LON", "GB", "2"), "BA")
            .data(MockMinFareDataHandle::new())
            .build();
        let mut fp = circle_trip();
        fp.pricing_units[0].exempt_min_fare = true;

        assert_eq!(CtmMinimumFare::new(&trx).process(&mut fp, 0).unwrap().amount, 0);
        assert!(fp.plus_up_info_list.is_empty());
    }

    #[test]
    fn test_reuse_thru_fare_for_full_component_ranges() {
        let trx = trx(InMemoryDataHandle::new());
        let fp = circle_trip();
        let pu = &fp.pricing_units[0];
        let thru = &pu.fare_usages[0].fare;
        let req = SelectionRequest::new(MODULE, thru, pu.segs.clone());
        let selection = RoundTripFareSelection::new(&trx, pu, req);

        let (ob, ib) = selection.reuse_thru_fare(&(0..2), &(2..3));
        assert!(std::sync::Arc::ptr_eq(&ob.unwrap(), &pu.fare_usages[0].fare));
        assert!(std::sync::Arc::ptr_eq(&ib.unwrap(), &pu.fare_usages[1].fare));

        let rt = selection
            .select_fare(&mut MinFareCache::new(), 0..2, 2..3)
            .unwrap();
        assert_eq!(rt.outbound.first, pu.fare_usages[0].fare);
        assert_eq!(rt.inbound.first, pu.fare_usages[1].fare);

        let (ob, _) = selection.reuse_thru_fare(&(0..1), &(1..3));
        assert!(ob.is_none());
    }

    #[test]
    fn test_fare_usage_past_itinerary_is_rejected() {
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("PAR", "FR", "2"), "BA")
            .air(loc("PAR", "FR", "2"), loc("ROM", "IT", "2"), "BA")
            .data(MockMinFareDataHandle::new())
            .build();
        let mut fp = circle_trip();

        let err = CtmMinimumFare::new(&trx).process(&mut fp, 0).unwrap_err();
        assert!(matches!(err, MinFareError::InvalidItinerary(_)));
    }

    #[test]
    fn test_point_reached_twice_is_compared_once() {
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("PAR", "FR", "2"), "BA")
            .air(loc("PAR", "FR", "2"), loc("ROM", "IT", "2"), "BA")
            .air(loc("ROM", "IT", "2"), loc("PAR", "FR", "2"), "BA")
            .air(loc("PAR", "FR", "2"), loc("LON", "GB", "2"), "BA")
            .data(InMemoryDataHandle::new().with_appl(appl()).with_fares([
                PaxTypeFare::new("BA", "LON", "PAR", "Y", 45_000),
                PaxTypeFare::new("BA", "LON", "ROM", "Y", 40_000),
            ]))
            .build();
        let out = fare_usage(0..2, "BA", PaxTypeFare::new("BA", "LON", "ROM", "Y", 40_000));
        let inb =
            fare_usage(2..4, "BA", PaxTypeFare::new("BA", "LON", "ROM", "Y", 40_000)).inbound();
        let mut fp =
            FarePath::new(vec![PricingUnit::new(PricingUnitType::CircleTrip, vec![out, inb])]);

        let posted = CtmMinimumFare::new(&trx).process(&mut fp, 0).unwrap();
        assert_eq!(posted.amount, 10_000);
        let items = fp.pricing_units[0].min_fare_plus_up.items(MODULE);
        assert_eq!(items.len(), 1);
        assert_eq!((items[0].board_point.as_str(), items[0].off_point.as_str()), ("LON", "PAR"));
    }
}

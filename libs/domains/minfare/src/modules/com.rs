//! Country of Origin Minimum check.

use std::collections::BTreeSet;
use std::ops::Range;

use super::{post_on_pricing_unit, pricing_unit, pricing_unit_amount};
use crate::cache::MinFareCache;
use crate::error::MinFareResult;
use crate::itinerary::{FarePath, FareUsage, MinFarePlusUpItem, OscPlusUp, PricingUnit};
use crate::logic::{Application, eligible_fare, get_override_logic, select_qualify_const_fare};
use crate::metrics::MinFareMetrics;
use crate::minimum_fare::MinimumFare;
use crate::models::{MinimumFareModule, Money, PaxTypeStatus};
use crate::selection::{PtfPair, SelectionRequest};
use crate::trx::PricingTrx;

const MODULE: MinimumFareModule = MinimumFareModule::Com;

/// Compares a later pricing unit that travels back through the origin
/// country of an earlier one with the fare from that revisit point to the
/// unit destination.
pub struct ComMinimumFare<'a> {
    trx: &'a PricingTrx,
}

impl<'a> ComMinimumFare<'a> {
    pub fn new(trx: &'a PricingTrx) -> Self {
        Self { trx }
    }

    /// Origin nations of the pricing units before `pu_index`
    fn earlier_origin_nations(&self, fare_path: &FarePath, pu_index: usize) -> BTreeSet<&str> {
        fare_path.pricing_units[..pu_index]
            .iter()
            .filter(|pu| pu.segs.start < self.trx.travel_segs.len())
            .map(|pu| self.trx.seg(pu.segs.start).origin.nation.as_str())
            .collect()
    }

    /// Intermediate points of the unit lying in an earlier origin nation
    pub fn revisit_points(&self, fare_path: &FarePath, pu_index: usize) -> Vec<usize> {
        let Some(pu) = fare_path.pricing_units.get(pu_index) else {
            return Vec::new();
        };
        let nations = self.earlier_origin_nations(fare_path, pu_index);
        (pu.segs.start + 1..pu.segs.end)
            .filter(|k| nations.contains(self.trx.seg(*k).origin.nation.as_str()))
            .collect()
    }

    pub fn process(&self, fare_path: &mut FarePath, pu_index: usize) -> MinFareResult<Money> {
        let pu = pricing_unit(self.trx, fare_path, pu_index)?;
        if pu.exempt_min_fare || pu_index == 0 || fare_path.pricing_units.len() < 2 {
            return Ok(Money::nuc(0));
        }
        let revisits = self.revisit_points(fare_path, pu_index);
        if revisits.is_empty() {
            return Ok(Money::nuc(0));
        }
        MinFareMetrics::record_check(MODULE);

        let mut cache = MinFareCache::new();
        let mut cur_plus_up = None;
        for k in &revisits {
            let segs = *k..pu.segs.end;
            self.process_intermediate_city_pair(&mut cache, fare_path, pu, segs, &mut cur_plus_up);
        }
        for osc in &fare_path.osc_plus_ups {
            let Some(segs) = self.osc_range(osc) else {
                continue;
            };
            if segs.start < pu.segs.start || segs.end > pu.segs.end || !revisits.contains(&segs.start)
            {
                continue;
            }
            self.process_intermediate_city_pair_osc(
                &mut cache,
                pu,
                fare_path.pax_type_status,
                osc,
                segs,
                &mut cur_plus_up,
            );
        }

        Ok(match cur_plus_up {
            Some(item) => post_on_pricing_unit(self.trx, fare_path, pu_index, MODULE, item),
            None => Money::nuc(0),
        })
    }

    /// Fare from a revisit point to the unit destination against the unit
    /// total, plus the OSC plus-ups already charged inside that interval
    pub fn process_intermediate_city_pair(
        &self,
        cache: &mut MinFareCache,
        fare_path: &FarePath,
        pu: &PricingUnit,
        segs: Range<usize>,
        cur_plus_up: &mut Option<MinFarePlusUpItem>,
    ) -> bool {
        let Some(pair) = self.select_city_pair_fare(cache, pu, fare_path.pax_type_status, &segs)
        else {
            return false;
        };

        let orders: BTreeSet<u16> = self
            .trx
            .segs(segs.clone())
            .iter()
            .map(|s| s.segment_order)
            .collect();
        let osc_in_interval = fare_path
            .osc_plus_ups
            .iter()
            .filter(|osc| osc.seg_orders().is_subset(&orders))
            .fold(Money::nuc(0), |acc, osc| acc + osc.plus_up_amount);
        if osc_in_interval.is_positive() {
            tracing::debug!(?segs, osc = %osc_in_interval, "OSC plus-ups folded into COM");
        }

        let compared = pricing_unit_amount(pu) + osc_in_interval;
        MinimumFare::new(self.trx, MODULE).compare_and_save_fare(
            compared,
            pair.amount(),
            &pair,
            segs,
            cur_plus_up,
        )
    }

    /// Fare over a previously computed OSC interval against the OSC base
    /// and plus-up
    pub fn process_intermediate_city_pair_osc(
        &self,
        cache: &mut MinFareCache,
        pu: &PricingUnit,
        pax_type_status: PaxTypeStatus,
        osc: &OscPlusUp,
        segs: Range<usize>,
        cur_plus_up: &mut Option<MinFarePlusUpItem>,
    ) -> bool {
        let Some(pair) = self.select_city_pair_fare(cache, pu, pax_type_status, &segs) else {
            return false;
        };
        let compared = osc.base_amount + osc.plus_up_amount;
        MinimumFare::new(self.trx, MODULE).compare_and_save_fare(
            compared,
            pair.amount(),
            &pair,
            segs,
            cur_plus_up,
        )
    }

    /// Segment indices covered by an OSC plus-up
    fn osc_range(&self, osc: &OscPlusUp) -> Option<Range<usize>> {
        let index_of = |order: u16| {
            self.trx
                .travel_segs
                .iter()
                .position(|s| s.segment_order == order)
        };
        let board = index_of(osc.board_seg_order)?;
        let off = index_of(osc.off_seg_order)?;
        (board <= off).then_some(board..off + 1)
    }

    fn thru_fare_usage<'p>(&self, pu: &'p PricingUnit, board: usize) -> Option<&'p FareUsage> {
        pu.fare_usages.iter().find(|fu| fu.segs().contains(&board))
    }

    fn select_city_pair_fare(
        &self,
        cache: &mut MinFareCache,
        pu: &PricingUnit,
        pax_type_status: PaxTypeStatus,
        segs: &Range<usize>,
    ) -> Option<PtfPair> {
        let fu = self.thru_fare_usage(pu, segs.start)?;
        let gov_carrier = &fu.fare_market.governing_carrier;
        let appl = get_override_logic(self.trx, cache, MODULE, &fu.fare, gov_carrier, fu.segs());
        let logic = match appl {
            Application::Applies(logic) => logic,
            Application::Waived => return None,
            Application::Missing(details) => {
                tracing::warn!(module = %MODULE, %details, "COM not applied");
                MinFareMetrics::record_missing_data(MODULE);
                return None;
            }
        };

        let mf = MinimumFare::new(self.trx, MODULE);
        if !mf.passes_sub_range_checks(&logic, &fu.fare, fu.segs(), segs.clone()) {
            return None;
        }
        let special = !fu.fare.is_normal();
        let req = SelectionRequest::new(MODULE, &fu.fare, segs.clone())
            .with_eligible(eligible_fare(pu))
            .with_pax_type_status(pax_type_status)
            .with_amount_pref(logic.module(MODULE).amount_pref);
        let pair = select_qualify_const_fare(self.trx, cache, &req, special);
        if pair.is_none() {
            MinFareMetrics::record_selection_miss(MODULE);
        }
        pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::PaxTypeFare;
    use crate::models::PricingUnitType;
    use crate::repository::{InMemoryDataHandle, MinFareDataHandle, MockMinFareDataHandle};
    use crate::tables::MinFareAppl;
    use crate::test_support::{TrxBuilder, fare_usage, loc};

    fn data() -> InMemoryDataHandle {
        let mut appl = MinFareAppl::new("ATP", "", 1);
        appl.apply_default_logic = false;
        InMemoryDataHandle::new()
            .with_appl(appl)
            .with_fare(PaxTypeFare::new("BA", "MAN", "NYC", "Y", 65_000))
    }

    /// LON-PAR, then PAR-MAN-NYC returning through the UK
    fn trx(data: impl MinFareDataHandle + 'static) -> PricingTrx {
        TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("PAR", "FR", "2"), "BA")
            .air(loc("PAR", "FR", "2"), loc("MAN", "GB", "2"), "BA")
            .air(loc("MAN", "GB", "2"), loc("NYC", "US", "1"), "BA")
            .data(data)
            .build()
    }

    fn fare_path() -> FarePath {
        let first = fare_usage(0..1, "BA", PaxTypeFare::new("BA", "LON", "PAR", "Y", 20_000));
        let second = fare_usage(1..3, "BA", PaxTypeFare::new("BA", "PAR", "NYC", "Y", 50_000));
        FarePath::new(vec![
            PricingUnit::new(PricingUnitType::OneWay, vec![first]),
            PricingUnit::new(PricingUnitType::OneWay, vec![second]),
        ])
    }

    fn osc(base: i64, plus_up: i64) -> OscPlusUp {
        OscPlusUp {
            board_seg_order: 3,
            off_seg_order: 3,
            board_point: "MAN".to_string(),
            off_point: "NYC".to_string(),
            base_amount: Money::nuc(base),
            plus_up_amount: Money::nuc(plus_up),
        }
    }

    #[test]
    fn test_revisit_of_origin_country() {
        let trx = trx(data());
        let mut fp = fare_path();
        assert_eq!(ComMinimumFare::new(&trx).revisit_points(&fp, 1), vec![2]);

        let posted = ComMinimumFare::new(&trx).process(&mut fp, 1).unwrap();
        assert_eq!(posted.amount, 15_000);
        let item = &fp.pricing_units[1].min_fare_plus_up.items(MODULE)[0];
        assert_eq!((item.board_point.as_str(), item.off_point.as_str()), ("MAN", "NYC"));
    }

    #[test]
    fn test_osc_plus_up_in_interval_is_folded() {
        let trx = trx(data());
        let mut fp = fare_path();
        fp.osc_plus_ups.push(osc(60_000, 2_000));

        // 65_000 - (50_000 + 2_000) beats 65_000 - 62_000 on the OSC interval
        let posted = ComMinimumFare::new(&trx).process(&mut fp, 1).unwrap();
        assert_eq!(posted.amount, 13_000);
    }

    #[test]
    fn test_osc_entry_point_alone() {
        let trx = trx(data());
        let fp = fare_path();
        let com = ComMinimumFare::new(&trx);
        let mut cur = None;

        let saved = com.process_intermediate_city_pair_osc(
            &mut MinFareCache::new(),
            &fp.pricing_units[1],
            PaxTypeStatus::Adult,
            &osc(60_000, 2_000),
            2..3,
            &mut cur,
        );
        assert!(saved);
        assert_eq!(cur.unwrap().plus_up_amount.amount, 3_000);
    }

    #[test]
    fn test_first_pricing_unit_not_checked() {
        let trx = trx(data());
        let mut fp = fare_path();
        assert_eq!(ComMinimumFare::new(&trx).process(&mut fp, 0).unwrap().amount, 0);
        assert!(fp.plus_up_info_list.is_empty());
    }

    #[test]
    fn test_exempt_pricing_unit_performs_no_selection() {
        let trx = trx(MockMinFareDataHandle::new());
        let mut fp = fare_path();
        fp.pricing_units[1].exempt_min_fare = true;
        assert_eq!(ComMinimumFare::new(&trx).process(&mut fp, 1).unwrap().amount, 0);
    }

    #[test]
    fn test_earlier_pricing_unit_past_itinerary_is_rejected() {
        let trx = trx(MockMinFareDataHandle::new());
        let mut fp = fare_path();
        fp.pricing_units[0].fare_usages[0].fare_market.segs = 0..9;
        fp.pricing_units[0].segs = 0..9;

        let err = ComMinimumFare::new(&trx).process(&mut fp, 1).unwrap_err();
        assert!(matches!(err, crate::error::MinFareError::InvalidItinerary(_)));
    }
}

//! Intermediate point sweep shared by the module drivers.
//!
//! [`MinimumFare::process_intermediate`] walks every board/off pair inside a
//! thru fare component, drops the pairs the tables exclude, reprices the
//! rest and keeps the highest difference over the thru amount.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::cache::{MinFareCache, travel_seg_hash};
use crate::diag::DiagnosticType;
use crate::geo::is_in_loc;
use crate::itinerary::{FareUsage, Loc, MinFarePlusUpItem, PaxTypeFare, PricingUnit, TravelSeg};
use crate::logic::{
    OverrideLogic, eligible_fare, fare_direction, is_domestic_range, select_qualify_const_fare,
    select_qualify_fare,
};
use crate::metrics::MinFareMetrics;
use crate::models::{MinimumFareModule, Money, PaxTypeStatus};
use crate::selection::{PtfPair, SelectionRequest};
use crate::tables::{
    CityPairRule, DomesticLogic, GeoDirectional, GeoQualifier, InterLocTravel, OnlineInd,
    StopTktInd,
};
use crate::trx::PricingTrx;

/// Diagnostic a module traces its sweep to
pub fn diag_for(module: MinimumFareModule) -> DiagnosticType {
    match module {
        MinimumFareModule::Ctm => DiagnosticType::Diagnostic718,
        MinimumFareModule::Com => DiagnosticType::Diagnostic719,
        MinimumFareModule::Cop => DiagnosticType::Diagnostic760,
        _ => DiagnosticType::Diagnostic709,
    }
}

/// Every point of a range in travel order: each board point, then the last
/// off point
fn points(segs: &[TravelSeg]) -> Vec<&Loc> {
    let mut points: Vec<&Loc> = segs.iter().map(|s| &s.origin).collect();
    points.extend(segs.last().map(|s| &s.destination));
    points
}

/// Geography condition of a table row over `segs`. A row without `loc1`
/// matches any travel.
pub fn match_geo(trx: &PricingTrx, geo: &GeoQualifier, segs: Range<usize>) -> bool {
    if segs.is_empty() || !trx.contains(&segs) {
        return false;
    }
    let segs = trx.segs(segs);
    let points = points(segs);
    let (Some(origin), Some(destination)) = (points.first(), points.last()) else {
        return false;
    };

    let directional = match &geo.loc1 {
        None => true,
        Some(loc1) => match (geo.directional, &geo.loc2) {
            (GeoDirectional::Within, _) => points.iter().all(|p| is_in_loc(p, loc1)),
            (GeoDirectional::Between, None) => {
                is_in_loc(origin, loc1) || is_in_loc(destination, loc1)
            }
            (GeoDirectional::Between, Some(loc2)) => {
                (is_in_loc(origin, loc1) && is_in_loc(destination, loc2))
                    || (is_in_loc(origin, loc2) && is_in_loc(destination, loc1))
            }
            (GeoDirectional::From, None) => is_in_loc(origin, loc1),
            (GeoDirectional::From, Some(loc2)) => {
                is_in_loc(origin, loc1) && is_in_loc(destination, loc2)
            }
        },
    };

    let via = match &geo.via {
        None => true,
        Some(via) => points[1..points.len() - 1].iter().any(|p| is_in_loc(p, via)),
    };
    directional && via
}

/// Whether the range passes the same city twice
pub fn is_retransit(trx: &PricingTrx, segs: Range<usize>) -> bool {
    let mut seen = BTreeSet::new();
    points(trx.segs(segs))
        .into_iter()
        .any(|p| !seen.insert(p.city.as_str()))
}

/// Whether the off point of segment `index` is a stopover
pub fn is_stopover(trx: &PricingTrx, index: usize) -> bool {
    trx.seg(index).stopover
}

/// Intermediate point checks of one module
pub struct MinimumFare<'a> {
    trx: &'a PricingTrx,
    module: MinimumFareModule,
}

impl<'a> MinimumFare<'a> {
    pub fn new(trx: &'a PricingTrx, module: MinimumFareModule) -> Self {
        Self { trx, module }
    }

    /// Whether a domestic sub-range is left out of the check. Domestic travel
    /// is excluded when the logic says `N`, unless it starts in an excepted
    /// location or the thru fare has an excepted fare type.
    pub fn check_domestic_exclusion(
        &self,
        logic: &DomesticLogic,
        thru_fare: &PaxTypeFare,
        segs: Range<usize>,
    ) -> bool {
        if !logic.appl.is_no() || !is_domestic_range(self.trx, segs.clone()) {
            return false;
        }
        let board = &self.trx.seg(segs.start).origin;
        let loc_excepted = logic.except_locs.iter().any(|loc| is_in_loc(board, loc));
        let fare_type_excepted = logic.except_fare_types.contains(&thru_fare.fare_type);
        !(loc_excepted || fare_type_excepted)
    }

    /// Whether the intermediate points of `segs` are excluded by the
    /// stopover policy or by the inter-location travel restriction
    pub fn check_intermediate_exclusion(
        &self,
        logic: &OverrideLogic,
        thru: Range<usize>,
        segs: Range<usize>,
    ) -> bool {
        let board_inter = segs.start > thru.start;
        let off_inter = segs.end < thru.end;

        if logic.module(self.module).stop_tkt == StopTktInd::Stopover {
            if board_inter && !is_stopover(self.trx, segs.start - 1) {
                return true;
            }
            if off_inter && !is_stopover(self.trx, segs.end - 1) {
                return true;
            }
        }

        let inter = &logic.appl.inter_loc;
        let Some(loc) = &inter.loc else {
            return false;
        };
        let board = &self.trx.seg(segs.start).origin;
        let off = &self.trx.seg(segs.end - 1).destination;
        (board_inter && is_in_loc(board, loc) && self.is_restricted(inter, thru.start..segs.start))
            || (off_inter && is_in_loc(off, loc) && self.is_restricted(inter, segs.end..thru.end))
    }

    /// Whether travel over `travel` has the nature the restriction names
    fn is_restricted(&self, inter: &InterLocTravel, travel: Range<usize>) -> bool {
        let segs = self.trx.segs(travel);
        let air: Vec<&TravelSeg> = segs.iter().filter(|s| s.is_air()).collect();
        if air.is_empty() {
            return false;
        }
        let online = air.windows(2).all(|w| w[0].carrier == w[1].carrier);
        let non_stop = segs.len() == 1 && air[0].hidden_stops == 0;
        let direct = air.len() == segs.len()
            && air
                .windows(2)
                .all(|w| w[0].carrier == w[1].carrier && w[0].flight_number == w[1].flight_number);

        (inter.non_stop.is_yes() && non_stop)
            || (inter.direct.is_yes() && direct)
            || match inter.online {
                OnlineInd::Online => online,
                OnlineInd::Interline => !online,
                OnlineInd::Blank => false,
            }
    }

    /// Whether the board and off points of `segs` qualify under the city
    /// pair rule, relative to the thru component
    pub fn check_intermediate_city_pair(
        &self,
        rule: &CityPairRule,
        thru: Range<usize>,
        segs: Range<usize>,
    ) -> bool {
        let origin = &self.trx.seg(thru.start).origin;
        let destination = &self.trx.seg(thru.end - 1).destination;
        let board = &self.trx.seg(segs.start).origin;
        let off = &self.trx.seg(segs.end - 1).destination;

        let board_ok = if segs.start == thru.start {
            rule.orig
        } else {
            rule.from_inter || (rule.orig_nation && board.nation == origin.nation)
        };
        let off_ok = if segs.end == thru.end {
            rule.dest
        } else {
            rule.to_inter || (rule.dest_nation && off.nation == destination.nation)
        };
        board_ok && off_ok
    }

    /// Whether the normal fare of the sub-range does not exceed the normal
    /// fare of the thru range. Exempt ranges are remembered by segment hash.
    pub fn check_normal_exempt(
        &self,
        cache: &mut MinFareCache,
        req: &SelectionRequest<'_>,
        thru: Range<usize>,
    ) -> bool {
        let hash = travel_seg_hash(self.trx.segs(req.segs.clone()));
        if cache.is_normal_exempt(hash) {
            return true;
        }
        let Some(thru_normal) = select_qualify_fare(self.trx, cache, &req.with_segs(thru), false)
        else {
            return false;
        };
        let Some(inter_normal) = select_qualify_fare(self.trx, cache, req, false) else {
            return false;
        };
        if inter_normal.nuc_amount.amount <= thru_normal.nuc_amount.amount {
            cache.mark_normal_exempt(hash);
            return true;
        }
        false
    }

    /// Table driven checks of one sub-range: domestic exclusion,
    /// intermediate exclusion and, where the module restricts them,
    /// intermediate city pairs
    pub fn passes_sub_range_checks(
        &self,
        logic: &OverrideLogic,
        thru_fare: &PaxTypeFare,
        thru: Range<usize>,
        segs: Range<usize>,
    ) -> bool {
        if self.check_domestic_exclusion(logic.domestic(), thru_fare, segs.clone()) {
            tracing::debug!(module = %self.module, ?segs, "Domestic sub-range excluded");
            return false;
        }
        if self.check_intermediate_exclusion(logic, thru.clone(), segs.clone()) {
            tracing::debug!(module = %self.module, ?segs, "Intermediate point excluded");
            return false;
        }
        let city_pair = &logic.module(self.module).city_pair;
        if self.module.checks_city_pair()
            && !self.check_intermediate_city_pair(city_pair, thru, segs.clone())
        {
            tracing::debug!(module = %self.module, ?segs, "City pair not checked");
            return false;
        }
        true
    }

    /// Highest plus-up over every intermediate sub-range of `fu`.
    ///
    /// The HIP driver is the in-crate caller. A [`MinimumFare`] built for
    /// another module leaves out sub-ranges that revisit a city, as CTM, COP
    /// and COM compare fares between distinct points only.
    pub fn process_intermediate(
        &self,
        cache: &mut MinFareCache,
        pu: &PricingUnit,
        fu: &FareUsage,
        logic: &OverrideLogic,
        pax_type_status: PaxTypeStatus,
    ) -> Option<MinFarePlusUpItem> {
        let thru = fu.segs();
        let thru_fare = fu.fare.as_ref();
        let special = !thru_fare.is_normal();
        let module_logic = logic.module(self.module);
        let config = self.trx.config();
        let special_only =
            special && module_logic.special_only.or(config.special_hip_special_only);

        let base = SelectionRequest::new(self.module, thru_fare, thru.clone())
            .with_direction(fare_direction(pu, fu))
            .with_eligible(eligible_fare(pu))
            .with_pax_type_status(pax_type_status)
            .with_amount_pref(module_logic.amount_pref)
            .with_special_only(special_only);
        let thru_amount = fu.thru_amount();

        let mut cur_plus_up = None;
        for start in thru.clone() {
            for end in start + 1..=thru.end {
                if start == thru.start && end == thru.end {
                    continue;
                }
                let segs = start..end;
                if !self.trx.seg(start).is_air() && !self.trx.seg(end - 1).is_air() {
                    continue;
                }
                if !self.module.allows_retransit() && is_retransit(self.trx, segs.clone()) {
                    continue;
                }
                if !self.passes_sub_range_checks(logic, thru_fare, thru.clone(), segs.clone()) {
                    continue;
                }

                let req = base.with_segs(segs.clone());
                if self.module == MinimumFareModule::Hip
                    && special
                    && !special_only
                    && config.hip_normal_exempt
                    && self.check_normal_exempt(cache, &req, thru.clone())
                {
                    tracing::debug!(?segs, "Special fare exempt by normal fare comparison");
                    continue;
                }

                let Some(pair) = select_qualify_const_fare(self.trx, cache, &req, special) else {
                    MinFareMetrics::record_selection_miss(self.module);
                    continue;
                };
                let amount = self.intermediate_amount(&pair, thru_fare, fu.mileage_surcharge_pct);
                self.compare_and_save_fare(thru_amount, amount, &pair, segs, &mut cur_plus_up);
            }
        }
        cur_plus_up
    }

    /// Intermediate fare on the thru fare's basis: fare-by-rule percentage,
    /// then the thru component's mileage surcharge
    pub fn intermediate_amount(
        &self,
        pair: &PtfPair,
        thru_fare: &PaxTypeFare,
        mileage_surcharge_pct: u16,
    ) -> Money {
        let amount = match thru_fare.fbr.as_ref().and_then(|fbr| fbr.percent) {
            Some(percent) => pair.amount().percent(percent),
            None => pair.amount(),
        };
        amount.with_surcharge(mileage_surcharge_pct)
    }

    /// Keeps `cur_plus_up` at the highest positive difference between an
    /// intermediate fare and the compared amount. Returns whether this
    /// candidate was saved.
    pub fn compare_and_save_fare(
        &self,
        compared: Money,
        intermediate: Money,
        pair: &PtfPair,
        segs: Range<usize>,
        cur_plus_up: &mut Option<MinFarePlusUpItem>,
    ) -> bool {
        let plus_up = intermediate - compared;
        let board = &self.trx.seg(segs.start).origin.city;
        let off = &self.trx.seg(segs.end - 1).destination.city;

        self.trx.diag().write(diag_for(self.module), || {
            format!(
                "{} {board}-{off} {} {:>12} {:>12}{}",
                self.module,
                pair.first.fare_class,
                intermediate,
                plus_up,
                pair.construct_point
                    .as_ref()
                    .map(|p| format!(" CONSTRUCTED AT {p}"))
                    .unwrap_or_default()
            )
        });

        if !plus_up.is_positive()
            || cur_plus_up
                .as_ref()
                .is_some_and(|cur| plus_up.amount <= cur.plus_up_amount.amount)
        {
            return false;
        }
        *cur_plus_up = Some(MinFarePlusUpItem {
            plus_up_amount: plus_up,
            base_amount: intermediate,
            board_point: board.clone(),
            off_point: off.clone(),
            construct_point: pair.construct_point.clone(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LocKey;
    use crate::models::{FareTypeGroup, Indicator, PricingUnitType};
    use crate::repository::InMemoryDataHandle;
    use crate::tables::MinFareAppl;
    use crate::test_support::{TrxBuilder, fare_usage, loc};
    use core_config::minfare::MinFareConfig;
    use std::sync::Arc;

    fn lon_fra_bkk_syd() -> PricingTrx {
        TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("FRA", "DE", "2"), "LH")
            .air(loc("FRA", "DE", "2"), loc("BKK", "TH", "3"), "LH")
            .air(loc("BKK", "TH", "3"), loc("SYD", "AU", "3"), "LH")
            .build()
    }

    fn priced(data: InMemoryDataHandle, config: MinFareConfig) -> PricingTrx {
        TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("FRA", "DE", "2"), "LH")
            .air(loc("FRA", "DE", "2"), loc("BKK", "TH", "3"), "LH")
            .air(loc("BKK", "TH", "3"), loc("SYD", "AU", "3"), "LH")
            .data(data)
            .config(config)
            .build()
    }

    fn special(market1: &str, market2: &str, amount: i64) -> PaxTypeFare {
        PaxTypeFare::new("LH", market1, market2, "YEX", amount).with_fare_type(
            "XEX",
            FareTypeGroup::Special,
            2,
        )
    }

    fn one_way(trx: &PricingTrx, thru: PaxTypeFare) -> PricingUnit {
        let fu = fare_usage(0..trx.travel_segs.len(), "LH", thru);
        PricingUnit::new(PricingUnitType::OneWay, vec![fu])
    }

    fn sweep(
        trx: &PricingTrx,
        module: MinimumFareModule,
        pu: &PricingUnit,
        appl: MinFareAppl,
    ) -> Option<MinFarePlusUpItem> {
        MinimumFare::new(trx, module).process_intermediate(
            &mut MinFareCache::new(),
            pu,
            &pu.fare_usages[0],
            &logic(appl),
            PaxTypeStatus::Adult,
        )
    }

    fn logic(appl: MinFareAppl) -> OverrideLogic {
        OverrideLogic {
            appl: Arc::new(appl),
            default_logic: None,
        }
    }

    fn appl() -> MinFareAppl {
        let mut row = MinFareAppl::new("ATP", "LH", 1);
        row.apply_default_logic = false;
        row
    }

    #[test]
    fn test_match_geo_between_within_from_via() {
        let trx = lon_fra_bkk_syd();
        let between = GeoQualifier {
            directional: GeoDirectional::Between,
            loc1: Some(LocKey::area("3")),
            loc2: Some(LocKey::area("2")),
            via: None,
        };
        assert!(match_geo(&trx, &between, 0..2));

        let from = GeoQualifier {
            directional: GeoDirectional::From,
            ..between.clone()
        };
        assert!(!match_geo(&trx, &from, 0..2));

        let within = GeoQualifier {
            directional: GeoDirectional::Within,
            loc1: Some(LocKey::area("2")),
            loc2: None,
            via: None,
        };
        assert!(match_geo(&trx, &within, 0..1));
        assert!(!match_geo(&trx, &within, 0..2));

        let via = GeoQualifier {
            via: Some(LocKey::city("BKK")),
            ..GeoQualifier::default()
        };
        assert!(match_geo(&trx, &via, 0..3));
        assert!(!match_geo(&trx, &via, 0..2));
        assert!(match_geo(&trx, &GeoQualifier::default(), 1..3));
    }

    #[test]
    fn test_retransit_detects_revisited_city() {
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("FRA", "DE", "2"), "LH")
            .air(loc("FRA", "DE", "2"), loc("LON", "GB", "2"), "LH")
            .air(loc("LON", "GB", "2"), loc("NYC", "US", "1"), "BA")
            .build();
        assert!(is_retransit(&trx, 0..2));
        assert!(!is_retransit(&trx, 1..3));
    }

    #[test]
    fn test_domestic_exclusion_with_exceptions() {
        let trx = TrxBuilder::new()
            .air(loc("NYC", "US", "1"), loc("CHI", "US", "1"), "AA")
            .air(loc("CHI", "US", "1"), loc("YTO", "CA", "1"), "AA")
            .air(loc("YTO", "CA", "1"), loc("LON", "GB", "2"), "AA")
            .build();
        let mf = MinimumFare::new(&trx, MinimumFareModule::Hip);
        let fare = PaxTypeFare::new("AA", "NYC", "LON", "Y", 100);
        let mut logic = DomesticLogic {
            appl: Indicator::No,
            ..Default::default()
        };
        assert!(mf.check_domestic_exclusion(&logic, &fare, 0..2));
        assert!(!mf.check_domestic_exclusion(&logic, &fare, 1..3));

        logic.except_locs = vec![LocKey::nation("US")];
        assert!(!mf.check_domestic_exclusion(&logic, &fare, 0..2));

        logic.except_locs.clear();
        logic.except_fare_types = vec!["EU".to_string()];
        assert!(!mf.check_domestic_exclusion(&logic, &fare, 0..2));

        logic.appl = Indicator::Blank;
        assert!(!mf.check_domestic_exclusion(&logic, &fare, 0..2));
    }

    #[test]
    fn test_stopover_policy_excludes_connection_points() {
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("FRA", "DE", "2"), "LH")
            .seg(|s| s.with_stopover())
            .air(loc("FRA", "DE", "2"), loc("BKK", "TH", "3"), "LH")
            .air(loc("BKK", "TH", "3"), loc("SYD", "AU", "3"), "LH")
            .build();
        let mf = MinimumFare::new(&trx, MinimumFareModule::Hip);
        let mut row = appl();
        row.logic.hip.stop_tkt = StopTktInd::Stopover;
        let logic = logic(row);

        assert!(!mf.check_intermediate_exclusion(&logic, 0..3, 1..3));
        assert!(mf.check_intermediate_exclusion(&logic, 0..3, 0..2));
        assert!(!mf.check_intermediate_exclusion(&logic, 0..3, 0..1));
    }

    #[test]
    fn test_inter_loc_non_stop_restriction() {
        let trx = lon_fra_bkk_syd();
        let mf = MinimumFare::new(&trx, MinimumFareModule::Hip);
        let mut row = appl();
        row.inter_loc = InterLocTravel {
            loc: Some(LocKey::nation("DE")),
            non_stop: Indicator::Yes,
            ..Default::default()
        };
        let logic = logic(row);
        assert!(mf.check_intermediate_exclusion(&logic, 0..3, 1..3));
        assert!(!mf.check_intermediate_exclusion(&logic, 0..3, 2..3));
    }

    #[test]
    fn test_city_pair_rule() {
        let trx = lon_fra_bkk_syd();
        let mf = MinimumFare::new(&trx, MinimumFareModule::Hip);
        let rule = CityPairRule {
            from_inter: false,
            orig_nation: false,
            ..Default::default()
        };
        assert!(mf.check_intermediate_city_pair(&rule, 0..3, 0..2));
        assert!(!mf.check_intermediate_city_pair(&rule, 0..3, 1..3));

        let rule = CityPairRule {
            to_inter: false,
            dest_nation: true,
            ..Default::default()
        };
        assert!(!mf.check_intermediate_city_pair(&rule, 0..3, 0..2));
    }

    #[test]
    fn test_compare_and_save_keeps_highest_positive() {
        let trx = lon_fra_bkk_syd();
        let mf = MinimumFare::new(&trx, MinimumFareModule::Hip);
        let pair = PtfPair::single(Arc::new(PaxTypeFare::new("LH", "LON", "BKK", "Y", 0)));
        let mut cur = None;

        assert!(!mf.compare_and_save_fare(Money::nuc(1_000), Money::nuc(900), &pair, 0..2, &mut cur));
        assert!(!mf.compare_and_save_fare(Money::nuc(1_000), Money::nuc(1_000), &pair, 0..2, &mut cur));
        assert!(cur.is_none());

        assert!(mf.compare_and_save_fare(Money::nuc(1_000), Money::nuc(1_300), &pair, 0..2, &mut cur));
        assert!(!mf.compare_and_save_fare(Money::nuc(1_000), Money::nuc(1_200), &pair, 1..3, &mut cur));
        let item = cur.unwrap();
        assert_eq!(item.plus_up_amount.amount, 300);
        assert_eq!(item.base_amount.amount, 1_300);
        assert_eq!((item.board_point.as_str(), item.off_point.as_str()), ("LON", "BKK"));
    }

    #[test]
    fn test_intermediate_amount_applies_fbr_percent_and_surcharge() {
        let trx = lon_fra_bkk_syd();
        let mf = MinimumFare::new(&trx, MinimumFareModule::Hip);
        let pair = PtfPair::single(Arc::new(PaxTypeFare::new("LH", "LON", "BKK", "Y", 1_000)));
        let thru = PaxTypeFare::new("LH", "LON", "SYD", "Y", 0).with_fbr(
            crate::itinerary::FareByRuleInfo {
                percent: Some(50.0),
                ..Default::default()
            },
        );
        assert_eq!(mf.intermediate_amount(&pair, &thru, 10).amount, 550);
    }

    #[test]
    fn test_normal_exempt_when_intermediate_normal_not_higher() {
        let data = InMemoryDataHandle::new().with_fares([
            PaxTypeFare::new("LH", "LON", "SYD", "Y", 100_000),
            PaxTypeFare::new("LH", "LON", "BKK", "Y", 90_000),
            PaxTypeFare::new("LH", "FRA", "BKK", "Y", 150_000),
        ]);
        let trx = priced(data, MinFareConfig::default());
        let mf = MinimumFare::new(&trx, MinimumFareModule::Hip);
        let thru = special("LON", "SYD", 80_000);
        let mut cache = MinFareCache::new();

        let req = SelectionRequest::new(MinimumFareModule::Hip, &thru, 0..2);
        assert!(mf.check_normal_exempt(&mut cache, &req, 0..3));
        assert!(cache.is_normal_exempt(travel_seg_hash(trx.segs(0..2))));

        let req = req.with_segs(1..2);
        assert!(!mf.check_normal_exempt(&mut cache, &req, 0..3));
        assert!(!cache.is_normal_exempt(travel_seg_hash(trx.segs(1..2))));
    }

    #[test]
    fn test_normal_exempt_range_remembered() {
        // No fares at all: only the remembered range can be exempt
        let trx = priced(InMemoryDataHandle::new(), MinFareConfig::default());
        let mf = MinimumFare::new(&trx, MinimumFareModule::Hip);
        let thru = special("LON", "SYD", 80_000);
        let req = SelectionRequest::new(MinimumFareModule::Hip, &thru, 0..2);
        let mut cache = MinFareCache::new();

        assert!(!mf.check_normal_exempt(&mut cache, &req, 0..3));
        cache.mark_normal_exempt(travel_seg_hash(trx.segs(0..2)));
        assert!(mf.check_normal_exempt(&mut cache, &req, 0..3));
    }

    #[test]
    fn test_special_thru_fare_falls_back_to_normal_fare() {
        let data =
            InMemoryDataHandle::new().with_fare(PaxTypeFare::new("LH", "LON", "BKK", "Y", 120_000));
        let trx = priced(data, MinFareConfig::default());
        let pu = one_way(&trx, special("LON", "SYD", 100_000));

        let item = sweep(&trx, MinimumFareModule::Hip, &pu, appl()).unwrap();
        assert_eq!(item.plus_up_amount.amount, 20_000);
        assert_eq!((item.board_point.as_str(), item.off_point.as_str()), ("LON", "BKK"));
    }

    #[test]
    fn test_special_only_from_application_row() {
        let data =
            InMemoryDataHandle::new().with_fare(PaxTypeFare::new("LH", "LON", "BKK", "Y", 120_000));
        let trx = priced(data, MinFareConfig::default());
        let pu = one_way(&trx, special("LON", "SYD", 100_000));
        let mut row = appl();
        row.logic.hip.special_only = Indicator::Yes;

        assert!(sweep(&trx, MinimumFareModule::Hip, &pu, row).is_none());
    }

    #[test]
    fn test_special_only_from_configuration() {
        let data =
            InMemoryDataHandle::new().with_fare(PaxTypeFare::new("LH", "LON", "BKK", "Y", 120_000));
        let config = MinFareConfig {
            special_hip_special_only: true,
            ..Default::default()
        };
        let trx = priced(data, config);
        let pu = one_way(&trx, special("LON", "SYD", 100_000));

        assert!(sweep(&trx, MinimumFareModule::Hip, &pu, appl()).is_none());

        // An explicit row indicator overrides the configuration
        let mut row = appl();
        row.logic.hip.special_only = Indicator::No;
        assert!(sweep(&trx, MinimumFareModule::Hip, &pu, row).is_some());
    }

    #[test]
    fn test_retransit_ranges_only_swept_for_hip() {
        let data =
            InMemoryDataHandle::new().with_fare(PaxTypeFare::new("LH", "LON", "LON", "Y", 500_000));
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("FRA", "DE", "2"), "LH")
            .air(loc("FRA", "DE", "2"), loc("LON", "GB", "2"), "LH")
            .air(loc("LON", "GB", "2"), loc("NYC", "US", "1"), "BA")
            .data(data)
            .build();
        let pu = one_way(&trx, PaxTypeFare::new("LH", "LON", "NYC", "Y", 100_000));

        let hip = sweep(&trx, MinimumFareModule::Hip, &pu, appl()).unwrap();
        assert_eq!((hip.board_point.as_str(), hip.off_point.as_str()), ("LON", "LON"));
        assert_eq!(hip.plus_up_amount.amount, 400_000);

        assert!(sweep(&trx, MinimumFareModule::Ctm, &pu, appl()).is_none());
    }
}

//! Shared minimum fare logic: cabin and direction classification, the
//! memoized table lookups, and the entry points into fare selection.

use std::ops::Range;
use std::sync::Arc;

use crate::cache::{MinFareCache, get_map_key};
use crate::geo;
use crate::itinerary::{FareUsage, PaxTypeFare, PricingUnit, TravelSeg};
use crate::matchers::{
    ConditionalMatch, DefaultLogicMatcher, ExceptionTableMatcher, RuleLevelExclMatcher,
};
use crate::models::{
    CabinType, EligibleFare, FareDirection, MinimumFareModule, PricingUnitType,
};
use crate::selection::normal::NormalFareSelection;
use crate::selection::{FareSelection, FareSelector, PtfPair, SelectionRequest};
use crate::tables::{
    DomesticLogic, MinFareAppl, MinFareDefaultLogic, MinFareLogicFields, MinFareRuleLevelExcl,
    ModuleLogic,
};
use crate::trx::PricingTrx;

/// Lowest class of service among the known cabins of `fare_usages`, and
/// whether at least two known cabins differ. Undefined and unknown cabins
/// are ignored.
pub fn is_mixed_cabin(fare_usages: &[FareUsage]) -> (bool, CabinType) {
    let mut known = fare_usages
        .iter()
        .map(|fu| fu.fare.cabin)
        .filter(|cabin| cabin.is_known());

    let Some(first) = known.next() else {
        return (false, CabinType::Undefined);
    };
    known.fold((false, first), |(mixed, lowest), cabin| {
        (mixed || cabin != first, lowest.max(cabin))
    })
}

/// One-way fares for a one-way pricing unit, half round trip fares otherwise
pub fn eligible_fare(pu: &PricingUnit) -> EligibleFare {
    match pu.pu_type {
        PricingUnitType::OneWay => EligibleFare::OneWay,
        _ => EligibleFare::HalfRoundTrip,
    }
}

/// Inbound fare usages of round and circle trips are repriced in the
/// reverse direction
pub fn fare_direction(pu: &PricingUnit, fu: &FareUsage) -> FareDirection {
    if fu.is_inbound && pu.pu_type != PricingUnitType::OneWay {
        FareDirection::Inbound
    } else {
        FareDirection::Outbound
    }
}

/// Whether travel on `seg` stays domestic
pub fn is_domestic(seg: &TravelSeg) -> bool {
    geo::is_domestic(&seg.origin, &seg.destination)
}

/// Whether every point of the range lies in one domestic market
pub fn is_domestic_range(trx: &PricingTrx, segs: Range<usize>) -> bool {
    trx.contains(&segs) && geo::is_domestic_segments(trx.segs(segs))
}

pub fn get_rule_level_excl(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    module: MinimumFareModule,
    fare: &PaxTypeFare,
    segs: Range<usize>,
) -> Option<ConditionalMatch<MinFareRuleLevelExcl>> {
    let key = get_map_key(trx.segs(segs.clone()));
    if let Some(hit) = cache.cached_rule_level(key, module) {
        return Some(hit);
    }
    let found = RuleLevelExclMatcher::new(trx, module).find(fare, segs)?;
    if found.row.excluded.addressed_count() > 1 {
        cache.cache_rule_level(key, found.clone());
    }
    Some(found)
}

pub fn get_application(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    module: MinimumFareModule,
    fare: &PaxTypeFare,
    gov_carrier: &str,
    segs: Range<usize>,
) -> Option<ConditionalMatch<MinFareAppl>> {
    let key = get_map_key(trx.segs(segs.clone()));
    if let Some(hit) = cache.cached_appl(key, module) {
        return Some(hit);
    }
    let found = ExceptionTableMatcher::new(trx, module).find(fare, gov_carrier, segs)?;
    if found.row.applies.addressed_count() > 1 {
        cache.cache_appl(key, found.clone());
    }
    Some(found)
}

pub fn get_default_logic(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    module: MinimumFareModule,
    vendor: &str,
    gov_carrier: &str,
    segs: Range<usize>,
) -> Option<ConditionalMatch<MinFareDefaultLogic>> {
    let key = get_map_key(trx.segs(segs.clone()));
    if let Some(hit) = cache.cached_default_logic(key, module) {
        return Some(hit);
    }
    let found = DefaultLogicMatcher::new(trx, module).find(vendor, gov_carrier, segs)?;
    if found.row.modules.addressed_count() > 1 {
        cache.cache_default_logic(key, found.clone());
    }
    Some(found)
}

/// Whether a rule level exclusion row takes the thru fare out of `module`
pub fn is_thru_fare_excluded(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    module: MinimumFareModule,
    fare: &PaxTypeFare,
    segs: Range<usize>,
) -> bool {
    get_rule_level_excl(trx, cache, module, fare, segs)
        .is_some_and(|m| m.row.excluded.get(module).is_yes())
}

/// Logic governing one module for a thru fare: the application row's own
/// fields, or the default logic row when the application defers to it
#[derive(Debug, Clone)]
pub struct OverrideLogic {
    pub appl: Arc<MinFareAppl>,
    pub default_logic: Option<Arc<MinFareDefaultLogic>>,
}

impl OverrideLogic {
    pub fn fields(&self) -> &MinFareLogicFields {
        match &self.default_logic {
            Some(default_logic) if self.appl.apply_default_logic => &default_logic.logic,
            _ => &self.appl.logic,
        }
    }

    pub fn module(&self, module: MinimumFareModule) -> &ModuleLogic {
        self.fields().module(module)
    }

    pub fn domestic(&self) -> &DomesticLogic {
        &self.fields().domestic
    }
}

/// Outcome of the application table lookup for a thru fare
#[derive(Debug, Clone)]
pub enum Application {
    Applies(OverrideLogic),
    /// The application row waives the module for this fare
    Waived,
    /// No application row, or no default logic row where one is required
    Missing(String),
}

pub fn get_override_logic(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    module: MinimumFareModule,
    fare: &PaxTypeFare,
    gov_carrier: &str,
    segs: Range<usize>,
) -> Application {
    let Some(appl) = get_application(trx, cache, module, fare, gov_carrier, segs.clone()) else {
        return Application::Missing(format!(
            "no application row for {} {} {}",
            fare.vendor, gov_carrier, fare.fare_class
        ));
    };
    if appl.row.applies.get(module).is_no() {
        return Application::Waived;
    }
    if !appl.row.apply_default_logic {
        return Application::Applies(OverrideLogic {
            appl: appl.row,
            default_logic: None,
        });
    }

    match get_default_logic(trx, cache, module, &fare.vendor, gov_carrier, segs) {
        Some(default_logic) => Application::Applies(OverrideLogic {
            appl: appl.row,
            default_logic: Some(default_logic.row),
        }),
        None => Application::Missing(format!(
            "no default logic row for {} {}",
            fare.vendor, gov_carrier
        )),
    }
}

/// Requested status, raised to the thru fare's status when that is higher
fn resolved_request<'a>(req: &SelectionRequest<'a>) -> SelectionRequest<'a> {
    let status = req.pax_type_status.max(req.thru_fare.pax_type_status);
    req.clone().with_pax_type_status(status)
}

/// Selects a comparable fare, escalating the passenger status up to adult
pub fn select_qualify_fare(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    req: &SelectionRequest<'_>,
    special: bool,
) -> Option<Arc<PaxTypeFare>> {
    let selector = FareSelector::new(special);
    let mut req = resolved_request(req);
    loop {
        if let Some(fare) = selector.select_fare(trx, cache, &req) {
            return Some(fare);
        }
        let next = req.pax_type_status.escalate()?;
        req = req.with_pax_type_status(next);
    }
}

/// Like [`select_qualify_fare`], falling back to a fare constructed from two
/// fares when the range has no direct fare
pub fn select_qualify_const_fare(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    req: &SelectionRequest<'_>,
    special: bool,
) -> Option<PtfPair> {
    let selector = FareSelector::new(special);
    let mut req = resolved_request(req);
    loop {
        if let Some(pair) = select_const_with_status(trx, cache, selector, &req) {
            return Some(pair);
        }
        let next = req.pax_type_status.escalate()?;
        req = req.with_pax_type_status(next);
    }
}

/// Direct or constructed fare at exactly the requested passenger status
pub(crate) fn select_const_with_status(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    selector: FareSelector,
    req: &SelectionRequest<'_>,
) -> Option<PtfPair> {
    if let Some(fare) = selector.select_fare(trx, cache, req) {
        return Some(PtfPair::single(fare));
    }
    if !trx.config().construction || req.segs.len() < 2 {
        return None;
    }

    let mut best: Option<PtfPair> = None;
    let split_points = (req.segs.start + 1..req.segs.end).take(trx.config().max_construction_points);
    for split in split_points {
        let point = &trx.seg(split).origin;
        let first = selector.select_fare(trx, cache, &req.with_segs(req.segs.start..split));
        let Some(first) = first else { continue };
        let second = selector.select_fare(trx, cache, &req.with_segs(split..req.segs.end));
        let Some(second) = second else { continue };

        let pair = PtfPair::constructed(first, second, &point.city);
        if best.as_ref().is_none_or(|b| pair.amount().amount < b.amount().amount) {
            best = Some(pair);
        }
    }
    best
}

/// Normal selection retried one cabin lower at a time, nearest first
pub fn reselect_lower_cabin(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    req: &SelectionRequest<'_>,
) -> Option<Arc<PaxTypeFare>> {
    let mut cabin = req.cabin.lower();
    while let Some(lower) = cabin {
        if let Some(fare) = NormalFareSelection.select_in_cabins(trx, cache, req, &[lower]) {
            return Some(fare);
        }
        cabin = lower.lower();
    }
    None
}

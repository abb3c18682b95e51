//! Intermediate fare selection.
//!
//! A [`FareSelector`] picks the published fare a sub-range of the itinerary
//! is compared with. Candidates are split into four ordered sets
//! (governing carrier validated, governing carrier not validated, industry
//! validated, industry not validated), winnowed by the shared filters in this
//! module and tie-broken by [`FareSelPref`]. The first set that yields a fare
//! wins. The normal and special strategies only differ in which fares they
//! accept and in the order they relax their own preference.

pub mod normal;
pub mod round_trip;
pub mod special;

use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

use crate::cache::{MarketKey, MinFareCache};
use crate::diag::DiagnosticType;
use crate::error::MinFareError;
use crate::geo::{INDUSTRY_CARRIER, governing_carrier};
use crate::itinerary::{Loc, PaxTypeFare};
use crate::matchers::RuleLevelExclMatcher;
use crate::models::{
    CabinType, EligibleFare, FareDirection, GlobalDirection, MinimumFareModule, Money,
    PaxTypeStatus,
};
use crate::tables::AmountPreference;
use crate::trx::PricingTrx;

pub use normal::NormalFareSelection;
pub use round_trip::{RoundTripFare, RoundTripFareSelection};
pub use special::SpecialFareSelection;

/// What to select a comparable fare for
#[derive(Debug, Clone)]
pub struct SelectionRequest<'a> {
    pub module: MinimumFareModule,
    /// The fare the sub-range is compared against
    pub thru_fare: &'a PaxTypeFare,
    pub segs: Range<usize>,
    pub direction: FareDirection,
    pub eligible: EligibleFare,
    pub pax_type_status: PaxTypeStatus,
    pub cabin: CabinType,
    pub amount_pref: AmountPreference,
    /// Special thru fares are compared with special fares only
    pub special_only: bool,
}

impl<'a> SelectionRequest<'a> {
    pub fn new(module: MinimumFareModule, thru_fare: &'a PaxTypeFare, segs: Range<usize>) -> Self {
        Self {
            module,
            thru_fare,
            segs,
            direction: FareDirection::Outbound,
            eligible: EligibleFare::OneWay,
            pax_type_status: thru_fare.pax_type_status,
            cabin: thru_fare.cabin,
            amount_pref: AmountPreference::Lowest,
            special_only: false,
        }
    }

    pub fn with_segs(&self, segs: Range<usize>) -> Self {
        Self {
            segs,
            ..self.clone()
        }
    }

    pub fn with_direction(mut self, direction: FareDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_eligible(mut self, eligible: EligibleFare) -> Self {
        self.eligible = eligible;
        self
    }

    pub fn with_pax_type_status(mut self, status: PaxTypeStatus) -> Self {
        self.pax_type_status = status;
        self
    }

    pub fn with_cabin(mut self, cabin: CabinType) -> Self {
        self.cabin = cabin;
        self
    }

    pub fn with_amount_pref(mut self, amount_pref: AmountPreference) -> Self {
        self.amount_pref = amount_pref;
        self
    }

    pub fn with_special_only(mut self, special_only: bool) -> Self {
        self.special_only = special_only;
        self
    }
}

/// Fare selection strategy
pub trait FareSelection {
    /// Whether `fare` belongs to the group this strategy compares with
    fn accepts(&self, req: &SelectionRequest<'_>, fare: &PaxTypeFare) -> bool;

    /// Best fare for `req.segs` at exactly `req.pax_type_status`
    fn select_fare(
        &self,
        trx: &PricingTrx,
        cache: &mut MinFareCache,
        req: &SelectionRequest<'_>,
    ) -> Option<Arc<PaxTypeFare>>;

    fn display_diag(
        &self,
        trx: &PricingTrx,
        req: &SelectionRequest<'_>,
        selected: Option<&PaxTypeFare>,
    );
}

/// Normal or special selection, chosen from the thru fare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FareSelector {
    Normal(NormalFareSelection),
    Special(SpecialFareSelection),
}

impl FareSelector {
    pub fn new(special: bool) -> Self {
        if special {
            Self::Special(SpecialFareSelection)
        } else {
            Self::Normal(NormalFareSelection)
        }
    }

    pub fn for_fare(thru_fare: &PaxTypeFare) -> Self {
        Self::new(!thru_fare.is_normal())
    }

    fn strategy(&self) -> &dyn FareSelection {
        match self {
            Self::Normal(s) => s,
            Self::Special(s) => s,
        }
    }
}

impl FareSelection for FareSelector {
    fn accepts(&self, req: &SelectionRequest<'_>, fare: &PaxTypeFare) -> bool {
        self.strategy().accepts(req, fare)
    }

    fn select_fare(
        &self,
        trx: &PricingTrx,
        cache: &mut MinFareCache,
        req: &SelectionRequest<'_>,
    ) -> Option<Arc<PaxTypeFare>> {
        let selected = self.strategy().select_fare(trx, cache, req);
        self.display_diag(trx, req, selected.as_deref());
        selected
    }

    fn display_diag(
        &self,
        trx: &PricingTrx,
        req: &SelectionRequest<'_>,
        selected: Option<&PaxTypeFare>,
    ) {
        self.strategy().display_diag(trx, req, selected);
    }
}

/// A fare for a range: one published fare, or two fares combined at a
/// construction point
#[derive(Debug, Clone, PartialEq)]
pub struct PtfPair {
    pub first: Arc<PaxTypeFare>,
    pub second: Option<Arc<PaxTypeFare>>,
    pub construct_point: Option<String>,
}

impl PtfPair {
    pub fn single(fare: Arc<PaxTypeFare>) -> Self {
        Self {
            first: fare,
            second: None,
            construct_point: None,
        }
    }

    pub fn constructed(first: Arc<PaxTypeFare>, second: Arc<PaxTypeFare>, point: &str) -> Self {
        Self {
            first,
            second: Some(second),
            construct_point: Some(point.to_string()),
        }
    }

    pub fn amount(&self) -> Money {
        match &self.second {
            Some(second) => self.first.nuc_amount + second.nuc_amount,
            None => self.first.nuc_amount,
        }
    }

    pub fn is_constructed(&self) -> bool {
        self.second.is_some()
    }
}

/// Board/off cities, governing carrier and global direction of a sub-range
#[derive(Debug, Clone)]
pub(crate) struct SubMarket {
    pub board: String,
    pub off: String,
    pub gov_carrier: String,
    pub global_direction: GlobalDirection,
}

/// Global direction of travel over a range of the itinerary
pub fn global_direction_of(trx: &PricingTrx, segs: Range<usize>) -> Option<GlobalDirection> {
    if segs.is_empty() || !trx.contains(&segs) {
        return None;
    }
    let segs = trx.segs(segs);
    let mut points: Vec<Loc> = segs.iter().map(|s| s.origin.clone()).collect();
    points.extend(segs.last().map(|s| s.destination.clone()));
    trx.data().global_direction(&points)
}

/// Resolves the market a sub-range is repriced in. A range without a global
/// direction cannot be repriced and yields `None`.
pub(crate) fn resolve_market(trx: &PricingTrx, req: &SelectionRequest<'_>) -> Option<SubMarket> {
    if req.segs.is_empty() || !trx.contains(&req.segs) {
        return None;
    }
    let segs = trx.segs(req.segs.clone());
    let first = segs.first()?;
    let last = segs.last()?;

    let Some(global_direction) = global_direction_of(trx, req.segs.clone()) else {
        let err = MinFareError::NoGlobalDirection {
            board: first.origin.city.clone(),
            off: last.destination.city.clone(),
        };
        tracing::warn!(module = %req.module, error = %err, "Sub-range not repriced");
        return None;
    };

    Some(SubMarket {
        board: first.origin.city.clone(),
        off: last.destination.city.clone(),
        gov_carrier: governing_carrier(segs).unwrap_or_else(|| req.thru_fare.carrier.clone()),
        global_direction,
    })
}

/// Candidate fares of a market, fetched once per transaction pass
pub(crate) fn candidate_fares(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    market: &SubMarket,
) -> Vec<Arc<PaxTypeFare>> {
    let key = MarketKey::new(&market.board, &market.off, &market.gov_carrier);
    if let Some(fares) = cache.fares(&key) {
        return fares.to_vec();
    }
    let fares = trx.data().published_fares(
        &market.board,
        &market.off,
        &market.gov_carrier,
        trx.ticketing_date,
    );
    cache.cache_fares(key, fares.clone());
    fares
}

/// The four ordered candidate sets
pub(crate) fn partition(
    fares: &[Arc<PaxTypeFare>],
    gov_carrier: &str,
) -> [Vec<Arc<PaxTypeFare>>; 4] {
    let mut sets: [Vec<Arc<PaxTypeFare>>; 4] = Default::default();
    for fare in fares {
        let slot = match (fare.carrier == gov_carrier, fare.carrier == INDUSTRY_CARRIER) {
            (true, _) if fare.validated => 0,
            (true, _) => 1,
            (false, true) if fare.validated => 2,
            (false, true) => 3,
            (false, false) => continue,
        };
        sets[slot].push(Arc::clone(fare));
    }
    sets
}

pub fn is_eligible(fare: &PaxTypeFare, eligible: EligibleFare) -> bool {
    match eligible {
        EligibleFare::OneWay => fare.owrt.is_one_way(),
        EligibleFare::HalfRoundTrip => fare.owrt.is_half_round_trip_usable(),
    }
}

/// Whether the fare can be used for travel in `direction` of the sub-market
pub(crate) fn matches_direction(
    fare: &PaxTypeFare,
    market: &SubMarket,
    direction: FareDirection,
) -> bool {
    match direction {
        FareDirection::Outbound => fare.is_valid_between(&market.board, &market.off),
        FareDirection::Inbound => fare.is_valid_between(&market.off, &market.board),
    }
}

pub fn matches_global_direction(fare: &PaxTypeFare, global_direction: GlobalDirection) -> bool {
    fare.global_direction.is_none_or(|gd| gd == global_direction)
}

/// Whether a rule level exclusion row excludes `fare` from `module`
pub fn is_rule_level_excluded(
    trx: &PricingTrx,
    module: MinimumFareModule,
    fare: &PaxTypeFare,
    segs: Range<usize>,
) -> bool {
    RuleLevelExclMatcher::new(trx, module)
        .find(fare, segs)
        .is_some_and(|m| m.row.excluded.get(module).is_yes())
}

fn passes_filters(
    trx: &PricingTrx,
    req: &SelectionRequest<'_>,
    market: &SubMarket,
    fare: &PaxTypeFare,
) -> bool {
    fare.pax_type_status == req.pax_type_status
        && is_eligible(fare, req.eligible)
        && matches_direction(fare, market, req.direction)
        && matches_global_direction(fare, market.global_direction)
        && !is_rule_level_excluded(trx, req.module, fare, req.segs.clone())
}

/// Runs `pick` over the filtered candidate sets in order; the first set for
/// which `pick` yields a fare wins.
pub(crate) fn select_from_sets<A, P>(
    trx: &PricingTrx,
    cache: &mut MinFareCache,
    req: &SelectionRequest<'_>,
    accepts: A,
    pick: P,
) -> Option<Arc<PaxTypeFare>>
where
    A: Fn(&PaxTypeFare) -> bool,
    P: Fn(&[Arc<PaxTypeFare>]) -> Option<Arc<PaxTypeFare>>,
{
    let market = resolve_market(trx, req)?;
    let fares = candidate_fares(trx, cache, &market);

    partition(&fares, &market.gov_carrier).iter().find_map(|set| {
        let eligible: Vec<Arc<PaxTypeFare>> = set
            .iter()
            .filter(|fare| accepts(fare) && passes_filters(trx, req, &market, fare))
            .cloned()
            .collect();
        pick(&eligible)
    })
}

/// Tie-break order among otherwise equivalent candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareSelPref {
    /// Prefer fares booked in the thru fare's RBD
    pub same_rbd: Option<String>,
    /// Prefer mileage fares over routing fares (thru fare is a mileage fare)
    pub mileage_first: bool,
    pub amount_pref: AmountPreference,
}

impl FareSelPref {
    pub fn from_request(req: &SelectionRequest<'_>) -> Self {
        let rbd = &req.thru_fare.booking_code;
        Self {
            same_rbd: (!rbd.is_empty()).then(|| rbd.clone()),
            mileage_first: req.thru_fare.is_mileage(),
            amount_pref: req.amount_pref,
        }
    }

    fn rbd_rank(&self, fare: &PaxTypeFare) -> u8 {
        match &self.same_rbd {
            Some(rbd) if *rbd == fare.booking_code => 0,
            _ => 1,
        }
    }

    fn routing_rank(&self, fare: &PaxTypeFare) -> u8 {
        u8::from(fare.is_mileage() != self.mileage_first)
    }

    pub fn compare(&self, a: &PaxTypeFare, b: &PaxTypeFare) -> Ordering {
        let amount = match self.amount_pref {
            AmountPreference::Lowest => a.nuc_amount.amount.cmp(&b.nuc_amount.amount),
            AmountPreference::Highest => b.nuc_amount.amount.cmp(&a.nuc_amount.amount),
        };
        self.rbd_rank(a)
            .cmp(&self.rbd_rank(b))
            .then(self.routing_rank(a).cmp(&self.routing_rank(b)))
            .then(amount)
            .then_with(|| a.fare_class.cmp(&b.fare_class))
    }

    /// Preferred fare among `fares`
    pub fn choose<'f, I>(&self, fares: I) -> Option<Arc<PaxTypeFare>>
    where
        I: IntoIterator<Item = &'f Arc<PaxTypeFare>>,
    {
        fares
            .into_iter()
            .min_by(|a, b| self.compare(a, b))
            .cloned()
    }
}

/// Shared Diagnostic765 line for a selection attempt
pub(crate) fn trace_selection(
    trx: &PricingTrx,
    kind: &str,
    req: &SelectionRequest<'_>,
    selected: Option<&PaxTypeFare>,
) {
    trx.diag().write(DiagnosticType::Diagnostic765, || {
        let range = format!("{}-{}", req.segs.start, req.segs.end);
        match selected {
            Some(fare) => format!(
                "{kind:<7} {} {range:<6} {} {} {:<8} {:>12} {}",
                req.module,
                req.direction,
                fare.carrier,
                fare.fare_class,
                fare.nuc_amount,
                req.pax_type_status
            ),
            None => format!(
                "{kind:<7} {} {range:<6} {} NO FARE {}",
                req.module, req.direction, req.pax_type_status
            ),
        }
    });
}

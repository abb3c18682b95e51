//! Special fare selection.

use std::sync::Arc;

use super::{
    FareSelPref, FareSelection, NormalFareSelection, SelectionRequest, select_from_sets,
    trace_selection,
};
use crate::cache::MinFareCache;
use crate::itinerary::PaxTypeFare;
use crate::models::MinimumFareModule;
use crate::trx::PricingTrx;

/// Compares with special fares of the thru fare's group: the same fare type
/// first, then the same fare-type level, then climbing levels upward. The
/// special and promotional groups are never crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecialFareSelection;

fn pick_special(
    pref: &FareSelPref,
    thru: &PaxTypeFare,
    set: &[Arc<PaxTypeFare>],
) -> Option<Arc<PaxTypeFare>> {
    if let Some(fare) = pref.choose(set.iter().filter(|f| f.fare_type == thru.fare_type)) {
        return Some(fare);
    }
    if let Some(fare) = pref.choose(set.iter().filter(|f| f.fare_type_level == thru.fare_type_level)) {
        return Some(fare);
    }

    let mut levels: Vec<u8> = set
        .iter()
        .map(|f| f.fare_type_level)
        .filter(|level| *level > thru.fare_type_level)
        .collect();
    levels.sort_unstable();
    levels.dedup();
    levels
        .into_iter()
        .find_map(|level| pref.choose(set.iter().filter(|f| f.fare_type_level == level)))
}

impl FareSelection for SpecialFareSelection {
    fn accepts(&self, req: &SelectionRequest<'_>, fare: &PaxTypeFare) -> bool {
        !fare.is_normal() && fare.fare_type_group == req.thru_fare.fare_type_group
    }

    fn select_fare(
        &self,
        trx: &PricingTrx,
        cache: &mut MinFareCache,
        req: &SelectionRequest<'_>,
    ) -> Option<Arc<PaxTypeFare>> {
        let pref = FareSelPref::from_request(req);
        let special = select_from_sets(
            trx,
            cache,
            req,
            |fare| self.accepts(req, fare),
            |set| pick_special(&pref, req.thru_fare, set),
        );
        if special.is_some() {
            return special;
        }

        // HIP may compare a special thru fare with a normal fare
        if req.module == MinimumFareModule::Hip && !req.special_only {
            return NormalFareSelection.select_fare(trx, cache, req);
        }
        None
    }

    fn display_diag(
        &self,
        trx: &PricingTrx,
        req: &SelectionRequest<'_>,
        selected: Option<&PaxTypeFare>,
    ) {
        trace_selection(trx, "SPECIAL", req, selected);
    }
}

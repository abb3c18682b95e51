//! Normal fare selection.

use std::iter::successors;
use std::sync::Arc;

use super::{FareSelPref, FareSelection, SelectionRequest, select_from_sets, trace_selection};
use crate::cache::MinFareCache;
use crate::itinerary::PaxTypeFare;
use crate::logic::reselect_lower_cabin;
use crate::models::CabinType;
use crate::trx::PricingTrx;

/// Compares with normal fares: the thru cabin first, then better cabins
/// nearest first, then lower cabins nearest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalFareSelection;

impl NormalFareSelection {
    /// Best normal fare in the first of `cabins` that has one. A thru fare of
    /// unknown cabin accepts any cabin.
    pub(crate) fn select_in_cabins(
        &self,
        trx: &PricingTrx,
        cache: &mut MinFareCache,
        req: &SelectionRequest<'_>,
        cabins: &[CabinType],
    ) -> Option<Arc<PaxTypeFare>> {
        let pref = FareSelPref::from_request(req);
        let any_cabin = !req.cabin.is_known();

        select_from_sets(
            trx,
            cache,
            req,
            |fare| self.accepts(req, fare),
            |set| {
                if any_cabin {
                    return pref.choose(set);
                }
                cabins
                    .iter()
                    .find_map(|cabin| pref.choose(set.iter().filter(|f| f.cabin == *cabin)))
            },
        )
    }
}

/// The thru cabin followed by every better cabin, nearest first
fn upward_chain(cabin: CabinType) -> Vec<CabinType> {
    successors(Some(cabin), |c| c.higher()).collect()
}

impl FareSelection for NormalFareSelection {
    fn accepts(&self, _req: &SelectionRequest<'_>, fare: &PaxTypeFare) -> bool {
        fare.is_normal()
    }

    fn select_fare(
        &self,
        trx: &PricingTrx,
        cache: &mut MinFareCache,
        req: &SelectionRequest<'_>,
    ) -> Option<Arc<PaxTypeFare>> {
        self.select_in_cabins(trx, cache, req, &upward_chain(req.cabin))
            .or_else(|| reselect_lower_cabin(trx, cache, req))
    }

    fn display_diag(
        &self,
        trx: &PricingTrx,
        req: &SelectionRequest<'_>,
        selected: Option<&PaxTypeFare>,
    ) {
        trace_selection(trx, "NORMAL", req, selected);
    }
}

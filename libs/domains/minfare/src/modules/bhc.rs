//! Backhaul check for one-way pricing units.

use super::{post_on_pricing_unit, pricing_unit};
use crate::cache::MinFareCache;
use crate::error::MinFareResult;
use crate::itinerary::FarePath;
use crate::logic::{Application, get_override_logic, select_qualify_const_fare};
use crate::metrics::MinFareMetrics;
use crate::minimum_fare::{MinimumFare, is_stopover};
use crate::models::{EligibleFare, MinimumFareModule, Money, PricingUnitType};
use crate::selection::SelectionRequest;
use crate::trx::PricingTrx;

const MODULE: MinimumFareModule = MinimumFareModule::Bhc;

/// Compares a one-way pricing unit with the highest one-way fare from its
/// origin to any stopover point.
pub struct BhcMinimumFare<'a> {
    trx: &'a PricingTrx,
}

impl<'a> BhcMinimumFare<'a> {
    pub fn new(trx: &'a PricingTrx) -> Self {
        Self { trx }
    }

    /// Runs after HIP, sharing its cache; the compared total includes the
    /// HIP plus-ups already posted.
    pub fn process(
        &self,
        fare_path: &mut FarePath,
        pu_index: usize,
        cache: &mut MinFareCache,
    ) -> MinFareResult<Money> {
        let pu = pricing_unit(self.trx, fare_path, pu_index)?;
        if pu.exempt_min_fare || pu.pu_type != PricingUnitType::OneWay {
            return Ok(Money::nuc(0));
        }
        let Some(fu) = pu.fare_usages.first() else {
            return Ok(Money::nuc(0));
        };
        MinFareMetrics::record_check(MODULE);

        let gov_carrier = &fu.fare_market.governing_carrier;
        let segs = pu.segs.clone();
        let logic = match get_override_logic(self.trx, cache, MODULE, &fu.fare, gov_carrier, segs) {
            Application::Applies(logic) => logic,
            Application::Waived => return Ok(Money::nuc(0)),
            Application::Missing(details) => {
                tracing::warn!(module = %MODULE, pu_index, %details, "BHC not applied");
                MinFareMetrics::record_missing_data(MODULE);
                return Ok(Money::nuc(0));
            }
        };

        let mf = MinimumFare::new(self.trx, MODULE);
        let compared = pu.total_amount();
        let special = !fu.fare.is_normal();
        let req = SelectionRequest::new(MODULE, &fu.fare, pu.segs.clone())
            .with_eligible(EligibleFare::OneWay)
            .with_pax_type_status(fare_path.pax_type_status)
            .with_amount_pref(logic.module(MODULE).amount_pref);

        let mut cur_plus_up = None;
        for stop in pu.segs.start..pu.segs.end.saturating_sub(1) {
            if !is_stopover(self.trx, stop) {
                continue;
            }
            let segs = pu.segs.start..stop + 1;
            if !mf.passes_sub_range_checks(&logic, &fu.fare, pu.segs.clone(), segs.clone()) {
                continue;
            }
            let sub_req = req.with_segs(segs.clone());
            let Some(pair) = select_qualify_const_fare(self.trx, cache, &sub_req, special) else {
                MinFareMetrics::record_selection_miss(MODULE);
                continue;
            };
            mf.compare_and_save_fare(compared, pair.amount(), &pair, segs, &mut cur_plus_up);
        }

        Ok(match cur_plus_up {
            Some(item) => post_on_pricing_unit(self.trx, fare_path, pu_index, MODULE, item),
            None => Money::nuc(0),
        })
    }
}

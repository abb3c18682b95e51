//! Country of Payment minimum check.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{post_on_pricing_unit, pricing_unit, pricing_unit_amount};
use crate::cache::MinFareCache;
use crate::diag::DiagnosticType;
use crate::error::{MinFareError, MinFareResult};
use crate::itinerary::{FarePath, MinFarePlusUpItem, PricingUnit};
use crate::logic::{Application, get_override_logic};
use crate::metrics::MinFareMetrics;
use crate::minimum_fare::MinimumFare;
use crate::models::{EligibleFare, MinimumFareModule, Money};
use crate::selection::{RoundTripFareSelection, SelectionRequest};
use crate::tables::CopMinimum;
use crate::trx::PricingTrx;

const MODULE: MinimumFareModule = MinimumFareModule::Cop;

/// Compares a round or circle trip sold outside the journey origin country
/// with the round trip fare from the nation of payment.
pub struct CopMinimumFare<'a> {
    trx: &'a PricingTrx,
}

impl<'a> CopMinimumFare<'a> {
    pub fn new(trx: &'a PricingTrx) -> Self {
        Self { trx }
    }

    fn qualifies(&self, pu: &PricingUnit) -> bool {
        self.trx.sale_indicator().is_sold_outside() && pu.is_round_or_circle()
    }

    /// COP row of the nation of payment binding the ticketing carrier, or
    /// else a row whose filing carrier admits the ticketing carrier or one of
    /// the unit's governing carriers as a participant
    pub fn find_cop_minimum(&self, pu: &PricingUnit) -> Option<Arc<CopMinimum>> {
        let data = self.trx.data();
        let nation = &self.trx.sale_loc.nation;
        let date = self.trx.ticketing_date;
        let rows = data.cop_minimum(nation, date);

        if let Some(row) = rows
            .iter()
            .find(|row| row.carrier == self.trx.ticketing_carrier)
        {
            return Some(Arc::clone(row));
        }

        let mut carriers: BTreeSet<&str> = pu
            .fare_usages
            .iter()
            .map(|fu| fu.fare_market.governing_carrier.as_str())
            .collect();
        carriers.insert(self.trx.ticketing_carrier.as_str());

        rows.into_iter()
            .filter(|row| row.participation_ind.is_yes())
            .find(|row| {
                data.cop_participating_nation(nation, &row.carrier, date)
                    .iter()
                    .any(|p| carriers.contains(p.participating_carrier.as_str()))
            })
    }

    /// First point after the unit origin and before the turnaround that lies
    /// in the nation of payment
    pub fn cop_point(&self, pu: &PricingUnit, turnaround: usize) -> Option<usize> {
        (pu.segs.start + 1..turnaround)
            .find(|k| self.trx.seg(*k).origin.nation == self.trx.sale_loc.nation)
    }

    pub fn process(&self, fare_path: &mut FarePath, pu_index: usize) -> MinFareResult<Money> {
        let pu = pricing_unit(self.trx, fare_path, pu_index)?;
        if pu.exempt_min_fare || !self.qualifies(pu) {
            return Ok(Money::nuc(0));
        }
        MinFareMetrics::record_check(MODULE);

        let Some(row) = self.find_cop_minimum(pu) else {
            tracing::debug!(nation = %self.trx.sale_loc.nation, "No COP row for nation of payment");
            return Ok(Money::nuc(0));
        };
        let (Some(turnaround), Some(fu)) = (pu.turnaround(), pu.fare_usages.first()) else {
            return Ok(Money::nuc(0));
        };
        let Some(cop) = self.cop_point(pu, turnaround) else {
            return Ok(Money::nuc(0));
        };
        tracing::debug!(carrier = %row.carrier, seq_no = row.seq_no, cop, "COP applies");

        let mut cache = MinFareCache::new();
        let gov_carrier = &fu.fare_market.governing_carrier;
        let appl = get_override_logic(
            self.trx,
            &mut cache,
            MODULE,
            &fu.fare,
            gov_carrier,
            pu.segs.clone(),
        );
        let logic = match appl {
            Application::Applies(logic) => logic,
            Application::Waived => return Ok(Money::nuc(0)),
            Application::Missing(details) => {
                tracing::warn!(module = %MODULE, pu_index, %details, "COP not applied");
                MinFareMetrics::record_missing_data(MODULE);
                return Ok(Money::nuc(0));
            }
        };

        // Back to the COP city when the unit returns there, else to its end
        let cop_city = &self.trx.seg(cop).origin.city;
        let back = (turnaround + 1..=pu.segs.end)
            .find(|j| self.trx.seg(j - 1).destination.city == *cop_city)
            .unwrap_or(pu.segs.end);

        let req = SelectionRequest::new(MODULE, &fu.fare, pu.segs.clone())
            .with_eligible(EligibleFare::HalfRoundTrip)
            .with_pax_type_status(fare_path.pax_type_status)
            .with_amount_pref(logic.module(MODULE).amount_pref);
        let selection = RoundTripFareSelection::new(self.trx, pu, req);
        let Some(fare) = selection.select_fare(&mut cache, cop..turnaround, turnaround..back)
        else {
            MinFareMetrics::record_selection_miss(MODULE);
            return Ok(Money::nuc(0));
        };

        let mf = MinimumFare::new(self.trx, MODULE);
        let mut cur_plus_up = None;
        let compared = pricing_unit_amount(pu);
        let outbound = cop..turnaround;
        mf.compare_and_save_fare(compared, fare.amount(), &fare.outbound, outbound, &mut cur_plus_up);

        let Some(item) = cur_plus_up else {
            return Ok(Money::nuc(0));
        };
        self.trace_payment_amount(&item);
        Ok(post_on_pricing_unit(self.trx, fare_path, pu_index, MODULE, item))
    }

    /// The plus-up is posted in NUC; its value in the payment currency is
    /// only traced
    fn trace_payment_amount(&self, item: &MinFarePlusUpItem) {
        let currency = self.trx.calculation_currency;
        match self.trx.data().convert(item.plus_up_amount, currency) {
            Some(amount) => self.trx.diag().write(DiagnosticType::Diagnostic760, || {
                format!("COP PLUS UP {} = {amount}", item.plus_up_amount)
            }),
            None => {
                let err = MinFareError::CurrencyConversion {
                    from: item.plus_up_amount.currency.to_string(),
                    to: currency.to_string(),
                };
                tracing::warn!(error = %err, "COP plus-up kept in NUC");
            }
        }
    }
}

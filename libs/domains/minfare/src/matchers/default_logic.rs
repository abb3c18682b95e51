//! Default logic table matcher.

use std::ops::Range;

use super::{ConditionalMatch, Mismatch, match_geo_qualifier, trace_row};
use crate::models::MinimumFareModule;
use crate::tables::MinFareDefaultLogic;
use crate::trx::PricingTrx;

/// Finds the default logic row for a governing carrier and module
pub struct DefaultLogicMatcher<'a> {
    trx: &'a PricingTrx,
    module: MinimumFareModule,
}

impl<'a> DefaultLogicMatcher<'a> {
    pub fn new(trx: &'a PricingTrx, module: MinimumFareModule) -> Self {
        Self { trx, module }
    }

    pub fn find(
        &self,
        vendor: &str,
        gov_carrier: &str,
        segs: Range<usize>,
    ) -> Option<ConditionalMatch<MinFareDefaultLogic>> {
        let rows =
            self.trx
                .data()
                .min_fare_default_logic(vendor, gov_carrier, self.trx.ticketing_date);

        rows.into_iter().find_map(|row| {
            let outcome = self.match_row(&row, segs.clone());
            trace_row(
                self.trx,
                "DEFLOG",
                self.module,
                &format!("{}/{}", row.vendor, row.gov_carrier),
                row.seq_no,
                outcome,
            );
            outcome.ok().map(|conditional| ConditionalMatch::new(row, conditional))
        })
    }

    fn match_row(&self, row: &MinFareDefaultLogic, segs: Range<usize>) -> Result<bool, Mismatch> {
        if row.modules.get(self.module).is_blank() {
            return Err(Mismatch::Module);
        }
        match_geo_qualifier(self.trx, &row.geo, segs)?;
        Ok(false)
    }
}

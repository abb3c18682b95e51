//! Application (exception) table matcher.

use std::ops::Range;

use super::{ConditionalMatch, Mismatch, match_fare_qualifiers, match_geo_qualifier, trace_row};
use crate::itinerary::PaxTypeFare;
use crate::models::MinimumFareModule;
use crate::tables::MinFareAppl;
use crate::trx::PricingTrx;

/// Finds the application row for a thru fare and module
pub struct ExceptionTableMatcher<'a> {
    trx: &'a PricingTrx,
    module: MinimumFareModule,
}

impl<'a> ExceptionTableMatcher<'a> {
    pub fn new(trx: &'a PricingTrx, module: MinimumFareModule) -> Self {
        Self { trx, module }
    }

    /// First row for `gov_carrier` (then for any carrier) matching `fare`
    /// over `segs`
    pub fn find(
        &self,
        fare: &PaxTypeFare,
        gov_carrier: &str,
        segs: Range<usize>,
    ) -> Option<ConditionalMatch<MinFareAppl>> {
        let rows =
            self.trx
                .data()
                .min_fare_appl(&fare.vendor, gov_carrier, self.trx.ticketing_date);

        rows.into_iter().find_map(|row| {
            let outcome = self.match_row(&row, fare, segs.clone());
            trace_row(
                self.trx,
                "APPL",
                self.module,
                &format!("{}/{}", row.vendor, row.gov_carrier),
                row.seq_no,
                outcome,
            );
            outcome.ok().map(|conditional| ConditionalMatch::new(row, conditional))
        })
    }

    fn match_row(
        &self,
        row: &MinFareAppl,
        fare: &PaxTypeFare,
        segs: Range<usize>,
    ) -> Result<bool, Mismatch> {
        if row.applies.get(self.module).is_blank() {
            return Err(Mismatch::Module);
        }
        let conditional = match_fare_qualifiers(&row.fare, fare)?;
        match_geo_qualifier(self.trx, &row.geo, segs)?;
        Ok(conditional)
    }
}

//! Rule level exclusion table matcher.

use std::ops::Range;

use super::{ConditionalMatch, Mismatch, match_fare_qualifiers, match_geo_qualifier, trace_row};
use crate::itinerary::PaxTypeFare;
use crate::models::MinimumFareModule;
use crate::tables::MinFareRuleLevelExcl;
use crate::trx::PricingTrx;

/// Finds the rule level exclusion row governing a fare for one module
pub struct RuleLevelExclMatcher<'a> {
    trx: &'a PricingTrx,
    module: MinimumFareModule,
}

impl<'a> RuleLevelExclMatcher<'a> {
    pub fn new(trx: &'a PricingTrx, module: MinimumFareModule) -> Self {
        Self { trx, module }
    }

    /// First row, in sequence order, matching `fare` over `segs`
    pub fn find(
        &self,
        fare: &PaxTypeFare,
        segs: Range<usize>,
    ) -> Option<ConditionalMatch<MinFareRuleLevelExcl>> {
        let rows = self.trx.data().min_fare_rule_level_excl(
            &fare.vendor,
            fare.tariff,
            self.trx.ticketing_date,
        );

        rows.into_iter().find_map(|row| {
            let outcome = self.match_row(&row, fare, segs.clone());
            trace_row(
                self.trx,
                "RULEXC",
                self.module,
                &format!("{}/{}", row.vendor, row.rule_tariff),
                row.seq_no,
                outcome,
            );
            outcome.ok().map(|conditional| ConditionalMatch::new(row, conditional))
        })
    }

    fn match_row(
        &self,
        row: &MinFareRuleLevelExcl,
        fare: &PaxTypeFare,
        segs: Range<usize>,
    ) -> Result<bool, Mismatch> {
        if row.excluded.get(self.module).is_blank() {
            return Err(Mismatch::Module);
        }
        let conditional = match_fare_qualifiers(&row.fare, fare)?;
        match_geo_qualifier(self.trx, &row.geo, segs)?;
        Ok(conditional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Indicator;
    use crate::repository::InMemoryDataHandle;
    use crate::tables::{FareQualifiers, ModuleIndicators};
    use crate::test_support::{TrxBuilder, loc};

    #[test]
    fn test_excludes_matching_fare_class_conditionally() {
        let mut row = MinFareRuleLevelExcl::new("ATP", 21, 1);
        row.fare = FareQualifiers {
            fare_classes: vec!["-EE".to_string()],
            ..Default::default()
        };
        row.excluded = ModuleIndicators::default().set(MinimumFareModule::Hip, Indicator::Yes);
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("BKK", "TH", "3"), "BA")
            .data(InMemoryDataHandle::new().with_rule_level_excl(row))
            .build();

        let matcher = RuleLevelExclMatcher::new(&trx, MinimumFareModule::Hip);
        let literal = PaxTypeFare::new("BA", "LON", "BKK", "YEE", 100).with_rule(21, "1000");
        let found = matcher.find(&literal, 0..1).unwrap();
        assert!(found.row.excluded.get(MinimumFareModule::Hip).is_yes());
        assert!(!found.conditional);

        let wildcard = PaxTypeFare::new("BA", "LON", "BKK", "Y-", 100).with_rule(21, "1000");
        assert!(matcher.find(&wildcard, 0..1).unwrap().conditional);

        let other_tariff = literal.clone().with_rule(22, "1000");
        assert!(matcher.find(&other_tariff, 0..1).is_none());
        assert!(RuleLevelExclMatcher::new(&trx, MinimumFareModule::Ctm)
            .find(&literal, 0..1)
            .is_none());
    }
}

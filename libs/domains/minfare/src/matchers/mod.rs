//! Table matchers.
//!
//! Each matcher scans the rows the data handle returns for one table (already
//! filtered by vendor, carrier or tariff and by date) and returns the first
//! row whose conditions match the fare and the travel range. When
//! Diagnostic702 is active every examined row leaves a trace line.

pub mod default_logic;
pub mod exception_table;
pub mod fare_class;
pub mod rule_level_excl;

use std::ops::Range;
use std::sync::Arc;
use strum::Display;

use crate::diag::DiagnosticType;
use crate::itinerary::PaxTypeFare;
use crate::minimum_fare::match_geo;
use crate::models::MinimumFareModule;
use crate::tables::{FareQualifiers, GeoQualifier};
use crate::trx::PricingTrx;

pub use default_logic::DefaultLogicMatcher;
pub use exception_table::ExceptionTableMatcher;
pub use fare_class::{is_fare_class_name_conditional, match_fare_class};
pub use rule_level_excl::RuleLevelExclMatcher;

/// A matched table row plus whether the match depends on a fare class
/// wildcard of the fare
#[derive(Debug)]
pub struct ConditionalMatch<T> {
    pub row: Arc<T>,
    pub conditional: bool,
}

impl<T> Clone for ConditionalMatch<T> {
    fn clone(&self) -> Self {
        Self {
            row: Arc::clone(&self.row),
            conditional: self.conditional,
        }
    }
}

impl<T> ConditionalMatch<T> {
    pub fn new(row: Arc<T>, conditional: bool) -> Self {
        Self { row, conditional }
    }
}

/// First failed condition of a rejected row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Mismatch {
    #[strum(serialize = "MODULE NOT ADDRESSED")]
    Module,
    #[strum(serialize = "TARIFF CATEGORY")]
    TariffCategory,
    #[strum(serialize = "RULE/FOOTNOTE")]
    RuleFootnote,
    #[strum(serialize = "FARE CLASS")]
    FareClass,
    #[strum(serialize = "FARE TYPE")]
    FareType,
    #[strum(serialize = "ROUTING")]
    Routing,
    #[strum(serialize = "GLOBAL DIRECTION")]
    GlobalDirection,
    #[strum(serialize = "GEOGRAPHY")]
    Geography,
}

/// Compares the fare-level conditions of a row with `fare`, in table order.
/// Returns whether the match is conditional.
pub fn match_fare_qualifiers(q: &FareQualifiers, fare: &PaxTypeFare) -> Result<bool, Mismatch> {
    if q.tariff_category.is_some_and(|cat| cat != fare.tariff_category) {
        return Err(Mismatch::TariffCategory);
    }

    let rule_matches = q.rules.is_empty()
        || q.rules.iter().any(|rf| {
            (rf.rule.is_empty() || rf.rule == fare.rule)
                && (rf.footnote.is_empty()
                    || rf.footnote == fare.footnote1
                    || rf.footnote == fare.footnote2)
        });
    if !rule_matches {
        return Err(Mismatch::RuleFootnote);
    }

    let conditional = if q.fare_classes.is_empty() {
        false
    } else {
        let matched = q
            .fare_classes
            .iter()
            .find(|class| match_fare_class(&fare.fare_class, class))
            .ok_or(Mismatch::FareClass)?;
        is_fare_class_name_conditional(&fare.fare_class, matched)
    };

    if !q.fare_types.is_empty() && !q.fare_types.contains(&fare.fare_type) {
        return Err(Mismatch::FareType);
    }

    let routing_matches = q.routings.is_empty()
        || q.routings.iter().any(|r| {
            (r.tariff == 0 || r.tariff == fare.routing_tariff)
                && match r.number.as_str() {
                    "" => true,
                    "MPM" => fare.is_mileage(),
                    number => number == fare.routing_number,
                }
        });
    if !routing_matches {
        return Err(Mismatch::Routing);
    }

    if q.global_direction.is_some_and(|gd| fare.global_direction != Some(gd)) {
        return Err(Mismatch::GlobalDirection);
    }

    Ok(conditional)
}

/// Geography condition of a row over `segs`
pub fn match_geo_qualifier(
    trx: &PricingTrx,
    geo: &GeoQualifier,
    segs: Range<usize>,
) -> Result<(), Mismatch> {
    if match_geo(trx, geo, segs) {
        Ok(())
    } else {
        Err(Mismatch::Geography)
    }
}

/// Writes one Diagnostic702 line for an examined row
pub(crate) fn trace_row(
    trx: &PricingTrx,
    table: &str,
    module: MinimumFareModule,
    key: &str,
    seq_no: u32,
    outcome: Result<bool, Mismatch>,
) {
    trx.diag().write(DiagnosticType::Diagnostic702, || match outcome {
        Ok(conditional) => format!(
            "{table:<6} {module:<4} {key:<8} SEQ {seq_no:<8} MATCH{}",
            if conditional { " CONDITIONAL" } else { "" }
        ),
        Err(reason) => {
            format!("{table:<6} {module:<4} {key:<8} SEQ {seq_no:<8} NOMATCH {reason}")
        }
    });
}

//! Fare path orchestration.
//!
//! [`MinimumFareService`] runs the module drivers over every pricing unit in
//! regulatory order and summarises what was posted.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::instrument;

use crate::error::MinFareResult;
use crate::itinerary::FarePath;
use crate::metrics::MinFareMetrics;
use crate::models::{MinimumFareModule, Money};
use crate::modules::{
    ComMinimumFare, CopMinimumFare, CtmMinimumFare, HipMinimumFare, validate_fare_path,
};
use crate::trx::PricingTrx;

/// Outcome of one fare path evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinFareSummary {
    /// Amount posted per module
    pub by_module: BTreeMap<MinimumFareModule, Money>,
    pub total: Money,
    /// Lines of the active diagnostic, if any
    pub diagnostics: Vec<String>,
}

/// Minimum Fare Service - applies every check to a fare path in
/// regulatory order
pub struct MinimumFareService<'a> {
    trx: &'a PricingTrx,
}

impl<'a> MinimumFareService<'a> {
    pub fn new(trx: &'a PricingTrx) -> Self {
        Self { trx }
    }

    /// Runs HIP (with BHC), CTM and COP on each pricing unit, then COM
    /// across pricing units. Plus-ups are posted on `fare_path`.
    #[instrument(
        skip(self, fare_path),
        fields(trx_id = %self.trx.id, pricing_units = fare_path.pricing_units.len())
    )]
    pub fn process(&self, fare_path: &mut FarePath) -> MinFareResult<MinFareSummary> {
        validate_fare_path(self.trx, fare_path)?;
        let start = Instant::now();
        let mut by_module: BTreeMap<MinimumFareModule, Money> = BTreeMap::new();
        let mut add = |module, amount: Money| {
            if amount.is_positive() {
                let entry = by_module.entry(module).or_insert_with(|| Money::nuc(0));
                *entry = *entry + amount;
            }
        };

        for pu_index in 0..fare_path.pricing_units.len() {
            let before = fare_path.plus_up_info_list.len();
            HipMinimumFare::new(self.trx).process(fare_path, pu_index)?;
            // HIP and BHC share one driver; split their totals for the summary
            for info in &fare_path.plus_up_info_list[before..] {
                add(info.module, info.item.plus_up_amount);
            }

            let ctm = CtmMinimumFare::new(self.trx).process(fare_path, pu_index)?;
            add(MinimumFareModule::Ctm, ctm);
            let cop = CopMinimumFare::new(self.trx).process(fare_path, pu_index)?;
            add(MinimumFareModule::Cop, cop);
        }
        for pu_index in 1..fare_path.pricing_units.len() {
            let com = ComMinimumFare::new(self.trx).process(fare_path, pu_index)?;
            add(MinimumFareModule::Com, com);
        }

        let total = fare_path.total_plus_up();
        MinFareMetrics::record_fare_path(start.elapsed(), fare_path.pricing_units.len());
        tracing::info!(total = %total, "Minimum fare checks completed");

        Ok(MinFareSummary {
            by_module,
            total,
            diagnostics: self.trx.diag().take(),
        })
    }
}

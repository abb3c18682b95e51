//! Module drivers.
//!
//! Each driver decides whether its module applies to a pricing unit, runs
//! the comparison and posts at most one positive plus-up per fare usage
//! (HIP) or per pricing unit (BHC, CTM, COP, COM).

pub mod bhc;
pub mod com;
pub mod cop;
pub mod ctm;
pub mod hip;

pub use bhc::BhcMinimumFare;
pub use com::ComMinimumFare;
pub use cop::CopMinimumFare;
pub use ctm::CtmMinimumFare;
pub use hip::HipMinimumFare;

use crate::error::{MinFareError, MinFareResult};
use crate::itinerary::{FarePath, MinFarePlusUpItem, PlusUpInfo, PricingUnit};
use crate::metrics::MinFareMetrics;
use crate::minimum_fare::diag_for;
use crate::models::{MinimumFareModule, Money};
use crate::trx::PricingTrx;

/// Every pricing unit and fare usage must address segments of the
/// transaction, and each fare usage must lie inside its pricing unit
pub(crate) fn validate_fare_path(trx: &PricingTrx, fare_path: &FarePath) -> MinFareResult<()> {
    for (pu_index, pu) in fare_path.pricing_units.iter().enumerate() {
        if pu.segs.is_empty() || !trx.contains(&pu.segs) {
            return Err(MinFareError::InvalidItinerary(format!(
                "pricing unit {pu_index} covers segments {:?} of {}",
                pu.segs,
                trx.travel_segs.len()
            )));
        }
        for (fu_index, fu) in pu.fare_usages.iter().enumerate() {
            let segs = fu.segs();
            if segs.is_empty() || segs.start < pu.segs.start || segs.end > pu.segs.end {
                return Err(MinFareError::InvalidItinerary(format!(
                    "fare usage {fu_index} of pricing unit {pu_index} covers segments {segs:?}"
                )));
            }
        }
    }
    Ok(())
}

/// The pricing unit a driver works on. The whole fare path is checked first
/// since COM also reads the other pricing units.
pub(crate) fn pricing_unit<'f>(
    trx: &PricingTrx,
    fare_path: &'f FarePath,
    pu_index: usize,
) -> MinFareResult<&'f PricingUnit> {
    validate_fare_path(trx, fare_path)?;
    fare_path.pricing_units.get(pu_index).ok_or_else(|| {
        MinFareError::InvalidItinerary(format!("no pricing unit at index {pu_index}"))
    })
}

/// Amount a pricing unit level check compares with: thru fares, fare usage
/// plus-ups and the plus-ups already posted on the unit
pub(crate) fn pricing_unit_amount(pu: &PricingUnit) -> Money {
    pu.total_amount() + pu.min_fare_plus_up.total()
}

fn record_posted(
    trx: &PricingTrx,
    module: MinimumFareModule,
    pu_index: usize,
    item: &MinFarePlusUpItem,
) {
    tracing::info!(
        module = %module,
        pu_index,
        board = %item.board_point,
        off = %item.off_point,
        plus_up = %item.plus_up_amount,
        "Minimum fare plus-up posted"
    );
    MinFareMetrics::record_plus_up(module, item.plus_up_amount);
    trx.diag().write(diag_for(module), || {
        format!(
            "{module} PLUS UP {}-{} {}",
            item.board_point, item.off_point, item.plus_up_amount
        )
    });
}

/// Posts `item` on the pricing unit. Returns the amount posted.
pub(crate) fn post_on_pricing_unit(
    trx: &PricingTrx,
    fare_path: &mut FarePath,
    pu_index: usize,
    module: MinimumFareModule,
    item: MinFarePlusUpItem,
) -> Money {
    let Some(pu) = fare_path.pricing_units.get_mut(pu_index) else {
        return Money::nuc(0);
    };
    if !item.plus_up_amount.is_positive() {
        return Money::nuc(0);
    }
    record_posted(trx, module, pu_index, &item);
    let amount = item.plus_up_amount;
    pu.min_fare_plus_up.add_item(module, item.clone());
    fare_path.plus_up_info_list.push(PlusUpInfo {
        module,
        pu_index,
        fare_usage_index: None,
        item,
    });
    amount
}

/// Posts `item` on one fare usage. Returns the amount posted.
pub(crate) fn post_on_fare_usage(
    trx: &PricingTrx,
    fare_path: &mut FarePath,
    pu_index: usize,
    fu_index: usize,
    module: MinimumFareModule,
    item: MinFarePlusUpItem,
) -> Money {
    let Some(fu) = fare_path
        .pricing_units
        .get_mut(pu_index)
        .and_then(|pu| pu.fare_usages.get_mut(fu_index))
    else {
        return Money::nuc(0);
    };
    if !item.plus_up_amount.is_positive() {
        return Money::nuc(0);
    }
    record_posted(trx, module, pu_index, &item);
    let amount = item.plus_up_amount;
    fu.min_fare_plus_up.add_item(module, item.clone());
    fare_path.plus_up_info_list.push(PlusUpInfo {
        module,
        pu_index,
        fare_usage_index: Some(fu_index),
        item,
    });
    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::{FareMarket, FareUsage, PaxTypeFare};
    use crate::models::PricingUnitType;
    use crate::test_support::{TrxBuilder, loc};

    fn item(amount: i64) -> MinFarePlusUpItem {
        MinFarePlusUpItem {
            plus_up_amount: Money::nuc(amount),
            base_amount: Money::nuc(10_000),
            board_point: "LON".to_string(),
            off_point: "BKK".to_string(),
            construct_point: None,
        }
    }

    fn fare_path() -> FarePath {
        let fu = FareUsage::new(
            FareMarket::new(0..1, "BA"),
            PaxTypeFare::new("BA", "LON", "BKK", "Y", 5_000),
        );
        FarePath::new(vec![PricingUnit::new(PricingUnitType::OneWay, vec![fu])])
    }

    #[test]
    fn test_non_positive_plus_up_is_not_posted() {
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("BKK", "TH", "3"), "BA")
            .build();
        let mut fp = fare_path();

        assert_eq!(post_on_pricing_unit(&trx, &mut fp, 0, MinimumFareModule::Bhc, item(0)).amount, 0);
        assert_eq!(post_on_fare_usage(&trx, &mut fp, 0, 0, MinimumFareModule::Hip, item(-5)).amount, 0);
        assert!(fp.plus_up_info_list.is_empty());
        assert!(fp.pricing_units[0].min_fare_plus_up.is_empty());
    }

    #[test]
    fn test_posted_plus_up_is_recorded_on_fare_path() {
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("BKK", "TH", "3"), "BA")
            .build();
        let mut fp = fare_path();

        post_on_fare_usage(&trx, &mut fp, 0, 0, MinimumFareModule::Hip, item(700));
        post_on_pricing_unit(&trx, &mut fp, 0, MinimumFareModule::Bhc, item(300));

        assert_eq!(fp.total_plus_up().amount, 1_000);
        assert_eq!(fp.plus_up_info_list[0].fare_usage_index, Some(0));
        assert_eq!(fp.plus_up_info_list[1].fare_usage_index, None);
        assert_eq!(pricing_unit_amount(&fp.pricing_units[0]).amount, 6_000);
        assert!(pricing_unit(&trx, &fp, 1).is_err());
    }

    #[test]
    fn test_fare_usage_past_itinerary_is_invalid() {
        let trx = TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("BKK", "TH", "3"), "BA")
            .build();
        let mut fp = fare_path();
        fp.pricing_units[0].fare_usages[0].fare_market.segs = 0..3;

        let err = pricing_unit(&trx, &fp, 0).unwrap_err();
        assert!(matches!(err, MinFareError::InvalidItinerary(_)));
    }
}

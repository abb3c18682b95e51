//! Higher Intermediate Point check.

use super::{BhcMinimumFare, post_on_fare_usage, pricing_unit};
use crate::cache::MinFareCache;
use crate::error::MinFareResult;
use crate::geo::is_domestic_segments;
use crate::itinerary::{FarePath, FareUsage};
use crate::logic::{Application, get_override_logic, is_thru_fare_excluded};
use crate::metrics::MinFareMetrics;
use crate::minimum_fare::MinimumFare;
use crate::models::{GeoTravelType, MinimumFareModule, Money, PricingUnitType, TariffCategory};
use crate::trx::PricingTrx;

const MODULE: MinimumFareModule = MinimumFareModule::Hip;

/// Raises each fare component of an international pricing unit to the
/// highest fare between any of its intermediate points, then runs the
/// backhaul check on one-way units.
pub struct HipMinimumFare<'a> {
    trx: &'a PricingTrx,
}

impl<'a> HipMinimumFare<'a> {
    pub fn new(trx: &'a PricingTrx) -> Self {
        Self { trx }
    }

    /// Returns the HIP and BHC amount posted for the pricing unit
    pub fn process(&self, fare_path: &mut FarePath, pu_index: usize) -> MinFareResult<Money> {
        let pu = pricing_unit(self.trx, fare_path, pu_index)?;
        if pu.exempt_min_fare || pu.geo_travel_type != GeoTravelType::International {
            return Ok(Money::nuc(0));
        }
        MinFareMetrics::record_check(MODULE);

        let mut cache = MinFareCache::new();
        let mf = MinimumFare::new(self.trx, MODULE);
        let one_way = pu.pu_type == PricingUnitType::OneWay;
        let mut checked = Vec::new();
        let mut plus_ups = Vec::new();

        for (fu_index, fu) in pu.fare_usages.iter().enumerate() {
            if let Some(reason) = self.skip_reason(fu) {
                tracing::debug!(pu_index, fu_index, reason, "HIP not applied");
                continue;
            }
            checked.push(fu_index);

            let gov_carrier = &fu.fare_market.governing_carrier;
            let logic = match get_override_logic(
                self.trx,
                &mut cache,
                MODULE,
                &fu.fare,
                gov_carrier,
                fu.segs(),
            ) {
                Application::Applies(logic) => logic,
                Application::Waived => continue,
                Application::Missing(details) => {
                    tracing::warn!(module = %MODULE, fu_index, %details, "HIP not applied");
                    MinFareMetrics::record_missing_data(MODULE);
                    continue;
                }
            };
            if is_thru_fare_excluded(self.trx, &mut cache, MODULE, &fu.fare, fu.segs()) {
                tracing::debug!(pu_index, fu_index, "Thru fare excluded at rule level");
                continue;
            }

            let item =
                mf.process_intermediate(&mut cache, pu, fu, &logic, fare_path.pax_type_status);
            if let Some(item) = item {
                plus_ups.push((fu_index, item));
            }
        }

        if let Some(pu) = fare_path.pricing_units.get_mut(pu_index) {
            for fu_index in checked {
                if let Some(fu) = pu.fare_usages.get_mut(fu_index) {
                    fu.processed.insert(MODULE);
                }
            }
        }
        let mut total = Money::nuc(0);
        for (fu_index, item) in plus_ups {
            total =
                total + post_on_fare_usage(self.trx, fare_path, pu_index, fu_index, MODULE, item);
        }

        if one_way {
            let bhc = BhcMinimumFare::new(self.trx).process(fare_path, pu_index, &mut cache)?;
            total = total + bhc;
        }
        Ok(total)
    }

    fn skip_reason(&self, fu: &FareUsage) -> Option<&'static str> {
        let fare = &fu.fare;
        if fu.processed.contains(&MODULE) {
            Some("already processed")
        } else if is_domestic_segments(self.trx.segs(fu.segs())) {
            Some("domestic fare component")
        } else if fare.cat35_negotiated && fare.tariff_category == TariffCategory::Public {
            Some("public negotiated fare")
        } else if fare.fbr.as_ref().is_some_and(|fbr| fbr.hip_exempt) {
            Some("fare by rule exempt")
        } else if fare.psr {
            Some("specified routing fare")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::{FareByRuleInfo, PaxTypeFare, PricingUnit};
    use crate::repository::InMemoryDataHandle;
    use crate::tables::MinFareAppl;
    use crate::test_support::{TrxBuilder, fare_usage, loc};

    fn data() -> InMemoryDataHandle {
        let mut appl = MinFareAppl::new("ATP", "", 1);
        appl.apply_default_logic = false;
        InMemoryDataHandle::new().with_appl(appl).with_fares([
            PaxTypeFare::new("LH", "LON", "FRA", "Y", 30_000),
            PaxTypeFare::new("LH", "LON", "BKK", "Y", 120_000),
            PaxTypeFare::new("LH", "FRA", "BKK", "Y", 70_000),
        ])
    }

    fn trx(data: InMemoryDataHandle) -> PricingTrx {
        TrxBuilder::new()
            .air(loc("LON", "GB", "2"), loc("FRA", "DE", "2"), "LH")
            .air(loc("FRA", "DE", "2"), loc("BKK", "TH", "3"), "LH")
            .air(loc("BKK", "TH", "3"), loc("SYD", "AU", "3"), "LH")
            .data(data)
            .build()
    }

    fn fare_path(thru: PaxTypeFare) -> FarePath {
        let fu = fare_usage(0..3, "LH", thru);
        FarePath::new(vec![PricingUnit::new(PricingUnitType::OneWay, vec![fu])])
    }

    #[test]
    fn test_higher_intermediate_fare_raises_component() {
        let trx = trx(data());
        let mut fp = fare_path(PaxTypeFare::new("LH", "LON", "SYD", "Y", 100_000));

        let total = HipMinimumFare::new(&trx).process(&mut fp, 0).unwrap();
        assert_eq!(total.amount, 20_000);

        let fu = &fp.pricing_units[0].fare_usages[0];
        let items = fu.min_fare_plus_up.items(MinimumFareModule::Hip);
        assert_eq!(items.len(), 1);
        assert_eq!((items[0].board_point.as_str(), items[0].off_point.as_str()), ("LON", "BKK"));
        assert!(fu.processed.contains(&MinimumFareModule::Hip));
    }

    #[test]
    fn test_already_processed_component_is_skipped() {
        let trx = trx(data());
        let mut fp = fare_path(PaxTypeFare::new("LH", "LON", "SYD", "Y", 100_000));
        HipMinimumFare::new(&trx).process(&mut fp, 0).unwrap();

        let again = HipMinimumFare::new(&trx).process(&mut fp, 0).unwrap();
        assert_eq!(again.amount, 0);
        assert_eq!(fp.plus_up_info_list.len(), 1);
    }

    #[test]
    fn test_exempt_fares_are_skipped() {
        let trx = trx(data());
        let exempt = PaxTypeFare::new("LH", "LON", "SYD", "Y", 100_000).with_fbr(FareByRuleInfo {
            hip_exempt: true,
            ..Default::default()
        });
        let mut fp = fare_path(exempt);
        assert_eq!(HipMinimumFare::new(&trx).process(&mut fp, 0).unwrap().amount, 0);

        let mut psr = PaxTypeFare::new("LH", "LON", "SYD", "Y", 100_000);
        psr.psr = true;
        let mut fp = fare_path(psr);
        assert_eq!(HipMinimumFare::new(&trx).process(&mut fp, 0).unwrap().amount, 0);
    }

    #[test]
    fn test_lower_intermediate_fares_post_nothing() {
        let trx = trx(data());
        let mut fp = fare_path(PaxTypeFare::new("LH", "LON", "SYD", "Y", 150_000));
        assert_eq!(HipMinimumFare::new(&trx).process(&mut fp, 0).unwrap().amount, 0);
        assert!(fp.plus_up_info_list.is_empty());
    }

    #[test]
    fn test_domestic_pricing_unit_not_checked() {
        let trx = trx(data());
        let mut fp = fare_path(PaxTypeFare::new("LH", "LON", "SYD", "Y", 100_000));
        fp.pricing_units[0].geo_travel_type = GeoTravelType::Domestic;
        assert_eq!(HipMinimumFare::new(&trx).process(&mut fp, 0).unwrap().amount, 0);
    }

    #[test]
    fn test_fare_usage_past_itinerary_is_rejected() {
        let trx = trx(data());
        let fu = fare_usage(2..5, "LH", PaxTypeFare::new("LH", "BKK", "SYD", "Y", 10_000));
        let mut fp = FarePath::new(vec![PricingUnit::new(PricingUnitType::OneWay, vec![fu])]);

        let err = HipMinimumFare::new(&trx).process(&mut fp, 0).unwrap_err();
        assert!(matches!(err, crate::error::MinFareError::InvalidItinerary(_)));
        assert!(fp.plus_up_info_list.is_empty());
    }
}

//! Transaction-owned entities: locations, travel segments, fares, fare
//! usages, pricing units and fare paths.
//!
//! Travel segments live in the itinerary vector of [`crate::PricingTrx`] and
//! are referenced everywhere else by index. A fare market or a sub-range of
//! one is a contiguous `Range<usize>` into that vector.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::sync::Arc;

use crate::geo::INDUSTRY_CARRIER;
use crate::models::{
    CabinType, CurrencyCode, Directionality, FareTypeGroup, GeoTravelType, GlobalDirection,
    MinimumFareModule, Money, OwRt, PaxTypeStatus, PricingUnitType, TariffCategory,
};

/// Routing number used by mileage (MPM) fares
pub const MILEAGE_ROUTING: &str = "00000";

/// Default fare vendor
pub const ATPCO: &str = "ATP";

/// A city or airport with its geographic hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Loc {
    pub code: String,
    pub city: String,
    pub nation: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub sub_area: String,
    /// IATA area ("1", "2" or "3")
    pub area: String,
}

impl Loc {
    pub fn new(code: impl Into<String>, nation: impl Into<String>, area: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            city: code.clone(),
            code,
            nation: nation.into(),
            state: None,
            sub_area: String::new(),
            area: area.into(),
        }
    }
}

/// One flight (or surface) segment of the itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelSeg {
    /// 1-based position in the itinerary
    pub segment_order: u16,
    pub origin: Loc,
    pub destination: Loc,
    /// Marketing carrier; `None` for an ARNK (surface) segment
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub flight_number: u16,
    /// Whether the destination of this segment is a stopover
    #[serde(default)]
    pub stopover: bool,
    #[serde(default)]
    pub booking_code: String,
    #[serde(default)]
    pub cabin: CabinType,
    #[serde(default)]
    pub hidden_stops: u8,
    #[serde(default)]
    pub departure_date: Option<NaiveDate>,
}

impl TravelSeg {
    pub fn air(segment_order: u16, origin: Loc, destination: Loc, carrier: &str) -> Self {
        Self {
            segment_order,
            origin,
            destination,
            carrier: Some(carrier.to_string()),
            flight_number: 0,
            stopover: false,
            booking_code: "Y".to_string(),
            cabin: CabinType::Economy,
            hidden_stops: 0,
            departure_date: None,
        }
    }

    pub fn arunk(segment_order: u16, origin: Loc, destination: Loc) -> Self {
        Self {
            carrier: None,
            booking_code: String::new(),
            ..Self::air(segment_order, origin, destination, "")
        }
    }

    pub fn with_stopover(mut self) -> Self {
        self.stopover = true;
        self
    }

    pub fn with_flight(mut self, flight_number: u16) -> Self {
        self.flight_number = flight_number;
        self
    }

    pub fn with_booking_code(mut self, booking_code: &str, cabin: CabinType) -> Self {
        self.booking_code = booking_code.to_string();
        self.cabin = cabin;
        self
    }

    pub fn with_hidden_stops(mut self, stops: u8) -> Self {
        self.hidden_stops = stops;
        self
    }

    pub fn is_air(&self) -> bool {
        self.carrier.is_some()
    }
}

/// A fare component market: contiguous travel segments priced by one fare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareMarket {
    pub segs: Range<usize>,
    pub governing_carrier: String,
    #[serde(default)]
    pub global_direction: Option<GlobalDirection>,
}

impl FareMarket {
    pub fn new(segs: Range<usize>, governing_carrier: &str) -> Self {
        Self {
            segs,
            governing_carrier: governing_carrier.to_string(),
            global_direction: None,
        }
    }

    pub fn with_global_direction(mut self, global_direction: GlobalDirection) -> Self {
        self.global_direction = Some(global_direction);
        self
    }
}

/// Fare-by-rule (category 25) data attached to a calculated fare
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FareByRuleInfo {
    /// Percentage of the base fare; `None` for specified amounts
    #[serde(default)]
    pub percent: Option<f64>,
    /// The resulting fare is exempt from HIP
    #[serde(default)]
    pub hip_exempt: bool,
    /// The resulting fare is exempt from CTM
    #[serde(default)]
    pub ctm_exempt: bool,
    #[serde(default)]
    pub base_fare_class: String,
}

/// A published fare qualified for a passenger type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaxTypeFare {
    pub vendor: String,
    pub carrier: String,
    pub market1: String,
    pub market2: String,
    pub tariff: u16,
    pub tariff_category: TariffCategory,
    pub rule: String,
    pub footnote1: String,
    pub footnote2: String,
    pub fare_class: String,
    pub fare_type: String,
    pub fare_type_group: FareTypeGroup,
    /// Position of the fare type inside its group; higher is less restrictive
    pub fare_type_level: u8,
    pub cabin: CabinType,
    pub booking_code: String,
    pub owrt: OwRt,
    pub directionality: Directionality,
    pub global_direction: Option<GlobalDirection>,
    pub routing_tariff: u16,
    pub routing_number: String,
    pub pax_type_status: PaxTypeStatus,
    /// One-way amount in NUC
    pub nuc_amount: Money,
    /// Fare rules were validated for the itinerary
    pub validated: bool,
    /// Category 35 negotiated fare
    pub cat35_negotiated: bool,
    /// Published specified routing fare
    pub psr: bool,
    pub fbr: Option<FareByRuleInfo>,
}

impl PaxTypeFare {
    pub fn new(carrier: &str, market1: &str, market2: &str, fare_class: &str, nuc: i64) -> Self {
        Self {
            vendor: ATPCO.to_string(),
            carrier: carrier.to_string(),
            market1: market1.to_string(),
            market2: market2.to_string(),
            fare_class: fare_class.to_string(),
            fare_type: "EU".to_string(),
            booking_code: fare_class.chars().next().map(String::from).unwrap_or_default(),
            routing_number: MILEAGE_ROUTING.to_string(),
            nuc_amount: Money::nuc(nuc),
            validated: true,
            ..Default::default()
        }
    }

    pub fn with_cabin(mut self, cabin: CabinType) -> Self {
        self.cabin = cabin;
        self
    }

    pub fn with_fare_type(mut self, fare_type: &str, group: FareTypeGroup, level: u8) -> Self {
        self.fare_type = fare_type.to_string();
        self.fare_type_group = group;
        self.fare_type_level = level;
        self
    }

    pub fn with_booking_code(mut self, booking_code: &str) -> Self {
        self.booking_code = booking_code.to_string();
        self
    }

    pub fn with_owrt(mut self, owrt: OwRt) -> Self {
        self.owrt = owrt;
        self
    }

    pub fn with_directionality(mut self, directionality: Directionality) -> Self {
        self.directionality = directionality;
        self
    }

    pub fn with_global_direction(mut self, global_direction: GlobalDirection) -> Self {
        self.global_direction = Some(global_direction);
        self
    }

    pub fn with_pax_type_status(mut self, status: PaxTypeStatus) -> Self {
        self.pax_type_status = status;
        self
    }

    pub fn with_rule(mut self, tariff: u16, rule: &str) -> Self {
        self.tariff = tariff;
        self.rule = rule.to_string();
        self
    }

    pub fn with_routing(mut self, routing_tariff: u16, routing_number: &str) -> Self {
        self.routing_tariff = routing_tariff;
        self.routing_number = routing_number.to_string();
        self
    }

    pub fn with_validated(mut self, validated: bool) -> Self {
        self.validated = validated;
        self
    }

    pub fn with_fbr(mut self, fbr: FareByRuleInfo) -> Self {
        self.fbr = Some(fbr);
        self
    }

    pub fn is_normal(&self) -> bool {
        self.fare_type_group == FareTypeGroup::Normal
    }

    pub fn is_mileage(&self) -> bool {
        self.routing_number.is_empty() || self.routing_number == MILEAGE_ROUTING
    }

    pub fn is_industry(&self) -> bool {
        self.carrier == INDUSTRY_CARRIER
    }

    /// Whether the fare can be used from `board` to `off`
    pub fn is_valid_between(&self, board: &str, off: &str) -> bool {
        let forward = self.market1 == board && self.market2 == off;
        let backward = self.market1 == off && self.market2 == board;
        match self.directionality {
            Directionality::Both => forward || backward,
            Directionality::From => forward,
            Directionality::To => backward,
        }
    }
}

/// One minimum fare adjustment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinFarePlusUpItem {
    pub plus_up_amount: Money,
    /// The intermediate (or constructed) fare the plus-up was derived from
    pub base_amount: Money,
    pub board_point: String,
    pub off_point: String,
    /// Break point when the base fare was constructed from two fares
    #[serde(default)]
    pub construct_point: Option<String>,
}

impl MinFarePlusUpItem {
    pub fn currency(&self) -> CurrencyCode {
        self.plus_up_amount.currency
    }
}

/// Plus-up items keyed by module
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinFarePlusUp {
    items: BTreeMap<MinimumFareModule, Vec<MinFarePlusUpItem>>,
}

impl MinFarePlusUp {
    pub fn add_item(&mut self, module: MinimumFareModule, item: MinFarePlusUpItem) {
        self.items.entry(module).or_default().push(item);
    }

    pub fn items(&self, module: MinimumFareModule) -> &[MinFarePlusUpItem] {
        self.items.get(&module).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, module: MinimumFareModule) -> bool {
        !self.items(module).is_empty()
    }

    /// Sum of the plus-ups posted for `module`
    pub fn sum(&self, module: MinimumFareModule) -> Money {
        self.items(module)
            .iter()
            .fold(Money::nuc(0), |acc, item| acc + item.plus_up_amount)
    }

    pub fn total(&self) -> Money {
        self.items
            .values()
            .flatten()
            .fold(Money::nuc(0), |acc, item| acc + item.plus_up_amount)
    }

    pub fn is_empty(&self) -> bool {
        self.items.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MinimumFareModule, &MinFarePlusUpItem)> {
        self.items
            .iter()
            .flat_map(|(module, items)| items.iter().map(move |item| (*module, item)))
    }
}

/// One fare component within a pricing unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareUsage {
    pub fare_market: FareMarket,
    pub fare: Arc<PaxTypeFare>,
    #[serde(default)]
    pub is_inbound: bool,
    /// Mileage surcharge percentage (0, 5, 10, 15, 20 or 25)
    #[serde(default)]
    pub mileage_surcharge_pct: u16,
    #[serde(default)]
    pub min_fare_plus_up: MinFarePlusUp,
    #[serde(default)]
    pub processed: BTreeSet<MinimumFareModule>,
}

impl FareUsage {
    pub fn new(fare_market: FareMarket, fare: PaxTypeFare) -> Self {
        Self {
            fare_market,
            fare: Arc::new(fare),
            is_inbound: false,
            mileage_surcharge_pct: 0,
            min_fare_plus_up: MinFarePlusUp::default(),
            processed: BTreeSet::new(),
        }
    }

    pub fn inbound(mut self) -> Self {
        self.is_inbound = true;
        self
    }

    pub fn with_mileage_surcharge(mut self, pct: u16) -> Self {
        self.mileage_surcharge_pct = pct;
        self
    }

    pub fn segs(&self) -> Range<usize> {
        self.fare_market.segs.clone()
    }

    /// Thru fare amount including the mileage surcharge
    pub fn thru_amount(&self) -> Money {
        self.fare.nuc_amount.with_surcharge(self.mileage_surcharge_pct)
    }
}

/// One fare-construction unit of the fare path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingUnit {
    pub pu_type: PricingUnitType,
    #[serde(default)]
    pub geo_travel_type: GeoTravelType,
    pub segs: Range<usize>,
    pub fare_usages: Vec<FareUsage>,
    #[serde(default)]
    pub exempt_min_fare: bool,
    #[serde(default)]
    pub min_fare_plus_up: MinFarePlusUp,
}

impl PricingUnit {
    pub fn new(pu_type: PricingUnitType, fare_usages: Vec<FareUsage>) -> Self {
        let start = fare_usages
            .first()
            .map(|fu| fu.fare_market.segs.start)
            .unwrap_or_default();
        let end = fare_usages
            .last()
            .map(|fu| fu.fare_market.segs.end)
            .unwrap_or(start);
        Self {
            pu_type,
            geo_travel_type: GeoTravelType::International,
            segs: start..end,
            fare_usages,
            exempt_min_fare: false,
            min_fare_plus_up: MinFarePlusUp::default(),
        }
    }

    pub fn with_geo_travel_type(mut self, geo_travel_type: GeoTravelType) -> Self {
        self.geo_travel_type = geo_travel_type;
        self
    }

    pub fn exempt(mut self) -> Self {
        self.exempt_min_fare = true;
        self
    }

    pub fn is_round_or_circle(&self) -> bool {
        matches!(
            self.pu_type,
            PricingUnitType::RoundTrip | PricingUnitType::CircleTrip
        )
    }

    /// Sum of thru fares plus the plus-ups already posted on the fare usages
    pub fn total_amount(&self) -> Money {
        self.fare_usages.iter().fold(Money::nuc(0), |acc, fu| {
            acc + fu.thru_amount() + fu.min_fare_plus_up.total()
        })
    }

    /// Index of the first inbound segment, i.e. the turnaround boundary
    pub fn turnaround(&self) -> Option<usize> {
        self.fare_usages
            .iter()
            .find(|fu| fu.is_inbound)
            .map(|fu| fu.fare_market.segs.start)
    }
}

/// Plus-up previously computed for an other-sector check, addressed by
/// segment order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OscPlusUp {
    pub board_seg_order: u16,
    pub off_seg_order: u16,
    pub board_point: String,
    pub off_point: String,
    pub base_amount: Money,
    pub plus_up_amount: Money,
}

impl OscPlusUp {
    pub fn seg_orders(&self) -> BTreeSet<u16> {
        (self.board_seg_order..=self.off_seg_order).collect()
    }
}

/// A plus-up posted on the fare path, for total fare assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlusUpInfo {
    pub module: MinimumFareModule,
    pub pu_index: usize,
    #[serde(default)]
    pub fare_usage_index: Option<usize>,
    pub item: MinFarePlusUpItem,
}

/// Priced solution for one passenger type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FarePath {
    pub pricing_units: Vec<PricingUnit>,
    #[serde(default)]
    pub pax_type_status: PaxTypeStatus,
    #[serde(default)]
    pub osc_plus_ups: Vec<OscPlusUp>,
    #[serde(default)]
    pub plus_up_info_list: Vec<PlusUpInfo>,
}

impl FarePath {
    pub fn new(pricing_units: Vec<PricingUnit>) -> Self {
        Self {
            pricing_units,
            ..Default::default()
        }
    }

    pub fn total_plus_up(&self) -> Money {
        self.plus_up_info_list
            .iter()
            .fold(Money::nuc(0), |acc, info| acc + info.item.plus_up_amount)
    }
}

//! Minimum fare rule tables.
//!
//! Rows are supplied by the data handle and are immutable for the duration
//! of a transaction; they are shared as `Arc<Row>`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geo::LocKey;
use crate::models::{GlobalDirection, Indicator, MinimumFareModule, TariffCategory};

/// Rows with an effective/discontinue window
pub trait Effective {
    fn effective(&self) -> NaiveDate;
    fn discontinue(&self) -> NaiveDate;

    fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective() <= date && date <= self.discontinue()
    }
}

macro_rules! impl_effective {
    ($($row:ty),+ $(,)?) => {
        $(
            impl Effective for $row {
                fn effective(&self) -> NaiveDate {
                    self.effective_date
                }

                fn discontinue(&self) -> NaiveDate {
                    self.discontinue_date
                }
            }
        )+
    };
}

fn open_effective() -> NaiveDate {
    NaiveDate::MIN
}

fn open_discontinue() -> NaiveDate {
    NaiveDate::MAX
}

/// One indicator per minimum fare module
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleIndicators {
    pub hip: Indicator,
    pub ctm: Indicator,
    pub bhc: Indicator,
    pub com: Indicator,
    pub cop: Indicator,
    pub cpm: Indicator,
    pub dmc: Indicator,
    pub osc: Indicator,
    pub rsc: Indicator,
}

impl ModuleIndicators {
    /// All modules set to `indicator`
    pub fn all(indicator: Indicator) -> Self {
        Self {
            hip: indicator,
            ctm: indicator,
            bhc: indicator,
            com: indicator,
            cop: indicator,
            cpm: indicator,
            dmc: indicator,
            osc: indicator,
            rsc: indicator,
        }
    }

    pub fn get(&self, module: MinimumFareModule) -> Indicator {
        match module {
            MinimumFareModule::Hip => self.hip,
            MinimumFareModule::Ctm => self.ctm,
            MinimumFareModule::Bhc => self.bhc,
            MinimumFareModule::Com => self.com,
            MinimumFareModule::Cop => self.cop,
            MinimumFareModule::Cpm => self.cpm,
            MinimumFareModule::Dmc => self.dmc,
            MinimumFareModule::Osc => self.osc,
            MinimumFareModule::Rsc => self.rsc,
            MinimumFareModule::Ncj => Indicator::Blank,
        }
    }

    pub fn set(mut self, module: MinimumFareModule, indicator: Indicator) -> Self {
        let slot = match module {
            MinimumFareModule::Hip => &mut self.hip,
            MinimumFareModule::Ctm => &mut self.ctm,
            MinimumFareModule::Bhc => &mut self.bhc,
            MinimumFareModule::Com => &mut self.com,
            MinimumFareModule::Cop => &mut self.cop,
            MinimumFareModule::Cpm => &mut self.cpm,
            MinimumFareModule::Dmc => &mut self.dmc,
            MinimumFareModule::Osc => &mut self.osc,
            MinimumFareModule::Rsc => &mut self.rsc,
            MinimumFareModule::Ncj => return self,
        };
        *slot = indicator;
        self
    }

    /// Number of modules this row says something about
    pub fn addressed_count(&self) -> usize {
        [
            self.hip, self.ctm, self.bhc, self.com, self.cop, self.cpm, self.dmc, self.osc,
            self.rsc,
        ]
        .iter()
        .filter(|i| !i.is_blank())
        .count()
    }
}

/// Geography scope of a table row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoDirectional {
    /// Travel between loc1 and loc2 in either direction
    #[default]
    Between,
    /// Travel from loc1 to loc2
    From,
    /// Travel wholly within loc1
    Within,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoQualifier {
    pub directional: GeoDirectional,
    pub loc1: Option<LocKey>,
    pub loc2: Option<LocKey>,
    /// Travel must pass through this location
    pub via: Option<LocKey>,
}

/// Rule number and footnote pair; blank fields are wildcards
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleFootnote {
    pub rule: String,
    pub footnote: String,
}

/// Routing tariff and number; tariff 0 and a blank number are wildcards,
/// `MPM` matches mileage fares only
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingQualifier {
    pub tariff: u16,
    pub number: String,
}

/// Fare-level conditions shared by the matched tables. Empty lists are
/// wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FareQualifiers {
    pub tariff_category: Option<TariffCategory>,
    pub rules: Vec<RuleFootnote>,
    pub fare_classes: Vec<String>,
    pub fare_types: Vec<String>,
    pub routings: Vec<RoutingQualifier>,
    pub global_direction: Option<GlobalDirection>,
}

/// Whether only stopover points or all ticketed points count as
/// intermediate points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopTktInd {
    Stopover,
    #[default]
    TicketedPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountPreference {
    #[default]
    Lowest,
    Highest,
}

/// Which intermediate city pairs are checked, relative to the thru fare
/// component.
///
/// A board point qualifies when it is the origin (`orig`), lies in the
/// origin nation (`orig_nation`) or is any intermediate point
/// (`from_inter`). The off point is qualified symmetrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityPairRule {
    pub orig: bool,
    pub orig_nation: bool,
    pub from_inter: bool,
    pub dest: bool,
    pub dest_nation: bool,
    pub to_inter: bool,
}

impl Default for CityPairRule {
    fn default() -> Self {
        Self {
            orig: true,
            orig_nation: true,
            from_inter: true,
            dest: true,
            dest_nation: true,
            to_inter: true,
        }
    }
}

/// Per-module override logic
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleLogic {
    pub stop_tkt: StopTktInd,
    pub city_pair: CityPairRule,
    pub amount_pref: AmountPreference,
    /// Special fares are compared with special fares only; blank defers to
    /// configuration
    pub special_only: Indicator,
}

/// Domestic sub-range handling
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomesticLogic {
    /// `N` excludes domestic sub-ranges from the check
    pub appl: Indicator,
    /// Nations where domestic sub-ranges are checked regardless of `appl`
    pub except_locs: Vec<LocKey>,
    /// Thru fare types for which domestic sub-ranges are checked regardless
    /// of `appl`
    pub except_fare_types: Vec<String>,
}

/// Logic fields present both in the default logic table and as overrides in
/// the application table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MinFareLogicFields {
    pub hip: ModuleLogic,
    pub ctm: ModuleLogic,
    pub bhc: ModuleLogic,
    pub com: ModuleLogic,
    pub cop: ModuleLogic,
    pub domestic: DomesticLogic,
}

impl MinFareLogicFields {
    pub fn module(&self, module: MinimumFareModule) -> &ModuleLogic {
        match module {
            MinimumFareModule::Ctm => &self.ctm,
            MinimumFareModule::Bhc => &self.bhc,
            MinimumFareModule::Com => &self.com,
            MinimumFareModule::Cop => &self.cop,
            _ => &self.hip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineInd {
    #[default]
    Blank,
    Online,
    Interline,
}

/// Intermediate location travel restriction of an application row.
///
/// When `loc` is set and a sub-range board or off point lies in it, the
/// sub-range is excluded if travel from the thru origin to that point is
/// non-stop (`non_stop`), direct (`direct`), or online/interline as
/// requested by `online`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterLocTravel {
    pub loc: Option<LocKey>,
    pub non_stop: Indicator,
    pub direct: Indicator,
    pub online: OnlineInd,
}

/// Application table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinFareAppl {
    pub vendor: String,
    /// Blank applies to any governing carrier
    #[serde(default)]
    pub gov_carrier: String,
    pub seq_no: u32,
    #[serde(default = "open_effective")]
    pub effective_date: NaiveDate,
    #[serde(default = "open_discontinue")]
    pub discontinue_date: NaiveDate,
    #[serde(default)]
    pub fare: FareQualifiers,
    #[serde(default)]
    pub geo: GeoQualifier,
    /// `Y` the module applies, `N` the module is waived, blank not addressed
    #[serde(default)]
    pub applies: ModuleIndicators,
    #[serde(default = "default_true")]
    pub apply_default_logic: bool,
    #[serde(default)]
    pub logic: MinFareLogicFields,
    #[serde(default)]
    pub inter_loc: InterLocTravel,
}

fn default_true() -> bool {
    true
}

impl MinFareAppl {
    pub fn new(vendor: &str, gov_carrier: &str, seq_no: u32) -> Self {
        Self {
            vendor: vendor.to_string(),
            gov_carrier: gov_carrier.to_string(),
            seq_no,
            effective_date: open_effective(),
            discontinue_date: open_discontinue(),
            fare: FareQualifiers::default(),
            geo: GeoQualifier::default(),
            applies: ModuleIndicators::all(Indicator::Yes),
            apply_default_logic: true,
            logic: MinFareLogicFields::default(),
            inter_loc: InterLocTravel::default(),
        }
    }
}

/// Default logic table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinFareDefaultLogic {
    pub vendor: String,
    #[serde(default)]
    pub gov_carrier: String,
    pub seq_no: u32,
    #[serde(default = "open_effective")]
    pub effective_date: NaiveDate,
    #[serde(default = "open_discontinue")]
    pub discontinue_date: NaiveDate,
    #[serde(default)]
    pub geo: GeoQualifier,
    /// Modules the row provides logic for
    #[serde(default)]
    pub modules: ModuleIndicators,
    #[serde(default)]
    pub logic: MinFareLogicFields,
}

impl MinFareDefaultLogic {
    pub fn new(vendor: &str, gov_carrier: &str, seq_no: u32) -> Self {
        Self {
            vendor: vendor.to_string(),
            gov_carrier: gov_carrier.to_string(),
            seq_no,
            effective_date: open_effective(),
            discontinue_date: open_discontinue(),
            geo: GeoQualifier::default(),
            modules: ModuleIndicators::all(Indicator::Yes),
            logic: MinFareLogicFields::default(),
        }
    }
}

/// Rule level exclusion table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinFareRuleLevelExcl {
    pub vendor: String,
    pub rule_tariff: u16,
    pub seq_no: u32,
    #[serde(default = "open_effective")]
    pub effective_date: NaiveDate,
    #[serde(default = "open_discontinue")]
    pub discontinue_date: NaiveDate,
    #[serde(default)]
    pub fare: FareQualifiers,
    #[serde(default)]
    pub geo: GeoQualifier,
    /// `Y` the matching fare is excluded from the module
    #[serde(default)]
    pub excluded: ModuleIndicators,
}

impl MinFareRuleLevelExcl {
    pub fn new(vendor: &str, rule_tariff: u16, seq_no: u32) -> Self {
        Self {
            vendor: vendor.to_string(),
            rule_tariff,
            seq_no,
            effective_date: open_effective(),
            discontinue_date: open_discontinue(),
            fare: FareQualifiers::default(),
            geo: GeoQualifier::default(),
            excluded: ModuleIndicators::default(),
        }
    }
}

/// Country of payment minimum: carriers bound by COP in a nation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopMinimum {
    pub nation: String,
    pub seq_no: u32,
    pub carrier: String,
    /// `Y` participating carriers of this carrier are bound as well
    #[serde(default)]
    pub participation_ind: Indicator,
    #[serde(default = "open_effective")]
    pub effective_date: NaiveDate,
    #[serde(default = "open_discontinue")]
    pub discontinue_date: NaiveDate,
}

/// Carrier participating in another carrier's COP filing for a nation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopParticipatingNation {
    pub nation: String,
    pub carrier: String,
    pub participating_carrier: String,
    #[serde(default = "open_effective")]
    pub effective_date: NaiveDate,
    #[serde(default = "open_discontinue")]
    pub discontinue_date: NaiveDate,
}

impl_effective!(
    MinFareAppl,
    MinFareDefaultLogic,
    MinFareRuleLevelExcl,
    CopMinimum,
    CopParticipatingNation,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_indicators_get_set() {
        let ind = ModuleIndicators::default()
            .set(MinimumFareModule::Hip, Indicator::Yes)
            .set(MinimumFareModule::Ctm, Indicator::No);
        assert_eq!(ind.get(MinimumFareModule::Hip), Indicator::Yes);
        assert_eq!(ind.get(MinimumFareModule::Ctm), Indicator::No);
        assert!(ind.get(MinimumFareModule::Cop).is_blank());
        assert_eq!(ind.addressed_count(), 2);
        assert!(ind.get(MinimumFareModule::Ncj).is_blank());
    }

    #[test]
    fn test_effective_window() {
        let mut row = MinFareAppl::new("ATP", "BA", 100);
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(row.is_effective_on(day));

        row.discontinue_date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(!row.is_effective_on(day));
    }

    #[test]
    fn test_appl_row_deserializes_with_defaults() {
        let row: MinFareAppl = serde_json::from_str(
            r#"{"vendor":"ATP","gov_carrier":"BA","seq_no":10,"applies":{"hip":"Y","ctm":"N"}}"#,
        )
        .unwrap();
        assert!(row.apply_default_logic);
        assert_eq!(row.applies.get(MinimumFareModule::Hip), Indicator::Yes);
        assert_eq!(row.applies.get(MinimumFareModule::Ctm), Indicator::No);
        assert!(row.logic.hip.city_pair.from_inter);
        assert!(row.is_effective_on(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));
    }
}

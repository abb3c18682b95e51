use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::geo::{INDUSTRY_CARRIER, global_direction_for};
use crate::itinerary::{Loc, PaxTypeFare};
use crate::models::{CurrencyCode, GlobalDirection, Money};
use crate::tables::{
    CopMinimum, CopParticipatingNation, Effective, MinFareAppl, MinFareDefaultLogic,
    MinFareRuleLevelExcl,
};

/// Data access interface for the minimum fare subsystem
///
/// Table lookups are pre-filtered by vendor/carrier/tariff and by date;
/// the matchers apply the remaining field comparisons. The remaining methods
/// are the repricing, global direction and currency services the checks
/// consume as pure queries.
#[cfg_attr(test, mockall::automock)]
pub trait MinFareDataHandle: Send + Sync {
    /// Application rows for the governing carrier, then for any carrier,
    /// each group in sequence order
    fn min_fare_appl(&self, vendor: &str, gov_carrier: &str, date: NaiveDate)
    -> Vec<Arc<MinFareAppl>>;

    /// Default logic rows for the governing carrier, then for any carrier
    fn min_fare_default_logic(
        &self,
        vendor: &str,
        gov_carrier: &str,
        date: NaiveDate,
    ) -> Vec<Arc<MinFareDefaultLogic>>;

    /// Rule level exclusion rows for a vendor and rule tariff
    fn min_fare_rule_level_excl(
        &self,
        vendor: &str,
        rule_tariff: u16,
        date: NaiveDate,
    ) -> Vec<Arc<MinFareRuleLevelExcl>>;

    /// COP rows for the nation of payment
    fn cop_minimum(&self, nation: &str, date: NaiveDate) -> Vec<Arc<CopMinimum>>;

    /// Carriers participating in `carrier`'s COP filing for `nation`
    fn cop_participating_nation(
        &self,
        nation: &str,
        carrier: &str,
        date: NaiveDate,
    ) -> Vec<Arc<CopParticipatingNation>>;

    /// Published fares of `carrier` and of the industry between two cities,
    /// in either orientation
    fn published_fares(
        &self,
        board_city: &str,
        off_city: &str,
        carrier: &str,
        date: NaiveDate,
    ) -> Vec<Arc<PaxTypeFare>>;

    /// Global direction of travel through `points`
    fn global_direction(&self, points: &[Loc]) -> Option<GlobalDirection>;

    /// Convert `amount` into `to`
    fn convert(&self, amount: Money, to: CurrencyCode) -> Option<Money>;
}

/// Serializable content of an [`InMemoryDataHandle`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSet {
    pub appl: Vec<MinFareAppl>,
    pub default_logic: Vec<MinFareDefaultLogic>,
    pub rule_level_excl: Vec<MinFareRuleLevelExcl>,
    pub cop_minimum: Vec<CopMinimum>,
    pub cop_participating: Vec<CopParticipatingNation>,
    pub fares: Vec<PaxTypeFare>,
    /// Units of currency per NUC
    pub rates: HashMap<CurrencyCode, f64>,
}

/// In-memory implementation of MinFareDataHandle (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryDataHandle {
    appl: Vec<Arc<MinFareAppl>>,
    default_logic: Vec<Arc<MinFareDefaultLogic>>,
    rule_level_excl: Vec<Arc<MinFareRuleLevelExcl>>,
    cop_minimum: Vec<Arc<CopMinimum>>,
    cop_participating: Vec<Arc<CopParticipatingNation>>,
    fares: Vec<Arc<PaxTypeFare>>,
    rates: HashMap<CurrencyCode, f64>,
}

impl InMemoryDataHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appl(mut self, row: MinFareAppl) -> Self {
        self.appl.push(Arc::new(row));
        self
    }

    pub fn with_default_logic(mut self, row: MinFareDefaultLogic) -> Self {
        self.default_logic.push(Arc::new(row));
        self
    }

    pub fn with_rule_level_excl(mut self, row: MinFareRuleLevelExcl) -> Self {
        self.rule_level_excl.push(Arc::new(row));
        self
    }

    pub fn with_cop_minimum(mut self, row: CopMinimum) -> Self {
        self.cop_minimum.push(Arc::new(row));
        self
    }

    pub fn with_cop_participating(mut self, row: CopParticipatingNation) -> Self {
        self.cop_participating.push(Arc::new(row));
        self
    }

    pub fn with_fare(mut self, fare: PaxTypeFare) -> Self {
        self.fares.push(Arc::new(fare));
        self
    }

    pub fn with_fares(mut self, fares: impl IntoIterator<Item = PaxTypeFare>) -> Self {
        self.fares.extend(fares.into_iter().map(Arc::new));
        self
    }

    pub fn with_rate(mut self, currency: CurrencyCode, per_nuc: f64) -> Self {
        self.rates.insert(currency, per_nuc);
        self
    }

    fn rate(&self, currency: CurrencyCode) -> Option<f64> {
        if currency == CurrencyCode::NUC {
            return Some(1.0);
        }
        self.rates.get(&currency).copied().filter(|r| *r > 0.0)
    }
}

impl From<DataSet> for InMemoryDataHandle {
    fn from(data: DataSet) -> Self {
        Self {
            appl: data.appl.into_iter().map(Arc::new).collect(),
            default_logic: data.default_logic.into_iter().map(Arc::new).collect(),
            rule_level_excl: data.rule_level_excl.into_iter().map(Arc::new).collect(),
            cop_minimum: data.cop_minimum.into_iter().map(Arc::new).collect(),
            cop_participating: data.cop_participating.into_iter().map(Arc::new).collect(),
            fares: data.fares.into_iter().map(Arc::new).collect(),
            rates: data.rates,
        }
    }
}

/// Carrier-specific rows first, then rows for any carrier, each by sequence
fn carrier_ordered<T, F>(rows: &[Arc<T>], gov_carrier: &str, key: F) -> Vec<Arc<T>>
where
    F: Fn(&T) -> (&str, u32),
{
    let mut specific: Vec<Arc<T>> = rows
        .iter()
        .filter(|r| key(r.as_ref()).0 == gov_carrier)
        .cloned()
        .collect();
    let mut generic: Vec<Arc<T>> = rows
        .iter()
        .filter(|r| key(r.as_ref()).0.is_empty())
        .cloned()
        .collect();
    specific.sort_by_key(|r| key(r.as_ref()).1);
    generic.sort_by_key(|r| key(r.as_ref()).1);
    specific.extend(generic);
    specific
}

impl MinFareDataHandle for InMemoryDataHandle {
    fn min_fare_appl(
        &self,
        vendor: &str,
        gov_carrier: &str,
        date: NaiveDate,
    ) -> Vec<Arc<MinFareAppl>> {
        let rows: Vec<Arc<MinFareAppl>> = self
            .appl
            .iter()
            .filter(|r| r.vendor == vendor && r.is_effective_on(date))
            .cloned()
            .collect();
        carrier_ordered(&rows, gov_carrier, |r| (r.gov_carrier.as_str(), r.seq_no))
    }

    fn min_fare_default_logic(
        &self,
        vendor: &str,
        gov_carrier: &str,
        date: NaiveDate,
    ) -> Vec<Arc<MinFareDefaultLogic>> {
        let rows: Vec<Arc<MinFareDefaultLogic>> = self
            .default_logic
            .iter()
            .filter(|r| r.vendor == vendor && r.is_effective_on(date))
            .cloned()
            .collect();
        carrier_ordered(&rows, gov_carrier, |r| (r.gov_carrier.as_str(), r.seq_no))
    }

    fn min_fare_rule_level_excl(
        &self,
        vendor: &str,
        rule_tariff: u16,
        date: NaiveDate,
    ) -> Vec<Arc<MinFareRuleLevelExcl>> {
        let mut rows: Vec<Arc<MinFareRuleLevelExcl>> = self
            .rule_level_excl
            .iter()
            .filter(|r| {
                r.vendor == vendor && r.rule_tariff == rule_tariff && r.is_effective_on(date)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.seq_no);
        rows
    }

    fn cop_minimum(&self, nation: &str, date: NaiveDate) -> Vec<Arc<CopMinimum>> {
        let mut rows: Vec<Arc<CopMinimum>> = self
            .cop_minimum
            .iter()
            .filter(|r| r.nation == nation && r.is_effective_on(date))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.seq_no);
        rows
    }

    fn cop_participating_nation(
        &self,
        nation: &str,
        carrier: &str,
        date: NaiveDate,
    ) -> Vec<Arc<CopParticipatingNation>> {
        self.cop_participating
            .iter()
            .filter(|r| r.nation == nation && r.carrier == carrier && r.is_effective_on(date))
            .cloned()
            .collect()
    }

    fn published_fares(
        &self,
        board_city: &str,
        off_city: &str,
        carrier: &str,
        _date: NaiveDate,
    ) -> Vec<Arc<PaxTypeFare>> {
        self.fares
            .iter()
            .filter(|f| f.carrier == carrier || f.carrier == INDUSTRY_CARRIER)
            .filter(|f| {
                (f.market1 == board_city && f.market2 == off_city)
                    || (f.market1 == off_city && f.market2 == board_city)
            })
            .cloned()
            .collect()
    }

    fn global_direction(&self, points: &[Loc]) -> Option<GlobalDirection> {
        global_direction_for(points)
    }

    fn convert(&self, amount: Money, to: CurrencyCode) -> Option<Money> {
        if amount.currency == to {
            return Some(amount);
        }
        let from_rate = self.rate(amount.currency)?;
        let to_rate = self.rate(to)?;
        let value = amount.to_decimal() / from_rate * to_rate;
        Some(Money::from_decimal(value, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::MinFareAppl;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    #[test]
    fn test_appl_rows_carrier_specific_first() {
        let data = InMemoryDataHandle::new()
            .with_appl(MinFareAppl::new("ATP", "", 1))
            .with_appl(MinFareAppl::new("ATP", "BA", 20))
            .with_appl(MinFareAppl::new("ATP", "BA", 10))
            .with_appl(MinFareAppl::new("ATP", "LH", 5))
            .with_appl(MinFareAppl::new("SITA", "BA", 1));

        let rows = data.min_fare_appl("ATP", "BA", day());
        let seqs: Vec<(String, u32)> = rows
            .iter()
            .map(|r| (r.gov_carrier.clone(), r.seq_no))
            .collect();
        assert_eq!(
            seqs,
            vec![
                ("BA".to_string(), 10),
                ("BA".to_string(), 20),
                (String::new(), 1)
            ]
        );
    }

    #[test]
    fn test_published_fares_include_industry_and_reverse_market() {
        let data = InMemoryDataHandle::new()
            .with_fare(PaxTypeFare::new("BA", "NYC", "LON", "Y", 100))
            .with_fare(PaxTypeFare::new("YY", "LON", "NYC", "Y", 90))
            .with_fare(PaxTypeFare::new("AA", "LON", "NYC", "Y", 80))
            .with_fare(PaxTypeFare::new("BA", "LON", "PAR", "Y", 70));

        let fares = data.published_fares("LON", "NYC", "BA", day());
        assert_eq!(fares.len(), 2);
        assert!(fares.iter().any(|f| f.is_industry()));
    }

    #[test]
    fn test_convert_through_nuc() {
        let data = InMemoryDataHandle::new()
            .with_rate(CurrencyCode::USD, 1.0)
            .with_rate("GBP".parse().unwrap(), 0.8);

        let gbp = data
            .convert(Money::nuc(10_000), "GBP".parse().unwrap())
            .unwrap();
        assert_eq!(gbp.amount, 8_000);

        let back = data.convert(gbp, CurrencyCode::NUC).unwrap();
        assert_eq!(back.amount, 10_000);

        assert!(data.convert(Money::nuc(1), "JPY".parse().unwrap()).is_none());
    }
}

//! Memoization context of one minimum fare evaluation.
//!
//! Table rows are matched once per (travel range, module) and shared between
//! overlapping sub-ranges. Candidate fares are fetched once per market.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::itinerary::{PaxTypeFare, TravelSeg};
use crate::matchers::ConditionalMatch;
use crate::models::MinimumFareModule;
use crate::tables::{MinFareAppl, MinFareDefaultLogic, MinFareRuleLevelExcl, ModuleIndicators};

/// First and last segment orders of a travel range
pub type MapKey = (u16, u16);

/// Composite key of a travel range
pub fn get_map_key(segs: &[TravelSeg]) -> MapKey {
    match (segs.first(), segs.last()) {
        (Some(first), Some(last)) => (first.segment_order, last.segment_order),
        _ => (0, 0),
    }
}

/// Hash of every segment order in a travel range
pub fn travel_seg_hash(segs: &[TravelSeg]) -> u32 {
    segs.iter().fold(17u32, |hash, seg| {
        hash.wrapping_mul(31).wrapping_add(u32::from(seg.segment_order))
    })
}

/// Fare lookup key; the two cities are stored in sorted order since the
/// data handle returns both orientations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketKey {
    city1: String,
    city2: String,
    carrier: String,
}

impl MarketKey {
    pub fn new(board: &str, off: &str, carrier: &str) -> Self {
        let (city1, city2) = if board <= off { (board, off) } else { (off, board) };
        Self {
            city1: city1.to_string(),
            city2: city2.to_string(),
            carrier: carrier.to_string(),
        }
    }
}

/// Rows cached under one map key. A key may hold several rows, each
/// addressing a different set of modules.
#[derive(Debug)]
struct RowCache<T> {
    rows: HashMap<MapKey, Vec<ConditionalMatch<T>>>,
}

impl<T> Default for RowCache<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T> RowCache<T> {
    fn get<F>(
        &self,
        key: MapKey,
        module: MinimumFareModule,
        indicators: F,
    ) -> Option<ConditionalMatch<T>>
    where
        F: Fn(&T) -> &ModuleIndicators,
    {
        self.rows
            .get(&key)?
            .iter()
            .find(|m| !indicators(m.row.as_ref()).get(module).is_blank())
            .cloned()
    }

    fn insert(&mut self, key: MapKey, row: ConditionalMatch<T>) {
        self.rows.entry(key).or_default().push(row);
    }
}

#[derive(Debug, Default)]
pub struct MinFareCache {
    appl: RowCache<MinFareAppl>,
    default_logic: RowCache<MinFareDefaultLogic>,
    rule_level: RowCache<MinFareRuleLevelExcl>,
    normal_exempt: BTreeSet<u32>,
    fares: HashMap<MarketKey, Vec<Arc<PaxTypeFare>>>,
}

impl MinFareCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_appl(
        &self,
        key: MapKey,
        module: MinimumFareModule,
    ) -> Option<ConditionalMatch<MinFareAppl>> {
        self.appl.get(key, module, |row| &row.applies)
    }

    pub fn cache_appl(&mut self, key: MapKey, row: ConditionalMatch<MinFareAppl>) {
        self.appl.insert(key, row);
    }

    pub fn cached_default_logic(
        &self,
        key: MapKey,
        module: MinimumFareModule,
    ) -> Option<ConditionalMatch<MinFareDefaultLogic>> {
        self.default_logic.get(key, module, |row| &row.modules)
    }

    pub fn cache_default_logic(&mut self, key: MapKey, row: ConditionalMatch<MinFareDefaultLogic>) {
        self.default_logic.insert(key, row);
    }

    pub fn cached_rule_level(
        &self,
        key: MapKey,
        module: MinimumFareModule,
    ) -> Option<ConditionalMatch<MinFareRuleLevelExcl>> {
        self.rule_level.get(key, module, |row| &row.excluded)
    }

    pub fn cache_rule_level(&mut self, key: MapKey, row: ConditionalMatch<MinFareRuleLevelExcl>) {
        self.rule_level.insert(key, row);
    }

    pub fn is_normal_exempt(&self, hash: u32) -> bool {
        self.normal_exempt.contains(&hash)
    }

    pub fn mark_normal_exempt(&mut self, hash: u32) {
        self.normal_exempt.insert(hash);
    }

    pub fn fares(&self, key: &MarketKey) -> Option<&[Arc<PaxTypeFare>]> {
        self.fares.get(key).map(Vec::as_slice)
    }

    pub fn cache_fares(&mut self, key: MarketKey, fares: Vec<Arc<PaxTypeFare>>) {
        self.fares.insert(key, fares);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::Loc;
    use crate::models::Indicator;

    fn segs() -> Vec<TravelSeg> {
        let lon = Loc::new("LON", "GB", "2");
        let fra = Loc::new("FRA", "DE", "2");
        let bkk = Loc::new("BKK", "TH", "3");
        vec![
            TravelSeg::air(1, lon, fra.clone(), "LH"),
            TravelSeg::air(2, fra, bkk, "LH"),
        ]
    }

    #[test]
    fn test_map_key_uses_first_and_last_order() {
        let segs = segs();
        assert_eq!(get_map_key(&segs), (1, 2));
        assert_eq!(get_map_key(&segs[1..]), (2, 2));
        assert_eq!(get_map_key(&[]), (0, 0));
    }

    #[test]
    fn test_map_key_distinct_past_hundred_segments() {
        let lon = Loc::new("LON", "GB", "2");
        let fra = Loc::new("FRA", "DE", "2");
        let long = [
            TravelSeg::air(1, lon.clone(), fra.clone(), "LH"),
            TravelSeg::air(101, fra.clone(), lon.clone(), "LH"),
        ];
        let short = [
            TravelSeg::air(2, lon, fra.clone(), "LH"),
            TravelSeg::air(1, fra.clone(), fra, "LH"),
        ];
        assert_ne!(get_map_key(&long), get_map_key(&short));
    }

    #[test]
    fn test_travel_seg_hash_distinguishes_ranges() {
        let segs = segs();
        assert_ne!(travel_seg_hash(&segs), travel_seg_hash(&segs[..1]));
        assert_eq!(travel_seg_hash(&segs), travel_seg_hash(&segs.clone()));
    }

    #[test]
    fn test_market_key_ignores_orientation() {
        assert_eq!(MarketKey::new("LON", "BKK", "LH"), MarketKey::new("BKK", "LON", "LH"));
        assert_ne!(MarketKey::new("LON", "BKK", "LH"), MarketKey::new("LON", "BKK", "YY"));
    }

    #[test]
    fn test_cached_row_returned_only_for_addressed_module() {
        let mut cache = MinFareCache::new();
        let mut row = MinFareAppl::new("ATP", "LH", 1);
        row.applies = ModuleIndicators::default()
            .set(MinimumFareModule::Hip, Indicator::Yes)
            .set(MinimumFareModule::Bhc, Indicator::No);
        cache.cache_appl((1, 2), ConditionalMatch::new(Arc::new(row), false));

        assert!(cache.cached_appl((1, 2), MinimumFareModule::Hip).is_some());
        assert!(cache.cached_appl((1, 2), MinimumFareModule::Bhc).is_some());
        assert!(cache.cached_appl((1, 2), MinimumFareModule::Ctm).is_none());
        assert!(cache.cached_appl((2, 2), MinimumFareModule::Hip).is_none());
    }
}

//! Geography helpers: location matching, domestic groupings, governing
//! carrier and global direction derivation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};

use crate::itinerary::{Loc, TravelSeg};
use crate::models::GlobalDirection;

/// Nations priced as one domestic market with the United States
const US_CA: [&str; 2] = ["US", "CA"];
/// Nations priced as one domestic market in Scandinavia
const SCANDINAVIA: [&str; 3] = ["DK", "NO", "SE"];

/// Industry (any carrier) fare owner
pub const INDUSTRY_CARRIER: &str = "YY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocType {
    Area,
    SubArea,
    Nation,
    State,
    City,
}

/// Typed location reference used by table rows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocKey {
    pub loc_type: LocType,
    pub code: String,
}

impl LocKey {
    pub fn new(loc_type: LocType, code: impl Into<String>) -> Self {
        Self {
            loc_type,
            code: code.into(),
        }
    }

    pub fn nation(code: impl Into<String>) -> Self {
        Self::new(LocType::Nation, code)
    }

    pub fn area(code: impl Into<String>) -> Self {
        Self::new(LocType::Area, code)
    }

    pub fn city(code: impl Into<String>) -> Self {
        Self::new(LocType::City, code)
    }
}

/// Whether `loc` lies within the location described by `key`
pub fn is_in_loc(loc: &Loc, key: &LocKey) -> bool {
    match key.loc_type {
        LocType::Area => loc.area == key.code,
        LocType::SubArea => loc.sub_area == key.code,
        LocType::Nation => loc.nation == key.code,
        LocType::State => loc.state.as_deref() == Some(key.code.as_str()),
        LocType::City => loc.city == key.code || loc.code == key.code,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DomesticGroup {
    UsCa,
    Scandinavia,
}

fn domestic_group(nation: &str) -> Option<DomesticGroup> {
    if US_CA.contains(&nation) {
        Some(DomesticGroup::UsCa)
    } else if SCANDINAVIA.contains(&nation) {
        Some(DomesticGroup::Scandinavia)
    } else {
        None
    }
}

/// Whether travel between two locations is domestic: same nation, or both
/// inside the US/CA or Scandinavian groupings.
pub fn is_domestic(origin: &Loc, destination: &Loc) -> bool {
    if origin.nation == destination.nation {
        return true;
    }
    match domestic_group(&origin.nation) {
        Some(group) => domestic_group(&destination.nation) == Some(group),
        None => false,
    }
}

/// Whether every point of `segs` stays in the domestic grouping of the first
/// board point
pub fn is_domestic_segments(segs: &[TravelSeg]) -> bool {
    let Some(first) = segs.first() else {
        return false;
    };
    segs.iter().all(|seg| {
        is_domestic(&first.origin, &seg.origin) && is_domestic(&first.origin, &seg.destination)
    })
}

/// Governing carrier for a run of travel segments: the carrier of the first
/// air segment crossing an IATA area boundary, else of the first segment
/// crossing a national boundary, else of the first air segment.
pub fn governing_carrier(segs: &[TravelSeg]) -> Option<String> {
    let air = || segs.iter().filter(|s| s.is_air());

    air()
        .find(|s| s.origin.area != s.destination.area)
        .or_else(|| air().find(|s| s.origin.nation != s.destination.nation))
        .or_else(|| air().next())
        .and_then(|s| s.carrier.clone())
}

/// Derives a global direction from the IATA areas touched by `points`.
pub fn global_direction_for(points: &[Loc]) -> Option<GlobalDirection> {
    let areas: BTreeSet<&str> = points.iter().map(|p| p.area.as_str()).collect();
    let has = |a: &str| areas.contains(a);

    match (has("1"), has("2"), has("3")) {
        (true, false, false) => Some(GlobalDirection::Wh),
        (false, true, false) | (false, false, true) | (false, true, true) => {
            Some(GlobalDirection::Eh)
        }
        (true, true, false) => Some(GlobalDirection::At),
        (true, false, true) => Some(GlobalDirection::Pa),
        (true, true, true) => Some(GlobalDirection::Ap),
        (false, false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(code: &str, nation: &str, area: &str) -> Loc {
        Loc::new(code, nation, area)
    }

    #[test]
    fn test_is_in_loc_by_type() {
        let lon = loc("LON", "GB", "2");
        assert!(is_in_loc(&lon, &LocKey::nation("GB")));
        assert!(is_in_loc(&lon, &LocKey::area("2")));
        assert!(is_in_loc(&lon, &LocKey::city("LON")));
        assert!(!is_in_loc(&lon, &LocKey::nation("FR")));
        assert!(!is_in_loc(&lon, &LocKey::new(LocType::State, "NY")));
    }

    #[test]
    fn test_international_arunk_is_not_domestic() {
        let sha = loc("SHA", "CN", "3");
        let sgn = loc("SGN", "VN", "3");
        assert!(!is_domestic(&sha, &sgn));
    }

    #[test]
    fn test_same_country_arunk_is_domestic() {
        let sha = loc("SHA", "CN", "3");
        let bjs = loc("BJS", "CN", "3");
        assert!(is_domestic(&sha, &bjs));
    }

    #[test]
    fn test_domestic_groupings() {
        assert!(is_domestic(&loc("NYC", "US", "1"), &loc("YTO", "CA", "1")));
        assert!(is_domestic(&loc("CPH", "DK", "2"), &loc("OSL", "NO", "2")));
        assert!(!is_domestic(&loc("NYC", "US", "1"), &loc("OSL", "NO", "2")));
        assert!(!is_domestic(&loc("NYC", "US", "1"), &loc("MEX", "MX", "1")));
    }

    #[test]
    fn test_governing_carrier_prefers_area_crossing() {
        let segs = vec![
            TravelSeg::air(1, loc("FRA", "DE", "2"), loc("LON", "GB", "2"), "LH"),
            TravelSeg::air(2, loc("LON", "GB", "2"), loc("NYC", "US", "1"), "BA"),
        ];
        assert_eq!(governing_carrier(&segs).as_deref(), Some("BA"));
    }

    #[test]
    fn test_governing_carrier_falls_back_to_first_air() {
        let segs = vec![
            TravelSeg::arunk(1, loc("PAR", "FR", "2"), loc("NCE", "FR", "2")),
            TravelSeg::air(2, loc("NCE", "FR", "2"), loc("LYS", "FR", "2"), "AF"),
        ];
        assert_eq!(governing_carrier(&segs).as_deref(), Some("AF"));
    }

    #[test]
    fn test_global_direction_for_areas() {
        let nyc = loc("NYC", "US", "1");
        let lon = loc("LON", "GB", "2");
        let tyo = loc("TYO", "JP", "3");
        assert_eq!(
            global_direction_for(&[nyc.clone(), lon.clone()]),
            Some(GlobalDirection::At)
        );
        assert_eq!(
            global_direction_for(&[nyc.clone(), tyo.clone()]),
            Some(GlobalDirection::Pa)
        );
        assert_eq!(global_direction_for(&[lon, tyo]), Some(GlobalDirection::Eh));
        assert_eq!(global_direction_for(&[]), None);
    }
}

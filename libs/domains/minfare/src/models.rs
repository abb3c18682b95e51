use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// Minimum fare check modules
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MinimumFareModule {
    /// Higher Intermediate Point
    Hip,
    /// Circle Trip Minimum
    Ctm,
    /// Backhaul Check
    Bhc,
    /// Country of Origin Minimum
    Com,
    /// Country of Payment Minimum
    Cop,
    /// Circle/Pacific Minimum
    Cpm,
    /// Direct/Mileage Check
    Dmc,
    /// Other Sector Check
    Osc,
    /// Rearward Sector Check
    Rsc,
    /// Nigeria currency adjustment
    Ncj,
}

impl MinimumFareModule {
    /// Modules that also examine sub-ranges revisiting a city
    pub fn allows_retransit(self) -> bool {
        matches!(self, Self::Hip | Self::Bhc)
    }

    /// Modules that restrict intermediate city pairs by origin/destination nation
    pub fn checks_city_pair(self) -> bool {
        matches!(self, Self::Hip | Self::Bhc | Self::Ctm)
    }
}

/// Y/N/blank table indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Indicator {
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
    #[default]
    #[serde(rename = "")]
    Blank,
}

impl Indicator {
    pub fn is_blank(self) -> bool {
        matches!(self, Self::Blank)
    }

    pub fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    pub fn is_no(self) -> bool {
        matches!(self, Self::No)
    }

    /// Blank resolves to `default`
    pub fn or(self, default: bool) -> bool {
        match self {
            Self::Yes => true,
            Self::No => false,
            Self::Blank => default,
        }
    }
}

/// Cabin of service, declared from the highest class to the lowest.
///
/// The derived ordering therefore makes `Economy` the greatest known cabin.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CabinType {
    PremiumFirst,
    First,
    PremiumBusiness,
    Business,
    PremiumEconomy,
    #[default]
    Economy,
    Undefined,
    Unknown,
}

impl CabinType {
    const KNOWN: [CabinType; 6] = [
        CabinType::PremiumFirst,
        CabinType::First,
        CabinType::PremiumBusiness,
        CabinType::Business,
        CabinType::PremiumEconomy,
        CabinType::Economy,
    ];

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Undefined | Self::Unknown)
    }

    fn rank(self) -> Option<usize> {
        Self::KNOWN.iter().position(|c| *c == self)
    }

    /// Next better cabin, if any
    pub fn higher(self) -> Option<CabinType> {
        self.rank()
            .and_then(|r| r.checked_sub(1))
            .map(|r| Self::KNOWN[r])
    }

    /// Next lower cabin, if any
    pub fn lower(self) -> Option<CabinType> {
        self.rank().and_then(|r| Self::KNOWN.get(r + 1).copied())
    }
}

/// Passenger type status used during fare selection.
///
/// Ordered so that `Adult` is the highest status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaxTypeStatus {
    #[strum(serialize = "INF")]
    #[serde(rename = "INF")]
    Infant,
    #[strum(serialize = "CNN")]
    #[serde(rename = "CNN")]
    Child,
    #[default]
    #[strum(serialize = "ADT")]
    #[serde(rename = "ADT")]
    Adult,
}

impl PaxTypeStatus {
    /// Next status in the escalation chain INF -> CNN -> ADT
    pub fn escalate(self) -> Option<PaxTypeStatus> {
        match self {
            Self::Infant => Some(Self::Child),
            Self::Child => Some(Self::Adult),
            Self::Adult => None,
        }
    }
}

/// ATPCO global direction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum GlobalDirection {
    /// Western hemisphere
    Wh,
    /// Eastern hemisphere
    Eh,
    /// Atlantic
    At,
    /// Pacific
    Pa,
    /// Trans-Siberian
    Ts,
    /// Atlantic and Pacific
    Ap,
    /// Far East
    Fe,
    /// Russia
    Ru,
    /// North/Mid Pacific
    Pn,
    /// South Atlantic
    Sa,
}

/// Directionality of a published fare relative to its market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Directionality {
    /// Only from market1 to market2
    From,
    /// Only from market2 to market1
    To,
    #[default]
    Both,
}

/// One-way/round-trip tag of a published fare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OwRt {
    /// Tag 1: one way, may be doubled
    #[default]
    OneWayMayBeDoubled,
    /// Tag 2: round trip, may not be halved for one-way use
    RoundTripMayNotBeHalved,
    /// Tag 3: one way only
    OneWayMayNotBeDoubled,
}

impl OwRt {
    pub fn is_one_way(self) -> bool {
        matches!(self, Self::OneWayMayBeDoubled | Self::OneWayMayNotBeDoubled)
    }

    pub fn is_half_round_trip_usable(self) -> bool {
        matches!(self, Self::OneWayMayBeDoubled | Self::RoundTripMayNotBeHalved)
    }
}

/// Tariff category of a fare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TariffCategory {
    #[default]
    Public,
    Private,
}

/// Fare type group. Selection never crosses between the special and
/// promotional groups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FareTypeGroup {
    #[default]
    Normal,
    Special,
    Promotional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum PricingUnitType {
    #[default]
    OneWay,
    RoundTrip,
    CircleTrip,
    OpenJaw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum GeoTravelType {
    Domestic,
    Transborder,
    #[default]
    International,
    ForeignDomestic,
}

/// Direction in which a fare is selected for a sub-range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum FareDirection {
    /// Fare valid from the board point to the off point
    #[default]
    Outbound,
    /// Fare valid from the off point back to the board point
    Inbound,
}

/// Which fares are eligible for comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum EligibleFare {
    #[default]
    OneWay,
    HalfRoundTrip,
}

/// Sale/ticketing location relative to the journey origin country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SaleIndicator {
    Siti,
    Sito,
    Soti,
    Soto,
}

impl SaleIndicator {
    pub fn is_sold_outside(self) -> bool {
        matches!(self, Self::Soti | Self::Soto)
    }
}

/// ISO currency code (or NUC)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Neutral Unit of Construction
    pub const NUC: CurrencyCode = CurrencyCode(*b"NUC");
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");

    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase bytes are ever stored
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(format!("invalid currency code '{}'", s));
        }
        let mut code = [0u8; 3];
        for (dst, src) in code.iter_mut().zip(bytes) {
            *dst = src.to_ascii_uppercase();
        }
        Ok(Self(code))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::NUC
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self.as_str())
    }
}

/// Money representation with precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (hundredths for NUC)
    pub amount: i64,
    /// Currency
    pub currency: CurrencyCode,
    /// Number of decimal places (2 for NUC)
    #[serde(default = "default_decimal_places")]
    pub decimal_places: i32,
}

fn default_decimal_places() -> i32 {
    2
}

impl Money {
    /// Create a new Money value
    pub fn new(amount: i64, currency: CurrencyCode) -> Self {
        Self {
            amount,
            currency,
            decimal_places: 2,
        }
    }

    /// Amount in NUC hundredths
    pub fn nuc(amount: i64) -> Self {
        Self::new(amount, CurrencyCode::NUC)
    }

    pub fn zero(currency: CurrencyCode) -> Self {
        Self::new(0, currency)
    }

    /// Create Money from a decimal value (e.g. 1.99 NUC)
    pub fn from_decimal(value: f64, currency: CurrencyCode) -> Self {
        Self {
            amount: (value * 100.0).round() as i64,
            currency,
            decimal_places: 2,
        }
    }

    /// Convert to decimal value
    pub fn to_decimal(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.decimal_places)
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// `percent` of this amount, rounded to the smallest unit
    pub fn percent(&self, percent: f64) -> Self {
        Self {
            amount: (self.amount as f64 * percent / 100.0).round() as i64,
            ..*self
        }
    }

    /// Amount increased by a mileage surcharge percentage (5, 10, ... 25)
    pub fn with_surcharge(&self, surcharge_pct: u16) -> Self {
        if surcharge_pct == 0 {
            return *self;
        }
        self.percent(100.0 + f64::from(surcharge_pct))
    }

    pub fn max(self, other: Self) -> Self {
        if other.amount > self.amount { other } else { self }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::nuc(0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        debug_assert_eq!(self.currency, rhs.currency);
        Money {
            amount: self.amount + rhs.amount,
            ..self
        }
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        debug_assert_eq!(self.currency, rhs.currency);
        Money {
            amount: self.amount - rhs.amount,
            ..self
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.*} {}",
            self.decimal_places.max(0) as usize,
            self.to_decimal(),
            self.currency
        )
    }
}

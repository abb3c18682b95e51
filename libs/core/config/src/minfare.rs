use crate::{env_or_default, ConfigError, FromEnv};
use std::env;
use std::str::FromStr;

/// Minimum fare engine configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinFareConfig {
    /// Diagnostic number to collect (702, 709, 718, 719, 760, 765)
    pub diagnostic: Option<u16>,
    /// HIP compares special thru fares with special fares only
    pub special_hip_special_only: bool,
    /// HIP skips sub-ranges whose normal fare does not exceed the thru normal fare
    pub hip_normal_exempt: bool,
    /// Run CTM on round trip pricing units as well as circle trips
    pub ctm_on_round_trip: bool,
    /// Construct an intermediate fare from two fares when no direct fare exists
    pub construction: bool,
    /// Maximum number of break points tried when constructing a fare
    pub max_construction_points: usize,
}

impl Default for MinFareConfig {
    fn default() -> Self {
        Self {
            diagnostic: None,
            special_hip_special_only: false,
            hip_normal_exempt: true,
            ctm_on_round_trip: false,
            construction: true,
            max_construction_points: 5,
        }
    }
}

impl MinFareConfig {
    pub fn with_diagnostic(mut self, diagnostic: u16) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_or_default(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: format!("{}", e),
        })
}

impl FromEnv for MinFareConfig {
    /// Reads from environment variables with these defaults:
    /// - MINFARE_DIAGNOSTIC: unset (no diagnostic)
    /// - MINFARE_SPECIAL_HIP_SPECIAL_ONLY: false
    /// - MINFARE_HIP_NORMAL_EXEMPT: true
    /// - MINFARE_CTM_ON_ROUND_TRIP: false
    /// - MINFARE_CONSTRUCTION: true
    /// - MINFARE_MAX_CONSTRUCTION_POINTS: 5
    fn from_env() -> Result<Self, ConfigError> {
        let diagnostic = match env::var("MINFARE_DIAGNOSTIC") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.trim().parse().map_err(|e| ConfigError::ParseError {
                    key: "MINFARE_DIAGNOSTIC".to_string(),
                    details: format!("{}", e),
                })?)
            }
            _ => None,
        };

        Ok(Self {
            diagnostic,
            special_hip_special_only: parse_var("MINFARE_SPECIAL_HIP_SPECIAL_ONLY", "false")?,
            hip_normal_exempt: parse_var("MINFARE_HIP_NORMAL_EXEMPT", "true")?,
            ctm_on_round_trip: parse_var("MINFARE_CTM_ON_ROUND_TRIP", "false")?,
            construction: parse_var("MINFARE_CONSTRUCTION", "true")?,
            max_construction_points: parse_var("MINFARE_MAX_CONSTRUCTION_POINTS", "5")?,
        })
    }
}

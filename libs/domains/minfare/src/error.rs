use thiserror::Error;

use crate::models::MinimumFareModule;

/// Result type for minimum fare operations
pub type MinFareResult<T> = Result<T, MinFareError>;

/// Errors that can occur while applying minimum fare checks
///
/// Most failures inside a check degrade to "no plus-up" and are only logged.
/// The variants here are the ones that are surfaced to the caller.
#[derive(Debug, Error)]
pub enum MinFareError {
    /// Required table data is missing (e.g. no application row for a CTM thru fare)
    #[error("Minimum fare data missing for {module}: {details}")]
    MissingData {
        module: MinimumFareModule,
        details: String,
    },

    /// No global direction could be established for a repriced market
    #[error("No global direction for {board}-{off}")]
    NoGlobalDirection { board: String, off: String },

    /// Currency conversion failed
    #[error("Cannot convert {from} to {to}")]
    CurrencyConversion { from: String, to: String },

    /// The itinerary or fare path is inconsistent
    #[error("Invalid itinerary: {0}")]
    InvalidItinerary(String),
}

impl MinFareError {
    pub fn missing_data(module: MinimumFareModule, details: impl Into<String>) -> Self {
        Self::MissingData {
            module,
            details: details.into(),
        }
    }
}

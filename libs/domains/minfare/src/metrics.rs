//! Minimum fare metrics.

use metrics::{counter, histogram};
use std::time::Duration;

use crate::models::{MinimumFareModule, Money};

/// Minimum fare metrics recorder
pub struct MinFareMetrics;

impl MinFareMetrics {
    /// Record one module check over a pricing unit
    pub fn record_check(module: MinimumFareModule) {
        counter!("minfare_checks_total", "module" => module.to_string()).increment(1);
    }

    /// Record a posted plus-up
    pub fn record_plus_up(module: MinimumFareModule, amount: Money) {
        counter!("minfare_plus_ups_total", "module" => module.to_string()).increment(1);
        histogram!("minfare_plus_up_amount", "module" => module.to_string())
            .record(amount.to_decimal());

        tracing::debug!(
            module = %module,
            plus_up = %amount,
            "Recorded minimum fare plus-up"
        );
    }

    /// Record a sub-range for which no comparable fare was found
    pub fn record_selection_miss(module: MinimumFareModule) {
        counter!("minfare_selection_misses_total", "module" => module.to_string()).increment(1);
    }

    /// Record a missing table row that disabled a check
    pub fn record_missing_data(module: MinimumFareModule) {
        counter!("minfare_missing_data_total", "module" => module.to_string()).increment(1);
    }

    /// Record the duration of a full fare path evaluation
    pub fn record_fare_path(duration: Duration, pricing_units: usize) {
        histogram!("minfare_fare_path_duration_seconds").record(duration.as_secs_f64());
        histogram!("minfare_fare_path_pricing_units").record(pricing_units as f64);
    }
}

//! Scenario files: a pricing request, the table data and the fare path to
//! check, as one JSON document.

use std::path::Path;
use std::sync::Arc;

use core_config::minfare::MinFareConfig;
use domain_minfare::{DataSet, FarePath, InMemoryDataHandle, PricingRequest, PricingTrx};
use eyre::{Result, WrapErr};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub request: PricingRequest,
    #[serde(default)]
    pub data: DataSet,
    pub fare_path: FarePath,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .wrap_err_with(|| format!("Invalid scenario {}", path.display()))
    }

    /// Splits the scenario into a transaction and the fare path to price
    pub fn into_trx(self, config: MinFareConfig) -> (PricingTrx, FarePath) {
        let data = Arc::new(InMemoryDataHandle::from(self.data));
        (PricingTrx::new(self.request, data, config), self.fare_path)
    }
}

// src/entity/origin.rs
use serde::{Deserialize, Serialize};

use super::RecordMeta;

/// A supplier of juvenile shellfish and its growth, mortality and price figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOrigin {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: String,
    pub quality: String,
    pub price: u32,
    /// Expected mortality over the cycle, percent.
    pub mortality: u32,
    pub monthly_growth_rate: f64,
    pub monthly_mortality_rate: f64,
    pub price_per_unit: f64,
    pub price_per_bundle: u32,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

/// Fallback parameters for lots whose origin is not in `seedOrigins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSeedOriginParameters {
    pub id: String,
    pub monthly_growth_rate: f64,
    pub monthly_mortality_rate: f64,
    pub price_per_unit: f64,
    pub price_per_bundle: f64,
    /// Millimetres.
    pub initial_size: u32,
    pub description: String,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorConstants {
    pub id: String,
    pub shells_per_bundle: u32,
    pub default_bundles: u32,
    pub default_sector_size: u32,
    pub default_additional_costs: u32,
    /// Months.
    pub default_harvest_time: u32,
    pub default_expected_mortality: u32,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

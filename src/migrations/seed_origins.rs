use serde_json::Value;

use super::{Migration, MigrationContext, MigrationReport};
use crate::entity::{
    to_record, to_records, CalculatorConstants, DefaultSeedOriginParameters, RecordMeta,
    SeedOrigin,
};
use crate::error::Result;
use crate::storage::{merge_into, Document};

/// (id, code, name, description, quality, price, mortality, growth, monthly mortality, unit price)
type OriginRow = (&'static str, &'static str, &'static str, &'static str, &'static str, u32, u32, f64, f64, f64);

const ORIGINS: [OriginRow; 6] = [
    ("origin-001", "samanco", "Samanco", "Semillas de la zona de Samanco", "alta", 15, 15, 3.5, 1.5, 0.16),
    ("origin-002", "casma", "Casma", "Semillas de la zona de Casma", "media", 12, 20, 3.2, 2.0, 0.13),
    ("origin-003", "huarmey", "Huarmey", "Semillas premium de la zona de Huarmey", "premium", 18, 10, 4.0, 1.0, 0.19),
    ("origin-004", "supe", "Supe", "Semillas de la zona de Supe", "media", 14, 18, 3.3, 1.8, 0.15),
    ("origin-005", "laboratory", "Laboratorio", "Semillas producidas en laboratorio controlado", "premium", 20, 8, 4.2, 0.8, 0.21),
    ("origin-006", "natural", "Natural", "Semillas recolectadas del medio natural", "standard", 10, 25, 3.0, 2.5, 0.10),
];

fn origin(row: &OriginRow, meta: RecordMeta) -> SeedOrigin {
    let (id, code, name, description, quality, price, mortality, growth, monthly_mortality, unit) =
        *row;
    SeedOrigin {
        id: id.to_string(),
        code: code.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        quality: quality.to_string(),
        price,
        mortality,
        monthly_growth_rate: growth,
        monthly_mortality_rate: monthly_mortality,
        price_per_unit: unit,
        price_per_bundle: price,
        meta,
    }
}

/// Replaces `seedOrigins` with the six known origins and adds calculator constants.
pub struct SeedOrigins;

impl Migration for SeedOrigins {
    fn id(&self) -> &'static str {
        "0001_seed_origins"
    }

    fn description(&self) -> &'static str {
        "Seed origins with growth, mortality and pricing data; calculator constants"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let origins: Vec<SeedOrigin> = ORIGINS.iter().map(|row| origin(row, ctx.meta())).collect();
        let constants = CalculatorConstants {
            id: "calc-constants-001".to_string(),
            shells_per_bundle: 96,
            default_bundles: 50,
            default_sector_size: 1000,
            default_additional_costs: 500,
            default_harvest_time: 6,
            default_expected_mortality: 20,
            meta: ctx.meta(),
        };

        let names: Vec<&str> = origins.iter().map(|o| o.name.as_str()).collect();
        let report = MigrationReport::new(self.id())
            .with(format!("{} seed origins: {}", origins.len(), names.join(", ")))
            .with(format!(
                "calculator constants: {} shells per bundle",
                constants.shells_per_bundle
            ));

        doc.put_collection("seedOrigins", to_records(&origins)?);
        doc.put_collection("calculatorConstants", vec![to_record(&constants)?]);

        Ok(report)
    }
}

/// Fallback growth and price parameters for unknown origins.
pub struct DefaultSeedOriginParams;

impl Migration for DefaultSeedOriginParams {
    fn id(&self) -> &'static str {
        "0002_default_seed_origin_parameters"
    }

    fn description(&self) -> &'static str {
        "Default parameters used when a lot's seed origin is not defined"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let params = DefaultSeedOriginParameters {
            id: "default-seed-params-001".to_string(),
            monthly_growth_rate: 3.5,
            monthly_mortality_rate: 5.0,
            price_per_unit: 0.12,
            price_per_bundle: 11.52,
            initial_size: 12,
            description: "Parámetros por defecto para orígenes de semilla no definidos"
                .to_string(),
            meta: ctx.meta(),
        };

        let report = MigrationReport::new(self.id())
            .with(format!("monthly growth rate: {}", params.monthly_growth_rate))
            .with(format!("monthly mortality rate: {}%", params.monthly_mortality_rate))
            .with(format!("initial size: {}mm", params.initial_size));

        doc.put_collection("defaultSeedOriginParameters", vec![to_record(&params)?]);

        Ok(report)
    }
}

pub const LOCAL_SEED_ORIGIN_NAME: &str = "Semillero Local";

/// Adds "Semillero Local", or refreshes it in place when already present.
pub struct LocalSeedOrigin;

impl Migration for LocalSeedOrigin {
    fn id(&self) -> &'static str {
        "0003_local_seed_origin"
    }

    fn description(&self) -> &'static str {
        "Add the locally produced seed origin"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let local = to_record(&SeedOrigin {
            id: "origin-007".to_string(),
            code: "semillero_local".to_string(),
            name: LOCAL_SEED_ORIGIN_NAME.to_string(),
            description: "Semillas producidas localmente".to_string(),
            quality: "media".to_string(),
            price: 12,
            mortality: 15,
            monthly_growth_rate: 3.5,
            monthly_mortality_rate: 1.5,
            price_per_unit: 0.13,
            price_per_bundle: 12,
            meta: ctx.meta(),
        })?;

        let mut origins = doc.collection_or_empty("seedOrigins");
        let existing = origins
            .iter()
            .position(|o| o.get("name").and_then(Value::as_str) == Some(LOCAL_SEED_ORIGIN_NAME));

        let mut report = MigrationReport::new(self.id());
        match existing {
            Some(index) => {
                merge_into(&mut origins[index], local);
                report.note(format!("updated '{}'", LOCAL_SEED_ORIGIN_NAME));
            }
            None => {
                origins.push(local);
                report.note(format!("added '{}'", LOCAL_SEED_ORIGIN_NAME));
            }
        }
        report.note(format!("{} seed origins in total", origins.len()));

        doc.put_collection("seedOrigins", origins);
        Ok(report)
    }
}

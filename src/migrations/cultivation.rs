use rand::Rng;
use serde_json::Value;

use super::{Migration, MigrationContext, MigrationReport};
use crate::entity::{
    to_record, to_records, Battery, CultivationLine, HarvestSummary, LotSystem, SystemFloor,
    FLOORS_PER_SYSTEM, LINES_PER_BATTERY, SUSPENDED_CULTIVATION,
};
use crate::error::{ConchitasError, Result};
use crate::storage::Document;

const BATTERIES: [(char, &str); 5] = [
    ('A', "sector-001"),
    ('B', "sector-001"),
    ('C', "sector-001"),
    ('D', "sector-002"),
    ('E', "sector-002"),
];

/// Five batteries with ten fixed-capacity lines each.
pub struct BatteriesAndLines;

impl Migration for BatteriesAndLines {
    fn id(&self) -> &'static str {
        "0004_batteries_and_lines"
    }

    fn description(&self) -> &'static str {
        "Batteries A-E and ten cultivation lines per battery"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let batteries: Vec<Battery> = BATTERIES
            .iter()
            .map(|(letter, sector)| Battery::new(*letter, sector, ctx.now()))
            .collect();

        let mut lines = Vec::with_capacity(batteries.len() * LINES_PER_BATTERY as usize);
        for battery in &batteries {
            for n in 1..=LINES_PER_BATTERY {
                lines.push(CultivationLine::new(lines.len() + 1, battery, n, ctx.now()));
            }
        }

        let letters: Vec<&str> = batteries.iter().map(Battery::letter).collect();
        let report = MigrationReport::new(self.id())
            .with(format!("{} batteries: {}", batteries.len(), letters.join(", ")))
            .with(format!(
                "{} cultivation lines ({} per battery)",
                lines.len(),
                LINES_PER_BATTERY
            ));

        doc.put_collection("batteries", to_records(&batteries)?);
        doc.put_collection("cultivationLines", to_records(&lines)?);

        Ok(report)
    }
}

/// Systems per lot in the occupancy simulation.
const SIMULATED_SYSTEMS: u32 = 10;
const OCCUPANCY_RATE: f64 = 0.7;

/// Makes every lot harvest-eligible: suspended system, size of 80-99mm and a line.
pub struct HarvestReadiness;

impl HarvestReadiness {
    fn simulated_systems(ctx: &mut MigrationContext) -> Vec<LotSystem> {
        (1..=SIMULATED_SYSTEMS)
            .map(|system_number| LotSystem {
                system_number,
                floors: (1..=FLOORS_PER_SYSTEM)
                    .map(|floor_number| SystemFloor {
                        floor_number,
                        is_occupied: ctx.rng().gen_bool(OCCUPANCY_RATE),
                    })
                    .collect(),
            })
            .collect()
    }
}

impl Migration for HarvestReadiness {
    fn id(&self) -> &'static str {
        "0010_harvest_readiness"
    }

    fn description(&self) -> &'static str {
        "Assign lines and harvest sizes so lots can be planned for harvest"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        if !doc.has_collection("lots") {
            return Ok(MigrationReport::new(self.id()).with("no lots collection, nothing to update"));
        }

        let mut lots = doc.collection_or_empty("lots");
        let all_lines = doc.collection_or_empty("cultivationLines");

        if !lots.is_empty() && all_lines.is_empty() {
            return Err(ConchitasError::CollectionNotFound(
                "cultivationLines".to_string(),
            ));
        }
        // Only lines a lot can point back to take part in the rotation.
        let lines: Vec<Value> = all_lines
            .into_iter()
            .filter(|line| matches!(line.get("id"), Some(Value::String(_) | Value::Number(_))))
            .collect();
        if !lots.is_empty() && lines.is_empty() {
            return Err(ConchitasError::InvalidRecord(
                "no cultivation line has a string or numeric id".to_string(),
            ));
        }

        for (index, lot) in lots.iter_mut().enumerate() {
            let Value::Object(fields) = lot else {
                return Err(ConchitasError::InvalidRecord(format!(
                    "lots[{}] is not an object",
                    index
                )));
            };

            let average: u32 = 80 + ctx.rng().gen_range(0..20);
            fields.insert(
                "cultivationSystem".to_string(),
                Value::from(SUSPENDED_CULTIVATION),
            );
            fields.insert("averageSize".to_string(), Value::from(average));
            fields.insert("maxSize".to_string(), Value::from(average + 10));
            fields.insert("minSize".to_string(), Value::from(average - 10));

            let line = &lines[index % lines.len()];
            fields.insert(
                "lineName".to_string(),
                line.get("name").cloned().unwrap_or(Value::Null),
            );
            fields.insert(
                "lineId".to_string(),
                line.get("id").cloned().unwrap_or(Value::Null),
            );

            let systems = Self::simulated_systems(ctx);
            fields.insert("systems".to_string(), to_record(&systems)?);
        }

        let summary = HarvestSummary::from_lots(&lots);
        let mut report = MigrationReport::new(self.id());
        for line in summary.lines() {
            report.note(line);
        }

        doc.put_collection("lots", lots);
        Ok(report)
    }
}

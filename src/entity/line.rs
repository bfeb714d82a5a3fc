// src/entity/line.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordMeta;

pub const SYSTEMS_PER_LINE: u32 = 100;
pub const FLOORS_PER_SYSTEM: u32 = 10;
/// Fixed by construction; never recomputed from occupancy.
pub const LINE_TOTAL_CAPACITY: u32 = SYSTEMS_PER_LINE * FLOORS_PER_SYSTEM;
pub const LINES_PER_BATTERY: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battery {
    pub id: String,
    pub name: String,
    pub sector_id: String,
    pub capacity: u32,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Battery {
    /// `Battery::new('A', "sector-001", at)` yields `bat-A` / `Batería A`.
    pub fn new(letter: char, sector_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: format!("bat-{}", letter),
            name: format!("Batería {}", letter),
            sector_id: sector_id.to_string(),
            capacity: SYSTEMS_PER_LINE,
            meta: RecordMeta::new(at),
        }
    }

    /// The label after the first space of the name ("A" for "Batería A").
    pub fn letter(&self) -> &str {
        self.name
            .split_once(' ')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.name)
    }
}

pub fn line_code(letter: &str, n: u32) -> String {
    format!("{}-{}", letter, n)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CultivationLine {
    pub id: String,
    pub name: String,
    pub code: String,
    pub battery_id: String,
    pub sector_id: String,
    pub capacity: u32,
    pub systems: u32,
    pub floors_per_system: u32,
    pub total_capacity: u32,
    pub current_occupancy: u32,
    pub status: String,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl CultivationLine {
    /// Line `n` (1-based) of `battery`, stored as `line-<sequence>`.
    pub fn new(sequence: usize, battery: &Battery, n: u32, at: DateTime<Utc>) -> Self {
        let code = line_code(battery.letter(), n);
        Self {
            id: format!("line-{}", sequence),
            name: format!("Línea {}", code),
            code,
            battery_id: battery.id.clone(),
            sector_id: battery.sector_id.clone(),
            capacity: SYSTEMS_PER_LINE,
            systems: SYSTEMS_PER_LINE,
            floors_per_system: FLOORS_PER_SYSTEM,
            total_capacity: LINE_TOTAL_CAPACITY,
            current_occupancy: 0,
            status: "active".to_string(),
            meta: RecordMeta::new(at),
        }
    }

    pub fn capacity_consistent(&self) -> bool {
        self.total_capacity == self.systems * self.floors_per_system
    }
}

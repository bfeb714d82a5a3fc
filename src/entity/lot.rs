// src/entity/lot.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConchitasError, Result};

/// Minimum average shell size for a lot to be harvested.
pub const HARVEST_MIN_AVERAGE_SIZE_MM: f64 = 75.0;

/// The only cultivation system whose lots can be harvested.
pub const SUSPENDED_CULTIVATION: &str = "Cultivo suspendido";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LotStatus {
    Planned,
    #[default]
    Seeded,
    Growing,
    Ready,
    Harvested,
    Cancelled,
}

impl LotStatus {
    pub const ALL: [LotStatus; 6] = [
        LotStatus::Planned,
        LotStatus::Seeded,
        LotStatus::Growing,
        LotStatus::Ready,
        LotStatus::Harvested,
        LotStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, LotStatus::Harvested | LotStatus::Cancelled)
    }

    /// planned -> seeded -> growing -> ready -> harvested, and any
    /// non-terminal state may be cancelled.
    pub fn can_transition_to(self, next: LotStatus) -> bool {
        use LotStatus::*;
        match (self, next) {
            (Planned, Seeded) | (Seeded, Growing) | (Growing, Ready) | (Ready, Harvested) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn transition(self, next: LotStatus) -> Result<LotStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ConchitasError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LotStatus::Planned => write!(f, "planned"),
            LotStatus::Seeded => write!(f, "seeded"),
            LotStatus::Growing => write!(f, "growing"),
            LotStatus::Ready => write!(f, "ready"),
            LotStatus::Harvested => write!(f, "harvested"),
            LotStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for LotStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planned" => Ok(LotStatus::Planned),
            "seeded" => Ok(LotStatus::Seeded),
            "growing" => Ok(LotStatus::Growing),
            "ready" => Ok(LotStatus::Ready),
            "harvested" => Ok(LotStatus::Harvested),
            "cancelled" | "canceled" => Ok(LotStatus::Cancelled),
            _ => Err(format!("Invalid lot status: {}", s)),
        }
    }
}

/// One floor of a simulated lantern system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemFloor {
    pub floor_number: u32,
    pub is_occupied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSystem {
    pub system_number: u32,
    pub floors: Vec<SystemFloor>,
}

pub fn average_size(lot: &Value) -> Option<f64> {
    lot.get("averageSize").and_then(Value::as_f64)
}

pub fn meets_size_threshold(lot: &Value) -> bool {
    average_size(lot).is_some_and(|size| size >= HARVEST_MIN_AVERAGE_SIZE_MM)
}

fn has_line(lot: &Value) -> bool {
    !matches!(lot.get("lineId"), None | Some(Value::Null))
}

fn is_suspended(lot: &Value) -> bool {
    lot.get("cultivationSystem").and_then(Value::as_str) == Some(SUSPENDED_CULTIVATION)
}

/// A lot can be harvested once it is big enough, hangs in a suspended
/// system and is assigned to a cultivation line.
pub fn is_harvest_eligible(lot: &Value) -> bool {
    meets_size_threshold(lot) && is_suspended(lot) && has_line(lot)
}

/// Counts printed after a harvest-readiness pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestSummary {
    pub total: usize,
    pub at_or_above_threshold: usize,
    pub suspended: usize,
    pub with_line: usize,
    pub eligible: usize,
}

impl HarvestSummary {
    pub fn from_lots(lots: &[Value]) -> Self {
        Self {
            total: lots.len(),
            at_or_above_threshold: lots.iter().filter(|l| meets_size_threshold(l)).count(),
            suspended: lots.iter().filter(|l| is_suspended(l)).count(),
            with_line: lots.iter().filter(|l| has_line(l)).count(),
            eligible: lots.iter().filter(|l| is_harvest_eligible(l)).count(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("{} lots", self.total),
            format!(
                "{} lots with average size >= {}mm",
                self.at_or_above_threshold, HARVEST_MIN_AVERAGE_SIZE_MM
            ),
            format!("{} lots in '{}'", self.suspended, SUSPENDED_CULTIVATION),
            format!("{} lots assigned to a line", self.with_line),
            format!("{} lots eligible for harvest", self.eligible),
        ]
    }
}

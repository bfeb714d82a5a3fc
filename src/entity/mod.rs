mod invitation;
mod lifecycle;
mod line;
mod lookup;
mod lot;
mod origin;

pub use invitation::{InvestmentInvitation, InvitationStatus};
pub use lifecycle::{apply_status_change, expire_overdue, INVITATIONS, LOTS};
pub use line::{
    line_code, Battery, CultivationLine, FLOORS_PER_SYSTEM, LINES_PER_BATTERY,
    LINE_TOTAL_CAPACITY, SYSTEMS_PER_LINE,
};
pub use lookup::{strip_fields, ExpenseType, LookupRecord, PRESENTATION_FIELDS};
pub use lot::{
    average_size, is_harvest_eligible, meets_size_threshold, HarvestSummary, LotStatus,
    LotSystem, SystemFloor, HARVEST_MIN_AVERAGE_SIZE_MM, SUSPENDED_CULTIVATION,
};
pub use origin::{CalculatorConstants, DefaultSeedOriginParameters, SeedOrigin};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Bookkeeping fields carried by every seeded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub is_active: bool,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            is_active: true,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Serialize a typed entity into a plain document record.
pub fn to_record<T: Serialize>(entity: &T) -> Result<Value> {
    Ok(serde_json::to_value(entity)?)
}

pub fn to_records<T: Serialize>(entities: &[T]) -> Result<Vec<Value>> {
    entities.iter().map(to_record).collect()
}

/// Timestamps as `2025-09-20T10:00:00.000Z`, the format already present in documents.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            at: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => s.serialize_str(&super::format(at)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            raw.map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_meta_serializes_camel_case_millis() {
        let at = Utc.with_ymd_and_hms(2025, 9, 20, 10, 0, 0).unwrap();
        let value = to_record(&RecordMeta::new(at)).unwrap();

        assert_eq!(value["isActive"], true);
        assert_eq!(value["createdAt"], "2025-09-20T10:00:00.000Z");
        assert_eq!(value["updatedAt"], "2025-09-20T10:00:00.000Z");
    }

    #[test]
    fn test_record_meta_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let meta = RecordMeta::new(at);
        let parsed: RecordMeta = serde_json::from_value(to_record(&meta).unwrap()).unwrap();
        assert_eq!(parsed, meta);
    }
}

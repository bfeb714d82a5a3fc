// src/entity/lookup.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RecordMeta;

/// Styling keys that belong to the frontend, not the data store.
pub const PRESENTATION_FIELDS: [&str; 2] = ["color", "icon"];

/// A status or enum lookup row (lot statuses, priority levels, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRecord {
    pub id: String,
    pub code: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    /// Table-specific columns such as `days` for frequencies.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl LookupRecord {
    pub fn new(id: &str, code: &str, label: &str, meta: RecordMeta) -> Self {
        Self {
            id: id.to_string(),
            code: code.to_string(),
            label: label.to_string(),
            description: None,
            color: None,
            icon: None,
            order: None,
            extra: Map::new(),
            meta,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseType {
    pub id: String,
    pub category: String,
    pub code: String,
    pub name: String,
    pub default_amount: u32,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

/// Copy of `record` without the named top-level fields. Non-objects pass through.
pub fn strip_fields(record: &Value, fields: &[&str]) -> Value {
    match record {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !fields.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_builder_omits_unset_columns() {
        let record = LookupRecord::new("freq-001", "daily", "Diario", RecordMeta::new(Utc::now()))
            .extra("days", json!(1));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["days"], 1);
        assert!(value.get("color").is_none());
        assert!(value.get("order").is_none());
        assert_eq!(value["isActive"], true);
    }

    #[test]
    fn test_strip_fields_keeps_everything_else() {
        let record = json!({
            "id": "priority-001",
            "code": "low",
            "label": "Baja",
            "color": "bg-gray-100 text-gray-800",
            "icon": "x",
            "order": 1
        });
        let stripped = strip_fields(&record, &PRESENTATION_FIELDS);

        assert_eq!(
            stripped,
            json!({"id": "priority-001", "code": "low", "label": "Baja", "order": 1})
        );
    }

    #[test]
    fn test_strip_fields_passes_non_objects_through() {
        assert_eq!(strip_fields(&json!(3), &["color"]), json!(3));
    }
}

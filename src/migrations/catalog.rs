use serde_json::{json, Value};

use super::{stamped, Migration, MigrationContext, MigrationReport};
use crate::entity::RecordMeta;
use crate::error::Result;
use crate::storage::{id_matches, Document};

/// (id, code, name, order)
const BASE_PRESENTATIONS: [(&str, &str, &str, u32); 4] = [
    ("presentation-001", "fresh", "Fresco", 1),
    ("presentation-002", "frozen", "Congelado", 2),
    ("presentation-003", "halfShell", "Media Valva", 3),
    ("presentation-004", "processed", "Procesado", 4),
];

const PROJECTED_PRESENTATIONS: [(&str, &str, &str, u32); 4] = [
    ("presentation-005", "malla15kg", "Malla 15 Kg", 5),
    ("presentation-006", "balde10kg", "Balde 10 Kg", 6),
    ("presentation-007", "saco50kg", "Saco 50 Kg", 7),
    ("presentation-008", "tina200kg", "Tina 200 Kg", 8),
];

/// Size ranges offered by the projected presentations, in display order.
const PROJECTED_RANGES: [&str; 12] = [
    "10-20", "20-30", "30-40", "40-50", "50-60", "60-70", "70-80", "80-90", "90-100",
    "100-110", "110-120", "120+",
];

/// How many of [`PROJECTED_RANGES`] each projected presentation sells.
const PROJECTED_RANGE_COUNTS: [(&str, usize); 4] = [
    ("malla15kg", 12),
    ("balde10kg", 3),
    ("saco50kg", 2),
    ("tina200kg", 2),
];

/// First measure number used by the projected presentations.
const FIRST_PROJECTED_MEASURE: usize = 10;

fn presentation_records(
    rows: &[(&str, &str, &str, u32)],
    meta: &RecordMeta,
) -> Result<Vec<Value>> {
    rows.iter()
        .map(|(id, code, name, order)| {
            stamped(
                json!({"id": id, "code": code, "name": name, "editable": true, "order": order}),
                meta,
            )
        })
        .collect()
}

fn base_measures(meta: &RecordMeta) -> Result<Vec<Value>> {
    [
        json!({"id": "measure-001", "presentationCode": "fresh", "code": "small", "name": "Pequeña (60-70mm)", "pricePerKg": 18, "minSize": 60, "maxSize": 70, "order": 1}),
        json!({"id": "measure-002", "presentationCode": "fresh", "code": "medium", "name": "Mediana (70-80mm)", "pricePerKg": 22, "minSize": 70, "maxSize": 80, "order": 2}),
        json!({"id": "measure-003", "presentationCode": "fresh", "code": "large", "name": "Grande (80-90mm)", "pricePerKg": 25, "minSize": 80, "maxSize": 90, "order": 3}),
        json!({"id": "measure-004", "presentationCode": "frozen", "code": "pack10-20", "name": "10-20 piezas/kg", "pricePerKg": 25, "piecesPerKg": "10-20", "order": 1}),
        json!({"id": "measure-005", "presentationCode": "frozen", "code": "pack20-30", "name": "20-30 piezas/kg", "pricePerKg": 30, "piecesPerKg": "20-30", "order": 2}),
        json!({"id": "measure-006", "presentationCode": "halfShell", "code": "tray12", "name": "Bandeja 12 unid", "pricePerKg": 35, "unitsPerTray": 12, "order": 1}),
        json!({"id": "measure-007", "presentationCode": "halfShell", "code": "bulk", "name": "Granel/kg", "pricePerKg": 45, "order": 2}),
        json!({"id": "measure-008", "presentationCode": "processed", "code": "pulp500", "name": "Pulpa 500g", "pricePerKg": 56, "weight": 500, "unit": "g", "order": 1}),
        json!({"id": "measure-009", "presentationCode": "processed", "code": "pulp1000", "name": "Pulpa 1kg", "pricePerKg": 52, "weight": 1000, "unit": "g", "order": 2}),
    ]
    .into_iter()
    .map(|record| stamped(record, meta))
    .collect()
}

/// Unpriced size-range measures for the bulk presentations, numbered `measure-010` onward.
pub fn projected_measures(meta: &RecordMeta) -> Result<Vec<Value>> {
    let mut measures = Vec::new();
    for (presentation, count) in PROJECTED_RANGE_COUNTS {
        for (i, range) in PROJECTED_RANGES.iter().take(count).enumerate() {
            let id = format!("measure-{:03}", FIRST_PROJECTED_MEASURE + measures.len());
            measures.push(stamped(
                json!({
                    "id": id,
                    "presentationCode": presentation,
                    "code": range,
                    "name": range,
                    "pricePerKg": 0,
                    "order": i + 1
                }),
                meta,
            )?);
        }
    }
    Ok(measures)
}

/// Shell-count conversions, product presentations and their price per measure.
pub struct ConversionData;

impl Migration for ConversionData {
    fn id(&self) -> &'static str {
        "0012_conversion_data"
    }

    fn description(&self) -> &'static str {
        "Conversion rates, product presentations and presentation measures"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let m = ctx.meta();
        let rates = stamped(
            json!({
                "id": "conversion-rates-001",
                "conchitasPorKg": 111,
                "conchitasPorManojo": 96,
                "manojosPorMalla": 3,
                "conchitasPorMalla": 288,
                "kgPorMalla": 2.6
            }),
            &m,
        )?;
        let presentations = presentation_records(&BASE_PRESENTATIONS, &m)?;
        let measures = base_measures(&m)?;

        let report = MigrationReport::new(self.id())
            .with("1 conversion table")
            .with(format!("{} presentations", presentations.len()))
            .with(format!("{} presentation measures", measures.len()));

        doc.put_collection("conversionRates", vec![rates]);
        doc.put_collection("presentations", presentations);
        doc.put_collection("presentationMeasures", measures);
        Ok(report)
    }
}

/// Appends `records` whose id is not already in `name`. Returns how many were added.
fn append_missing(doc: &mut Document, name: &str, records: Vec<Value>) -> usize {
    let mut existing = doc.collection_or_empty(name);
    let before = existing.len();
    for record in records {
        let id = record.get("id").and_then(Value::as_str).unwrap_or_default();
        if !existing.iter().any(|r| id_matches(r, id)) {
            existing.push(record);
        }
    }
    let added = existing.len() - before;
    doc.put_collection(name, existing);
    added
}

/// Bulk presentations used by production projections.
pub struct ProjectedPresentations;

impl Migration for ProjectedPresentations {
    fn id(&self) -> &'static str {
        "0013_projected_presentations"
    }

    fn description(&self) -> &'static str {
        "Bulk presentations (malla, balde, saco, tina) and their size ranges"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let m = ctx.meta();
        let presentations = presentation_records(&PROJECTED_PRESENTATIONS, &m)?;
        let measures = projected_measures(&m)?;

        let added_presentations = append_missing(doc, "presentations", presentations);
        let added_measures = append_missing(doc, "presentationMeasures", measures);

        Ok(MigrationReport::new(self.id())
            .with(format!("{} presentations added", added_presentations))
            .with(format!("{} measures added", added_measures)))
    }
}

/// Measurement units, monitoring kinds and notification kinds.
pub struct OperationalCatalogs;

impl Migration for OperationalCatalogs {
    fn id(&self) -> &'static str {
        "0014_operational_catalogs"
    }

    fn description(&self) -> &'static str {
        "Measurement units, monitoring types and notification types"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let m = ctx.meta();

        let units: Vec<Value> = [
            ("unit-001", "kg", "Kilogramos", "kg", "weight", 1, true),
            ("unit-002", "ton", "Toneladas", "t", "weight", 1000, false),
            ("unit-003", "units", "Unidades", "u", "count", 1, true),
            ("unit-004", "millares", "Millares", "mil", "count", 1000, false),
            ("unit-005", "hectares", "Hectáreas", "ha", "area", 1, true),
        ]
        .iter()
        .map(|(id, code, name, symbol, kind, factor, is_base)| {
            stamped(
                json!({
                    "id": id,
                    "code": code,
                    "name": name,
                    "symbol": symbol,
                    "type": kind,
                    "conversionFactor": factor,
                    "isBase": is_base
                }),
                &m,
            )
        })
        .collect::<Result<_>>()?;

        let monitoring: Vec<Value> = [
            ("monitoring-001", "water_quality", "Calidad del Agua", "Parámetros de calidad del agua", "💧", &["temperature", "ph", "oxygen", "salinity"][..]),
            ("monitoring-002", "growth", "Crecimiento", "Mediciones de crecimiento", "📏", &["averageSize", "sizeDistribution"][..]),
            ("monitoring-003", "mortality", "Mortalidad", "Registro de mortalidad", "⚠️", &["mortalityCount", "mortalityRate"][..]),
            ("monitoring-004", "feeding", "Alimentación", "Control de alimentación", "🍽️", &["feedAmount", "feedFrequency"][..]),
        ]
        .iter()
        .map(|(id, code, name, description, icon, parameters)| {
            stamped(
                json!({
                    "id": id,
                    "code": code,
                    "name": name,
                    "description": description,
                    "icon": icon,
                    "parameters": parameters
                }),
                &m,
            )
        })
        .collect::<Result<_>>()?;

        let notifications: Vec<Value> = [
            ("notif-type-001", "harvest_reminder", "Recordatorio de Cosecha", "Notificaciones sobre cosechas próximas", "🎯", "high"),
            ("notif-type-002", "monitoring_alert", "Alerta de Monitoreo", "Alertas sobre parámetros fuera de rango", "⚠️", "critical"),
            ("notif-type-003", "investment_update", "Actualización de Inversión", "Notificaciones sobre inversiones", "💰", "medium"),
            ("notif-type-004", "system_info", "Información del Sistema", "Información general del sistema", "ℹ️", "low"),
        ]
        .iter()
        .map(|(id, code, name, description, icon, priority)| {
            stamped(
                json!({
                    "id": id,
                    "code": code,
                    "name": name,
                    "description": description,
                    "icon": icon,
                    "priority": priority
                }),
                &m,
            )
        })
        .collect::<Result<_>>()?;

        let mut report = MigrationReport::new(self.id());
        for (name, records) in [
            ("measurementUnits", units),
            ("monitoringTypes", monitoring),
            ("notificationTypes", notifications),
        ] {
            report.note(format!("{}: {} records", name, records.len()));
            doc.put_collection(name, records);
        }
        Ok(report)
    }
}

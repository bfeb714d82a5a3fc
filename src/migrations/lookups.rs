use serde_json::json;

use super::{Migration, MigrationContext, MigrationReport};
use crate::entity::{
    strip_fields, to_records, ExpenseType, LookupRecord, LotStatus, RecordMeta,
    PRESENTATION_FIELDS,
};
use crate::error::Result;
use crate::storage::Document;

pub struct InvestmentStatuses;

impl Migration for InvestmentStatuses {
    fn id(&self) -> &'static str {
        "0005_investment_statuses"
    }

    fn description(&self) -> &'static str {
        "Investment status lookup table"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let m = ctx.meta();
        let statuses = vec![
            LookupRecord::new("inv-status-001", "active", "Activa", m.clone())
                .color("bg-green-100 text-green-800")
                .icon("🟢")
                .order(1),
            LookupRecord::new("inv-status-002", "completed", "Completada", m.clone())
                .color("bg-blue-100 text-blue-800")
                .icon("✅")
                .order(2),
            LookupRecord::new("inv-status-003", "cancelled", "Cancelada", m)
                .color("bg-red-100 text-red-800")
                .icon("❌")
                .order(3),
        ];

        let report = MigrationReport::new(self.id())
            .with(format!("{} investment statuses", statuses.len()));
        doc.put_collection("investmentStatuses", to_records(&statuses)?);
        Ok(report)
    }
}

/// Label, description and display order for each lot lifecycle state.
fn lot_status_row(status: LotStatus) -> (&'static str, &'static str, &'static str, u32) {
    match status {
        LotStatus::Seeded => ("status-lot-001", "Sembrado", "Lote sembrado recientemente", 1),
        LotStatus::Growing => ("status-lot-002", "Crecimiento", "Lote en proceso de crecimiento", 2),
        LotStatus::Ready => ("status-lot-003", "Listo", "Lote listo para ser cosechado", 3),
        LotStatus::Harvested => ("status-lot-004", "Cosechado", "Lote ya cosechado", 4),
        LotStatus::Cancelled => ("status-lot-005", "Cancelado", "Lote cancelado por algún problema", 5),
        LotStatus::Planned => ("status-lot-006", "Planificado", "Lote planificado pero no iniciado", 0),
    }
}

pub struct LotStatuses;

impl Migration for LotStatuses {
    fn id(&self) -> &'static str {
        "0006_lot_statuses"
    }

    fn description(&self) -> &'static str {
        "Lot status lookup table matching the lot lifecycle"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let mut rows: Vec<(LotStatus, _)> = LotStatus::ALL
            .iter()
            .map(|s| (*s, lot_status_row(*s)))
            .collect();
        rows.sort_by_key(|(_, (id, ..))| *id);

        let statuses: Vec<LookupRecord> = rows
            .into_iter()
            .map(|(status, (id, label, description, order))| {
                LookupRecord::new(id, &status.to_string(), label, ctx.meta())
                    .description(description)
                    .order(order)
            })
            .collect();

        let codes: Vec<&str> = statuses.iter().map(|s| s.code.as_str()).collect();
        let report = MigrationReport::new(self.id())
            .with(format!("{} lot statuses: {}", statuses.len(), codes.join(", ")));
        doc.put_collection("lotStatuses", to_records(&statuses)?);
        Ok(report)
    }
}

fn expense_types(meta: &RecordMeta) -> Vec<ExpenseType> {
    let rows: [(&str, &str, &str, &str, u32); 14] = [
        ("exp-type-001", "operational", "vigilante_salary", "Sueldo de vigilante", 300),
        ("exp-type-002", "operational", "vigilante_maintenance", "Mantenimiento del vigilante", 300),
        ("exp-type-003", "operational", "waste_collection", "Pago de recojo por residuos", 0),
        ("exp-type-004", "harvest", "nets", "Mallas", 0),
        ("exp-type-005", "harvest", "plant_processing", "Planta (procesamiento)", 0),
        ("exp-type-006", "harvest", "divers", "Buzos", 0),
        ("exp-type-007", "harvest", "boats", "Embarcaciones", 0),
        ("exp-type-008", "harvest", "ice", "Hielo", 0),
        ("exp-type-009", "harvest", "net_labels", "Etiqueta para malla", 0),
        ("exp-type-010", "material", "buoys_national", "Boyas nacionales", 120),
        ("exp-type-011", "material", "buoys_imported", "Boyas importadas", 45),
        ("exp-type-012", "material", "lines", "Líneas", 0),
        ("exp-type-013", "material", "bottom_system", "Sistema de fondo", 0),
        ("exp-type-014", "material", "suspended_system", "Sistema suspendido", 0),
    ];
    rows.iter()
        .map(|(id, category, code, name, amount)| ExpenseType {
            id: id.to_string(),
            category: category.to_string(),
            code: code.to_string(),
            name: name.to_string(),
            default_amount: *amount,
            meta: meta.clone(),
        })
        .collect()
}

/// (id, code, label, icon, color)
type StyledRow = (&'static str, &'static str, &'static str, &'static str, &'static str);

fn styled(rows: &[StyledRow], meta: &RecordMeta) -> Vec<LookupRecord> {
    rows.iter()
        .map(|(id, code, label, icon, color)| {
            LookupRecord::new(id, code, label, meta.clone())
                .icon(icon)
                .color(color)
        })
        .collect()
}

const INVITATION_STATUSES: [(&str, &str, &str, &str, &str, &str, u32); 4] = [
    ("status-inv-001", "pending", "Pendiente", "Esperando respuesta del inversor", "bg-yellow-100 text-yellow-800", "⏳", 1),
    ("status-inv-002", "accepted", "Aceptada", "El inversor aceptó la invitación", "bg-green-100 text-green-800", "✅", 2),
    ("status-inv-003", "rejected", "Rechazada", "El inversor rechazó la invitación", "bg-red-100 text-red-800", "❌", 3),
    ("status-inv-004", "expired", "Expirada", "La invitación ha expirado", "bg-gray-100 text-gray-800", "⌛", 4),
];

const NOTIFICATION_TYPE_DETAILS: [StyledRow; 13] = [
    ("notif-detail-001", "distribution_received", "Retorno Distribuido", "💰", "bg-green-100 text-green-800"),
    ("notif-detail-002", "harvest_completed", "Cosecha Completada", "✅", "bg-green-100 text-green-800"),
    ("notif-detail-003", "harvest_upcoming", "Cosecha Próxima", "📅", "bg-yellow-100 text-yellow-800"),
    ("notif-detail-004", "investment_accepted", "Inversión Aceptada", "🤝", "bg-green-100 text-green-800"),
    ("notif-detail-005", "mortality_alert", "Alerta de Mortalidad", "⚠️", "bg-red-100 text-red-800"),
    ("notif-detail-006", "new_monitoring", "Nuevo Monitoreo", "📊", "bg-blue-100 text-blue-800"),
    ("notif-detail-007", "lot_status_change", "Cambio de Estado", "🔄", "bg-blue-100 text-blue-800"),
    ("notif-detail-008", "payment_received", "Pago Recibido", "💸", "bg-green-100 text-green-800"),
    ("notif-detail-009", "investment_invitation_received", "Invitación Recibida", "📩", "bg-blue-100 text-blue-800"),
    ("notif-detail-010", "investment_invitation_accepted", "Invitación Aceptada", "✅", "bg-green-100 text-green-800"),
    ("notif-detail-011", "investment_invitation_rejected", "Invitación Rechazada", "❌", "bg-red-100 text-red-800"),
    ("notif-detail-012", "investment_invitation_cancelled", "Invitación Cancelada", "🚫", "bg-gray-100 text-gray-800"),
    ("notif-detail-013", "system", "Sistema", "ℹ️", "bg-gray-100 text-gray-800"),
];

const EXPENSE_CATEGORIES: [StyledRow; 5] = [
    ("exp-cat-enum-001", "operational", "Operacional", "⚙️", "#3B82F6"),
    ("exp-cat-enum-002", "harvest", "Cosecha", "🎯", "#10B981"),
    ("exp-cat-enum-003", "material", "Material", "📦", "#F59E0B"),
    ("exp-cat-enum-004", "maintenance", "Mantenimiento", "🔧", "#8B5CF6"),
    ("exp-cat-enum-005", "other", "Otro", "📝", "#6B7280"),
];

const NOTIFICATION_STATUSES: [StyledRow; 3] = [
    ("notif-status-001", "unread", "No leído", "🔵", "bg-blue-100 text-blue-800"),
    ("notif-status-002", "read", "Leído", "⚪", "bg-gray-100 text-gray-800"),
    ("notif-status-003", "archived", "Archivado", "📂", "bg-gray-200 text-gray-600"),
];

/// Enum tables the frontend used to hardcode.
pub struct LookupTables;

impl Migration for LookupTables {
    fn id(&self) -> &'static str {
        "0007_lookup_tables"
    }

    fn description(&self) -> &'static str {
        "Invitation statuses, expense types, notification details, priorities, frequencies, entity types"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let m = ctx.meta();

        let invitation_statuses: Vec<LookupRecord> = INVITATION_STATUSES
            .iter()
            .map(|(id, code, label, description, color, icon, order)| {
                LookupRecord::new(id, code, label, m.clone())
                    .description(description)
                    .color(color)
                    .icon(icon)
                    .order(*order)
            })
            .collect();

        let priority_levels: Vec<LookupRecord> = [
            ("priority-001", "low", "Baja", "bg-gray-100 text-gray-800", 1),
            ("priority-002", "medium", "Media", "bg-blue-100 text-blue-800", 2),
            ("priority-003", "high", "Alta", "bg-yellow-100 text-yellow-800", 3),
            ("priority-004", "urgent", "Urgente", "bg-red-100 text-red-800", 4),
        ]
        .iter()
        .map(|(id, code, label, color, order)| {
            LookupRecord::new(id, code, label, m.clone())
                .color(color)
                .order(*order)
        })
        .collect();

        let frequencies: Vec<LookupRecord> = [
            ("freq-001", "daily", "Diario", 1),
            ("freq-002", "weekly", "Semanal", 7),
            ("freq-003", "monthly", "Mensual", 30),
            ("freq-004", "yearly", "Anual", 365),
        ]
        .iter()
        .map(|(id, code, label, days)| {
            LookupRecord::new(id, code, label, m.clone()).extra("days", json!(days))
        })
        .collect();

        let entity_types: Vec<LookupRecord> = [
            ("entity-001", "investment", "Inversión", "💰"),
            ("entity-002", "harvest", "Cosecha", "🎯"),
            ("entity-003", "lot", "Lote", "🌱"),
            ("entity-004", "distribution", "Distribución", "📊"),
            ("entity-005", "monitoring", "Monitoreo", "📈"),
        ]
        .iter()
        .map(|(id, code, label, icon)| LookupRecord::new(id, code, label, m.clone()).icon(icon))
        .collect();

        let expense_types = expense_types(&m);
        let notification_details = styled(&NOTIFICATION_TYPE_DETAILS, &m);
        let expense_categories = styled(&EXPENSE_CATEGORIES, &m);
        let notification_statuses = styled(&NOTIFICATION_STATUSES, &m);

        let mut report = MigrationReport::new(self.id());
        let tables: Vec<(&str, Vec<serde_json::Value>)> = vec![
            ("invitationStatuses", to_records(&invitation_statuses)?),
            ("expenseTypes", to_records(&expense_types)?),
            ("notificationTypeDetails", to_records(&notification_details)?),
            ("priorityLevels", to_records(&priority_levels)?),
            ("frequencies", to_records(&frequencies)?),
            ("entityTypes", to_records(&entity_types)?),
            ("expenseCategoryEnum", to_records(&expense_categories)?),
            ("notificationStatuses", to_records(&notification_statuses)?),
        ];

        let mut total = 0;
        for (name, records) in tables {
            report.note(format!("{}: {} records", name, records.len()));
            total += records.len();
            doc.put_collection(name, records);
        }
        report.note(format!("{} lookup records in total", total));

        Ok(report)
    }
}

/// Collections whose `color` and `icon` belong to the frontend.
const STYLED_COLLECTIONS: [&str; 7] = [
    "investmentStatuses",
    "invitationStatuses",
    "lotStatuses",
    "notificationTypeDetails",
    "notificationStatuses",
    "expenseCategoryEnum",
    "categories",
];

/// Removes presentation fields from lookup tables, leaving business data only.
pub struct StripPresentationFields;

impl Migration for StripPresentationFields {
    fn id(&self) -> &'static str {
        "0011_strip_presentation_fields"
    }

    fn description(&self) -> &'static str {
        "Remove color and icon fields from lookup tables"
    }

    fn apply(&self, doc: &mut Document, _ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let mut report = MigrationReport::new(self.id());

        let presentation: &'static [&'static str] = &PRESENTATION_FIELDS;
        let color_only: &'static [&'static str] = &["color"];
        let targets = STYLED_COLLECTIONS
            .iter()
            .map(|name| (*name, presentation))
            .chain(std::iter::once(("priorityLevels", color_only)));

        for (name, fields) in targets {
            let Some(records) = doc.collection(name) else {
                continue;
            };
            let stripped: Vec<_> = records.iter().map(|r| strip_fields(r, fields)).collect();
            report.note(format!("{}: {} records cleaned", name, stripped.len()));
            doc.put_collection(name, stripped);
        }

        if report.lines.is_empty() {
            report.note("no styled collections present");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::test_support::ctx;
    use serde_json::{json, Value};

    #[test]
    fn test_lot_statuses_cover_lifecycle() {
        let mut doc = Document::new();
        LotStatuses.apply(&mut doc, &mut ctx()).unwrap();

        let statuses = doc.collection("lotStatuses").unwrap();
        assert_eq!(statuses.len(), 6);
        assert_eq!(statuses[0]["id"], "status-lot-001");
        assert_eq!(statuses[0]["code"], "seeded");
        assert_eq!(statuses[5]["code"], "planned");
        assert_eq!(statuses[5]["order"], 0);
        for status in statuses {
            let code = status["code"].as_str().unwrap();
            assert!(code.parse::<LotStatus>().is_ok());
        }
    }

    #[test]
    fn test_lookup_tables_sizes() {
        let mut doc = Document::new();
        LookupTables.apply(&mut doc, &mut ctx()).unwrap();

        let expected = [
            ("invitationStatuses", 4),
            ("expenseTypes", 14),
            ("notificationTypeDetails", 13),
            ("priorityLevels", 4),
            ("frequencies", 4),
            ("entityTypes", 5),
            ("expenseCategoryEnum", 5),
            ("notificationStatuses", 3),
        ];
        for (name, len) in expected {
            assert_eq!(doc.collection(name).unwrap().len(), len, "{}", name);
        }
        assert_eq!(doc.collection("frequencies").unwrap()[3]["days"], 365);
        assert_eq!(doc.collection("expenseTypes").unwrap()[9]["defaultAmount"], 120);
    }

    fn styled_doc() -> Document {
        let mut doc = Document::new();
        InvestmentStatuses.apply(&mut doc, &mut ctx()).unwrap();
        LotStatuses.apply(&mut doc, &mut ctx()).unwrap();
        LookupTables.apply(&mut doc, &mut ctx()).unwrap();
        doc.put_collection(
            "categories",
            vec![json!({"id": "cat-1", "name": "Boyas", "color": "#fff", "icon": "x", "price": 3})],
        );
        doc
    }

    fn ids(records: &[Value]) -> Vec<Value> {
        records.iter().map(|r| r["id"].clone()).collect()
    }

    #[test]
    fn test_strip_keeps_records_and_ids() {
        let mut doc = styled_doc();
        let before = doc.clone();

        StripPresentationFields.apply(&mut doc, &mut ctx()).unwrap();

        for name in STYLED_COLLECTIONS.iter().chain(["priorityLevels"].iter()) {
            let old = before.collection(name).unwrap();
            let new = doc.collection(name).unwrap();
            assert_eq!(old.len(), new.len());
            assert_eq!(ids(old), ids(new));
            for (o, n) in old.iter().zip(new) {
                assert!(n.get("color").is_none());
                for (key, value) in n.as_object().unwrap() {
                    assert_eq!(&o[key], value, "{}.{} altered", name, key);
                }
            }
        }
    }

    #[test]
    fn test_priority_levels_only_lose_color() {
        let mut doc = Document::new();
        doc.put_collection(
            "priorityLevels",
            vec![json!({"id": "p", "code": "low", "color": "c", "icon": "i"})],
        );
        StripPresentationFields.apply(&mut doc, &mut ctx()).unwrap();

        let level = &doc.collection("priorityLevels").unwrap()[0];
        assert!(level.get("color").is_none());
        assert_eq!(level["icon"], "i");
    }

    #[test]
    fn test_strip_only_named_fields() {
        let mut doc = styled_doc();
        StripPresentationFields.apply(&mut doc, &mut ctx()).unwrap();

        let category = &doc.collection("categories").unwrap()[0];
        assert_eq!(category, &json!({"id": "cat-1", "name": "Boyas", "price": 3}));
        // Untouched collections.
        assert!(doc.collection("frequencies").unwrap()[0].get("days").is_some());
        for entity_type in doc.collection("entityTypes").unwrap() {
            assert!(entity_type["icon"].is_string());
        }
    }

    #[test]
    fn test_strip_is_idempotent_and_tolerates_missing_collections() {
        let mut doc = Document::new();
        let report = StripPresentationFields.apply(&mut doc, &mut ctx()).unwrap();
        assert_eq!(report.lines, vec!["no styled collections present"]);

        let mut doc = styled_doc();
        StripPresentationFields.apply(&mut doc, &mut ctx()).unwrap();
        let once = doc.clone();
        StripPresentationFields.apply(&mut doc, &mut ctx()).unwrap();
        assert_eq!(doc, once);
    }
}

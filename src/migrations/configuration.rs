use serde_json::{json, Value};

use super::{stamped, Migration, MigrationContext, MigrationReport};
use crate::entity::{iso_millis, RecordMeta};
use crate::error::Result;
use crate::storage::{id_matches, Document};

// Category rows carry no `color`/`icon`: 0011 already moved styling to the frontend.

/// (code, name)
const EXPENSE_CATEGORIES: [(&str, &str); 11] = [
    ("feed", "Alimentación"),
    ("maintenance", "Mantenimiento"),
    ("labor", "Mano de obra"),
    ("fuel", "Combustible"),
    ("equipment", "Equipamiento"),
    ("transport", "Transporte"),
    ("materials", "Materiales"),
    ("services", "Servicios"),
    ("taxes", "Impuestos"),
    ("insurance", "Seguros"),
    ("other", "Otros"),
];

/// (code, name, description)
const INVENTORY_CATEGORIES: [(&str, &str, &str); 4] = [
    ("materials", "Materiales", "Materiales de construcción y mantenimiento"),
    ("equipment", "Equipos", "Equipos y herramientas"),
    ("supplies", "Insumos", "Insumos y consumibles"),
    ("other", "Otros", "Otros elementos"),
];

/// (code, name, shortName, minSize, maxSize)
const SIZE_CATEGORIES: [(&str, &str, &str, u32, Option<u32>); 7] = [
    ("tiny", "Muy Pequeña", "XS", 0, Some(30)),
    ("small", "Pequeña", "S", 30, Some(40)),
    ("medium", "Mediana", "M", 40, Some(50)),
    ("large", "Grande", "L", 50, Some(60)),
    ("xlarge", "Extra Grande", "XL", 60, Some(70)),
    ("jumbo", "Jumbo", "XXL", 70, Some(80)),
    ("colossal", "Colosal", "XXXL", 80, None),
];

/// (code, name, defaultCost)
const HARVEST_COST_CATEGORIES: [(&str, &str, u32); 8] = [
    ("harvest_labor", "Mano de obra cosecha", 50),
    ("selection", "Selección", 30),
    ("packaging", "Embalaje", 15),
    ("ice", "Hielo", 20),
    ("harvest_transport", "Transporte cosecha", 25),
    ("storage", "Almacenamiento", 10),
    ("certifications", "Certificaciones", 15),
    ("harvest_other", "Otros costos", 10),
];

/// Size-category prices in PEN: (sizeCategory, pricePerKg, pricePerUnit).
const PRICES: [(&str, u32, f64); 7] = [
    ("tiny", 8, 0.08),
    ("small", 12, 0.12),
    ("medium", 18, 0.18),
    ("large", 25, 0.25),
    ("xlarge", 35, 0.35),
    ("jumbo", 45, 0.45),
    ("colossal", 60, 0.60),
];

pub fn categories(meta: &RecordMeta) -> Result<Vec<Value>> {
    let category = |prefix: &str, kind: &str, n: usize, mut body: Value, order: usize| {
        let mut record = json!({
            "id": format!("cat-{}-{:03}", prefix, n + 1),
            "type": kind
        });
        if let (Some(record), Some(body)) = (record.as_object_mut(), body.as_object_mut()) {
            record.append(body);
            record.insert("order".to_string(), json!(order));
        }
        stamped(record, meta)
    };

    let mut all = Vec::new();
    for (i, (code, name)) in EXPENSE_CATEGORIES.iter().enumerate() {
        all.push(category("expense", "expense", i, json!({"code": code, "name": name}), i + 1)?);
    }
    for (i, (code, name, description)) in INVENTORY_CATEGORIES.iter().enumerate() {
        let body = json!({"code": code, "name": name, "description": description});
        all.push(category("inventory", "inventory", i, body, i + 1)?);
    }
    for (i, (code, name, short, min, max)) in SIZE_CATEGORIES.iter().enumerate() {
        let body = json!({
            "code": code,
            "name": name,
            "shortName": short,
            "minSize": min,
            "maxSize": max
        });
        all.push(category("size", "size", i, body, i + 1)?);
    }
    for (i, (code, name, cost)) in HARVEST_COST_CATEGORIES.iter().enumerate() {
        let body = json!({"code": code, "name": name, "defaultCost": cost});
        all.push(category("harvest", "harvest_cost", i, body, i + 1)?);
    }
    Ok(all)
}

pub fn pricing(meta: &RecordMeta) -> Result<Vec<Value>> {
    PRICES
        .iter()
        .enumerate()
        .map(|(i, (size, per_kg, per_unit))| {
            let (_, name, short, ..) = SIZE_CATEGORIES
                .iter()
                .find(|(code, ..)| code == size)
                .copied()
                .unwrap_or((*size, "", "", 0, None));
            let record = json!({
                "id": format!("price-{:03}", i + 1),
                "sizeCategory": size,
                "sizeName": name,
                "sizeCode": short,
                "pricePerKg": per_kg,
                "pricePerUnit": per_unit,
                "currency": "PEN",
                "isActive": meta.is_active,
                "validFrom": iso_millis::format(&meta.created_at),
                "validUntil": null
            });
            stamped(record, meta)
        })
        .collect()
}

pub fn system_settings(meta: &RecordMeta) -> Value {
    let now = iso_millis::format(&meta.created_at);
    json!({
        "id": "settings-001",
        "businessName": "Cultivo de Conchas de Abanico",
        "businessType": "Maricultura",
        "location": "Piura - Sechura",
        "country": "Perú",
        "currency": "PEN",
        "currencySymbol": "S/",
        "dateFormat": "DD/MM/YYYY",
        "timeFormat": "24h",
        "timeZone": "America/Lima",
        "language": "es",

        "maxSectorsPerUser": 10,
        "maxHectaresPerSector": 10,
        "maxBatteriesPerSector": 26,
        "maxLinesPerBattery": 100,
        "maxSystemsPerLine": 100,
        "maxFloorsPerSystem": 10,

        // Percent, mm/month, mm, and seeds per system.
        "defaultMortalityRate": 15,
        "defaultGrowthRate": 5,
        "harvestMinSize": 50,
        "harvestOptimalSize": 65,
        "seedingDensityMin": 50,
        "seedingDensityMax": 200,
        "seedingDensityDefault": 100,

        "waterQuality": {
            "temperature": {
                "min": 18, "max": 28, "optimalMin": 22, "optimalMax": 25,
                "unit": "°C", "criticalLow": 16, "criticalHigh": 30
            },
            "ph": {
                "min": 7.5, "max": 8.5, "optimalMin": 7.8, "optimalMax": 8.2,
                "unit": "", "criticalLow": 7.0, "criticalHigh": 9.0
            },
            "salinity": {
                "min": 34, "max": 36, "optimalMin": 34.5, "optimalMax": 35.5,
                "unit": "ppt", "criticalLow": 32, "criticalHigh": 38
            },
            "oxygen": {
                "min": 5, "max": 8, "optimalMin": 6, "optimalMax": 7,
                "unit": "mg/L", "criticalLow": 4, "criticalHigh": 9
            }
        },

        "notificationSettings": {
            "pollingInterval": 30000,
            "maxNotifications": 100,
            "autoMarkAsReadAfter": 7,
            "enableEmailNotifications": false,
            "enablePushNotifications": false,
            "notificationTypes": [
                "harvest_reminder",
                "monitoring_alert",
                "low_stock",
                "investment_update",
                "system_maintenance",
                "quality_alert",
                "mortality_alert"
            ]
        },

        "reportSettings": {
            "defaultPeriod": "monthly",
            "availablePeriods": ["daily", "weekly", "monthly", "quarterly", "yearly", "custom"],
            "exportFormats": ["pdf", "excel", "csv"],
            "maxExportRows": 10000,
            "includeCharts": true,
            "includeSummary": true
        },

        "securitySettings": {
            "sessionTimeout": 3600000,
            "maxLoginAttempts": 5,
            "passwordMinLength": 6,
            "requirePasswordChange": false,
            "twoFactorEnabled": false
        },

        "version": "1.0.0",
        "lastUpdated": now,
        "createdAt": now,
        "updatedAt": now
    })
}

/// Absent, or present as an empty array.
fn is_unpopulated(doc: &Document, name: &str) -> bool {
    match doc.get(name) {
        None => true,
        Some(Value::Array(records)) => records.is_empty(),
        Some(_) => false,
    }
}

/// Fills the configuration collections that 0009 created empty.
pub struct ConfigurationData;

impl Migration for ConfigurationData {
    fn id(&self) -> &'static str {
        "0015_configuration_data"
    }

    fn description(&self) -> &'static str {
        "Categories, size pricing and system settings"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let m = ctx.meta();
        let tables = [
            ("categories", categories(&m)?),
            ("pricing", pricing(&m)?),
            ("systemSettings", vec![system_settings(&m)]),
        ];

        let mut report = MigrationReport::new(self.id());
        for (name, records) in tables {
            if is_unpopulated(doc, name) {
                report.note(format!("{}: {} records", name, records.len()));
                doc.put_collection(name, records);
            } else {
                report.note(format!("'{}' already populated, left unchanged", name));
            }
        }
        Ok(report)
    }
}

fn monitoring_page_config(meta: &RecordMeta) -> Value {
    let now = iso_millis::format(&meta.created_at);
    json!({
        "id": "monitoring-page-config",
        "title": "Monitoreo de Siembras",
        "subtitle": "Supervisa y rastrea el crecimiento de todas las siembras activas",
        "loadingMessage": "Cargando monitoreo...",
        "noDataTitle": "No hay siembras para monitorear",
        "noDataMessage": "Crea siembras en la sección de Siembras para comenzar el monitoreo y seguimiento.",
        "noDataIcon": "🔍",
        "tableTitle": "Tabla de Siembras por Sector",
        "tableSubtitle": "Haz clic en \"Ver Detalles\" para acceder al monitoreo detallado de cada lote",
        "fallbackTexts": {
            "sectorNotFound": "Sector no encontrado",
            "locationNotAvailable": "Ubicación no disponible",
            "noLocation": "Sin ubicación",
            "noMeasurements": "Sin mediciones",
            "initialQuantity": "inicial",
            "currentQuantity": "actual"
        },
        "currency": {"locale": "es-PE", "currency": "PEN"},
        "dateFormat": {"locale": "es-PE"},
        "createdAt": now,
        "updatedAt": now
    })
}

/// (statusCode, background class, text class)
const LOT_STATUS_COLORS: [(&str, &str, &str); 4] = [
    ("seeded", "bg-blue-100", "text-blue-800"),
    ("growing", "bg-green-100", "text-green-800"),
    ("ready", "bg-yellow-100", "text-yellow-800"),
    ("harvested", "bg-gray-100", "text-gray-800"),
];

/// (key, label, sortable)
const TABLE_HEADERS: [(&str, &str, bool); 7] = [
    ("lotInfo", "Información del Lote", false),
    ("entryDate", "Fecha Siembra", true),
    ("lines", "Líneas/Sistemas", false),
    ("quantity", "Cantidad", true),
    ("measurements", "Última Medición", false),
    ("status", "Estado", true),
    ("actions", "Acciones", false),
];

/// (key, title, subtitle, icon, color)
const STAT_CARDS: [(&str, &str, &str, &str, &str); 3] = [
    ("activeLots", "Siembras Activas", "En seguimiento", "🔍", "primary"),
    ("totalSpecimens", "Total Ejemplares", "En monitoreo", "🐚", "secondary"),
    ("sectorsWithLots", "Sectores con Siembras", "Activos", "🏭", "green"),
];

/// Texts, status colors, table headers and stat cards of the monitoring page.
pub struct MonitoringPageConfig;

impl Migration for MonitoringPageConfig {
    fn id(&self) -> &'static str {
        "0016_monitoring_page_config"
    }

    fn description(&self) -> &'static str {
        "Monitoring page texts, lot status colors, table headers and stat cards"
    }

    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let m = ctx.meta();
        let mut report = MigrationReport::new(self.id());

        // Page config: replace by id, or append.
        let config = monitoring_page_config(&m);
        let mut configs = doc.collection_or_empty("monitoringPageConfig");
        match configs
            .iter()
            .position(|c| id_matches(c, "monitoring-page-config"))
        {
            Some(index) => {
                configs[index] = config;
                report.note("monitoringPageConfig: replaced");
            }
            None => {
                configs.push(config);
                report.note("monitoringPageConfig: added");
            }
        }
        doc.put_collection("monitoringPageConfig", configs);

        // Status colors: keep existing ones, add missing status codes.
        let mut colors = doc.collection_or_empty("lotStatusColors");
        let mut added = 0;
        for (i, (status, bg, text)) in LOT_STATUS_COLORS.iter().enumerate() {
            if colors.iter().any(|c| c["statusCode"] == *status) {
                continue;
            }
            colors.push(stamped(
                json!({
                    "id": format!("lot-status-color-{}", i + 1),
                    "statusCode": status,
                    "colorClass": format!("{} {}", bg, text),
                    "bgColor": bg,
                    "textColor": text
                }),
                &m,
            )?);
            added += 1;
        }
        report.note(format!("lotStatusColors: {} added", added));
        doc.put_collection("lotStatusColors", colors);

        let headers = TABLE_HEADERS
            .iter()
            .enumerate()
            .map(|(i, (key, label, sortable))| {
                let record = json!({
                    "id": format!("header-{}", i + 1),
                    "key": key,
                    "label": label,
                    "sortable": sortable,
                    "width": "w-auto",
                    "order": i + 1
                });
                stamped(record, &m)
            })
            .collect::<Result<Vec<_>>>()?;

        let cards = STAT_CARDS
            .iter()
            .enumerate()
            .map(|(i, (key, title, subtitle, icon, color))| {
                let record = json!({
                    "id": format!("stat-card-{}", i + 1),
                    "key": key,
                    "title": title,
                    "subtitle": subtitle,
                    "icon": icon,
                    "color": color,
                    "order": i + 1
                });
                stamped(record, &m)
            })
            .collect::<Result<Vec<_>>>()?;

        report.note(format!("monitoringTableHeaders: {} records", headers.len()));
        report.note(format!("monitoringStatCards: {} records", cards.len()));
        doc.put_collection("monitoringTableHeaders", headers);
        doc.put_collection("monitoringStatCards", cards);
        Ok(report)
    }
}

use super::{Migration, MigrationContext, MigrationReport};
use crate::error::Result;
use crate::storage::Document;

const CONFIGURATION_COLLECTIONS: [&str; 3] = ["categories", "pricing", "systemSettings"];

/// Makes sure the configuration collections exist, without touching existing data.
pub struct ConfigurationCollections;

impl Migration for ConfigurationCollections {
    fn id(&self) -> &'static str {
        "0009_configuration_collections"
    }

    fn description(&self) -> &'static str {
        "Empty categories, pricing and systemSettings collections"
    }

    fn apply(&self, doc: &mut Document, _ctx: &mut MigrationContext) -> Result<MigrationReport> {
        let mut report = MigrationReport::new(self.id());
        for name in CONFIGURATION_COLLECTIONS {
            if doc.get(name).is_none() {
                doc.put_collection(name, Vec::new());
                report.note(format!("added '{}'", name));
            }
        }
        if report.lines.is_empty() {
            report.note("all configuration collections already present");
        }
        Ok(report)
    }
}

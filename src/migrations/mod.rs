//! Ordered, idempotent document migrations.
//!
//! Every change to the shape or seed data of the document is a
//! [`Migration`] with a stable id. The [`Migrator`] applies the built-in
//! migrations in registry order and records each applied id in the
//! document's `_migrations` collection, in the same save as the change
//! itself. A recorded migration is never applied again.

mod catalog;
mod collections;
mod configuration;
mod cultivation;
mod invitations;
mod lookups;
mod seed_origins;

pub use catalog::{projected_measures, ConversionData, OperationalCatalogs, ProjectedPresentations};
pub use collections::ConfigurationCollections;
pub use configuration::{ConfigurationData, MonitoringPageConfig};
pub use cultivation::{BatteriesAndLines, HarvestReadiness};
pub use invitations::{sample_invitations, InvestmentInvitations};
pub use lookups::{InvestmentStatuses, LookupTables, LotStatuses, StripPresentationFields};
pub use seed_origins::{DefaultSeedOriginParams, LocalSeedOrigin, SeedOrigins};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{iso_millis, to_record, RecordMeta};
use crate::error::{ConchitasError, Result};
use crate::storage::{merge_into, Document, DocumentStore, DocumentStoreExt};

/// Collection holding the migration log.
pub const MIGRATION_LOG: &str = "_migrations";

/// Clock and randomness handed to migrations.
pub struct MigrationContext {
    now: DateTime<Utc>,
    rng: StdRng,
}

impl MigrationContext {
    pub fn new() -> Self {
        Self {
            now: Utc::now(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed clock and seed, for reproducible runs.
    pub fn deterministic(now: DateTime<Utc>, seed: u64) -> Self {
        Self {
            now,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn meta(&self) -> RecordMeta {
        RecordMeta::new(self.now)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for MigrationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Literal seed record followed by the `isActive`/`createdAt`/`updatedAt` bookkeeping fields.
pub(crate) fn stamped(mut record: Value, meta: &RecordMeta) -> Result<Value> {
    merge_into(&mut record, to_record(meta)?);
    Ok(record)
}

/// Human-readable summary of what one migration changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub id: String,
    pub lines: Vec<String>,
}

impl MigrationReport {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn with(mut self, line: impl Into<String>) -> Self {
        self.note(line);
        self
    }
}

pub trait Migration: Send + Sync {
    /// Stable identifier, recorded in the migration log.
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Transform the document in memory. Errors abort the whole run before anything is saved.
    fn apply(&self, doc: &mut Document, ctx: &mut MigrationContext) -> Result<MigrationReport>;
}

/// One entry of the migration log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMigration {
    pub id: String,
    pub description: String,
    #[serde(with = "iso_millis")]
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub id: String,
    pub description: String,
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Apply to an in-memory copy and never save.
    pub dry_run: bool,
    /// Stop after this migration id (inclusive).
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub reports: Vec<MigrationReport>,
    pub dry_run: bool,
}

pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl Migrator {
    pub fn new(migrations: Vec<Box<dyn Migration>>) -> Self {
        Self { migrations }
    }

    /// The built-in migrations, in application order.
    pub fn builtin() -> Self {
        Self::new(vec![
            Box::new(SeedOrigins),
            Box::new(DefaultSeedOriginParams),
            Box::new(LocalSeedOrigin),
            Box::new(BatteriesAndLines),
            Box::new(InvestmentStatuses),
            Box::new(LotStatuses),
            Box::new(LookupTables),
            Box::new(InvestmentInvitations),
            Box::new(ConfigurationCollections),
            Box::new(HarvestReadiness),
            Box::new(StripPresentationFields),
            Box::new(ConversionData),
            Box::new(ProjectedPresentations),
            Box::new(OperationalCatalogs),
            Box::new(ConfigurationData),
            Box::new(MonitoringPageConfig),
        ])
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.migrations.iter().map(|m| m.id()).collect()
    }

    /// Entries of the migration log. Malformed entries are skipped.
    pub fn applied(doc: &Document) -> Vec<AppliedMigration> {
        doc.collection_or_empty(MIGRATION_LOG)
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()
    }

    pub fn status(&self, doc: &Document) -> Vec<MigrationStatus> {
        let applied = Self::applied(doc);
        self.migrations
            .iter()
            .map(|m| MigrationStatus {
                id: m.id().to_string(),
                description: m.description().to_string(),
                applied_at: applied
                    .iter()
                    .find(|a| a.id == m.id())
                    .map(|a| a.applied_at),
            })
            .collect()
    }

    /// Migrations not yet recorded in the log, up to and including `target`.
    pub fn pending(&self, doc: &Document, target: Option<&str>) -> Result<Vec<&dyn Migration>> {
        let end = match target {
            Some(target) => {
                self.migrations
                    .iter()
                    .position(|m| m.id() == target)
                    .ok_or_else(|| ConchitasError::UnknownMigration(target.to_string()))?
                    + 1
            }
            None => self.migrations.len(),
        };

        let applied = Self::applied(doc);
        Ok(self.migrations[..end]
            .iter()
            .filter(|m| !applied.iter().any(|a| a.id == m.id()))
            .map(|m| m.as_ref())
            .collect())
    }

    /// Apply pending migrations to `doc` and append them to the log.
    pub fn apply_pending(
        &self,
        doc: &mut Document,
        ctx: &mut MigrationContext,
        target: Option<&str>,
    ) -> Result<Vec<MigrationReport>> {
        let pending = self.pending(doc, target)?;
        let mut reports = Vec::with_capacity(pending.len());

        for migration in pending {
            tracing::info!(migration = migration.id(), "applying migration");
            let report = migration.apply(doc, ctx)?;

            let entry = AppliedMigration {
                id: migration.id().to_string(),
                description: migration.description().to_string(),
                applied_at: ctx.now(),
            };
            let mut log = doc.collection_or_empty(MIGRATION_LOG);
            log.push(serde_json::to_value(&entry)?);
            doc.put_collection(MIGRATION_LOG, log);

            reports.push(report);
        }

        Ok(reports)
    }

    /// Run pending migrations against a store in a single locked update.
    pub fn run<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        ctx: &mut MigrationContext,
        opts: &RunOptions,
    ) -> Result<RunOutcome> {
        let target = opts.target.as_deref();

        let reports = if opts.dry_run {
            let mut doc = store.load()?;
            self.apply_pending(&mut doc, ctx, target)?
        } else {
            store.update(|doc| self.apply_pending(doc, ctx, target))?
        };

        tracing::info!(
            applied = reports.len(),
            dry_run = opts.dry_run,
            store = %store.describe(),
            "migration run finished"
        );

        Ok(RunOutcome {
            reports,
            dry_run: opts.dry_run,
        })
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::builtin()
    }
}

use std::io;
use std::path::PathBuf;

use chrono::Utc;

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::entity::{expire_overdue, is_harvest_eligible, HarvestSummary, INVITATIONS};
use crate::error::{ConchitasError, Result};
use crate::maintenance::{
    comment_legacy_file, rewrite_imports, sweep, JsonKeyValueFile, LegacyFileOutcome,
    SweepOutcome,
};
use crate::migrations::{MigrationContext, Migrator, RunOptions};
use crate::server::{create_app, run_server, shutdown_on_ctrl_c, AppState};
use crate::storage::{is_internal, DocumentStore, DocumentStoreExt, JsonFileStore};

/// Fields tried, in order, to label a record in listings.
const LABEL_FIELDS: [&str; 6] = ["name", "title", "label", "code", "email", "status"];

fn open_store(db: Option<PathBuf>) -> Result<(Config, JsonFileStore)> {
    let config = Config::load(db)?;
    let store = JsonFileStore::open(&config.db)?;
    Ok((config, store))
}

fn record_label(record: &Value) -> String {
    LABEL_FIELDS
        .iter()
        .find_map(|field| record.get(field).and_then(Value::as_str))
        .unwrap_or("")
        .to_string()
}

fn record_id(record: &Value) -> String {
    match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}

pub fn handle_init(db: Option<PathBuf>) -> Result<()> {
    let config = Config::load(db)?;
    JsonFileStore::init(&config.db)?;
    println!("Initialized empty document at {}", config.db.display());
    println!("  Run 'conchitas migrate' to load seed data.");
    Ok(())
}

pub fn handle_migrate(db: Option<PathBuf>, dry_run: bool, to: Option<String>) -> Result<()> {
    let (_, store) = open_store(db)?;
    let migrator = Migrator::builtin();
    let mut ctx = MigrationContext::new();

    let outcome = migrator.run(&store, &mut ctx, &RunOptions { dry_run, target: to })?;

    if outcome.reports.is_empty() {
        println!("No pending migrations.");
        return Ok(());
    }

    for report in &outcome.reports {
        println!("{}", report.id);
        for line in &report.lines {
            println!("  {}", line);
        }
    }

    println!();
    if outcome.dry_run {
        println!(
            "Dry run: {} migration(s) would be applied. Nothing was saved.",
            outcome.reports.len()
        );
    } else {
        println!("Applied {} migration(s).", outcome.reports.len());
    }
    Ok(())
}

pub fn handle_migrate_status(db: Option<PathBuf>) -> Result<()> {
    let (_, store) = open_store(db)?;
    let doc = store.load()?;
    let statuses = Migrator::builtin().status(&doc);

    let pending = statuses.iter().filter(|s| s.applied_at.is_none()).count();
    println!("Migrations ({} pending):\n", pending);
    for status in statuses {
        match status.applied_at {
            Some(at) => println!(
                "  [x] {}  {} (applied {})",
                status.id,
                status.description,
                at.format("%Y-%m-%d %H:%M")
            ),
            None => println!("  [ ] {}  {}", status.id, status.description),
        }
    }
    Ok(())
}

pub fn handle_collections(db: Option<PathBuf>, json: bool) -> Result<()> {
    let (config, store) = open_store(db)?;
    let counts = store.load()?.counts();

    if json {
        #[derive(Serialize)]
        struct CollectionJson {
            name: String,
            count: Option<usize>,
        }

        let rows: Vec<CollectionJson> = counts
            .into_iter()
            .map(|(name, count)| CollectionJson { name, count })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if counts.is_empty() {
        println!("No collections in {}.", config.db.display());
    } else {
        println!("Collections in {}:\n", config.db.display());
        for (name, count) in counts {
            match count {
                Some(n) => println!("  {:<32} {:>5} records", name, n),
                None => println!("  {:<32}     - (not a collection)", name),
            }
        }
    }
    Ok(())
}

pub fn handle_list(db: Option<PathBuf>, collection: String, json: bool) -> Result<()> {
    let (_, store) = open_store(db)?;
    let doc = store.load()?;

    if is_internal(&collection) {
        return Err(ConchitasError::CollectionNotFound(collection));
    }
    let records = match doc.get(&collection) {
        None => return Err(ConchitasError::CollectionNotFound(collection)),
        Some(Value::Array(records)) => records,
        Some(_) => return Err(ConchitasError::NotACollection(collection)),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else if records.is_empty() {
        println!("No records in '{}'.", collection);
    } else {
        println!("{} ({} records):\n", collection, records.len());
        for record in records {
            println!("  {:<24} {}", record_id(record), record_label(record));
        }
    }
    Ok(())
}

pub fn handle_get(db: Option<PathBuf>, collection: String, id: String) -> Result<()> {
    let (_, store) = open_store(db)?;
    let doc = store.load()?;

    if is_internal(&collection) || doc.collection(&collection).is_none() {
        return Err(ConchitasError::CollectionNotFound(collection));
    }
    let record = doc
        .find_record(&collection, &id)
        .ok_or_else(|| ConchitasError::RecordNotFound {
            collection: collection.clone(),
            id: id.clone(),
        })?;

    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

pub fn handle_harvest_report(db: Option<PathBuf>, json: bool) -> Result<()> {
    let (_, store) = open_store(db)?;
    let lots = store.load()?.collection_or_empty("lots");
    let summary = HarvestSummary::from_lots(&lots);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Harvest readiness:\n");
    for line in summary.lines() {
        println!("  {}", line);
    }

    let eligible: Vec<String> = lots
        .iter()
        .filter(|lot| is_harvest_eligible(lot))
        .map(record_id)
        .collect();
    if !eligible.is_empty() {
        println!("\nEligible: {}", eligible.join(", "));
    }
    Ok(())
}

pub fn handle_expire_invitations(db: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let (_, store) = open_store(db)?;
    let now = Utc::now();

    let expired = if dry_run {
        let mut invitations = store.load()?.collection_or_empty(INVITATIONS);
        expire_overdue(&mut invitations, now)?
    } else {
        store.update(|doc| match doc.collection_mut(INVITATIONS) {
            Some(invitations) => expire_overdue(invitations, now),
            None => Ok(Vec::new()),
        })?
    };

    if expired.is_empty() {
        println!("No overdue invitations.");
        return Ok(());
    }
    for id in &expired {
        println!("  {} -> expired", id);
    }
    if dry_run {
        println!("\nDry run: {} invitation(s) would expire. Nothing was saved.", expired.len());
    } else {
        tracing::info!(count = expired.len(), "invitations expired");
        println!("\nExpired {} invitation(s).", expired.len());
    }
    Ok(())
}

pub fn handle_serve(db: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load(db)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let store = JsonFileStore::open(&config.db)?;
    let addr = config.socket_addr()?;
    tracing::info!(
        db = %store.describe(),
        environment = ?config.environment,
        "starting server"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let app = create_app(AppState::new(store, config));
        run_server(app, addr, shutdown_on_ctrl_c()).await
    })
}

pub fn handle_rewrite_imports(dir: PathBuf, dry_run: bool) -> Result<()> {
    let rewrites = rewrite_imports(&dir, dry_run)?;

    if rewrites.is_empty() {
        println!("No legacy store imports found under {}.", dir.display());
        return Ok(());
    }

    let verb = if dry_run { "Would update" } else { "Updated" };
    for rewrite in &rewrites {
        let shown = rewrite.path.strip_prefix(&dir).unwrap_or(&rewrite.path);
        println!("{}: {}", verb, shown.display());
        println!("  stores: {}", rewrite.stores.join(", "));
    }
    println!("\n{} file(s) {}.", rewrites.len(), if dry_run { "would change" } else { "changed" });
    Ok(())
}

pub fn handle_comment_legacy(files: Vec<PathBuf>) -> Result<()> {
    let total = files.len();
    let mut modified = 0;

    for file in files {
        match comment_legacy_file(&file)? {
            LegacyFileOutcome::Modified(path) => {
                modified += 1;
                println!("Modified:  {}", path.display());
            }
            LegacyFileOutcome::Unchanged(path) => println!("Unchanged: {}", path.display()),
            LegacyFileOutcome::Missing(path) => println!("Not found: {}", path.display()),
        }
    }

    println!("\nProcessed {} file(s), modified {}.", total, modified);
    Ok(())
}

pub fn handle_sweep_storage(file: PathBuf) -> Result<()> {
    let mut storage = JsonKeyValueFile::open(&file)?;

    match sweep(&mut storage) {
        SweepOutcome::AlreadyDone => println!("Cleanup already done for {}.", file.display()),
        SweepOutcome::Swept { removed } => {
            storage.save()?;
            for key in &removed {
                println!("  removed {}", key);
            }
            println!("Cleanup complete. {} item(s) removed.", removed.len());
        }
    }
    Ok(())
}

pub fn handle_drop(db: Option<PathBuf>, collection: String, force: bool) -> Result<()> {
    let (_, store) = open_store(db)?;

    let count = {
        let doc = store.load()?;
        if is_internal(&collection) || doc.get(&collection).is_none() {
            return Err(ConchitasError::CollectionNotFound(collection));
        }
        doc.collection(&collection).map(Vec::len)
    };

    // Confirm unless --force is used
    if !force {
        match count {
            Some(n) => eprint!("Drop collection '{}' with {} records? [y/N] ", collection, n),
            None => eprint!("Drop key '{}'? [y/N] ", collection),
        }

        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            eprintln!();
            return Err(ConchitasError::ConfirmationRequired(
                "Use --force to drop in non-interactive mode".to_string(),
            ));
        }
    }

    store.update(|doc| {
        doc.remove_collection(&collection)
            .map(|_| ())
            .ok_or_else(|| ConchitasError::CollectionNotFound(collection.clone()))
    })?;

    println!("Dropped '{}'.", collection);
    Ok(())
}

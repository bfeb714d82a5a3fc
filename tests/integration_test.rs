use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

fn conchitas_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_conchitas"));
    cmd.current_dir(dir)
        .env_remove("CONCHITAS_DB")
        .env_remove("NODE_ENV")
        .env_remove("PORT")
        .env_remove("HOST")
        .env("RUST_LOG", "warn");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    conchitas_cmd(dir).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn read_db(dir: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join("db.json")).unwrap()).unwrap()
}

fn migrated() -> TempDir {
    let tmp = TempDir::new().unwrap();
    assert!(run(tmp.path(), &["init"]).status.success());
    let output = run(tmp.path(), &["migrate"]);
    assert!(output.status.success(), "{}", stderr(&output));
    tmp
}

#[test]
fn test_init_creates_empty_document() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["init"]);

    assert!(output.status.success());
    assert_eq!(read_db(tmp.path()), json!({}));
}

#[test]
fn test_init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init"]);

    let output = run(tmp.path(), &["init"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
}

#[test]
fn test_commands_without_document_fail() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["collections"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("conchitas init"));
}

#[test]
fn test_db_flag_selects_document() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["--db", "data/farm.json", "init"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(tmp.path().join("data/farm.json").exists());
    assert!(!tmp.path().join("db.json").exists());
}

#[test]
fn test_migrate_seeds_reference_data() {
    let tmp = migrated();
    let db = read_db(tmp.path());

    assert_eq!(db["seedOrigins"].as_array().unwrap().len(), 7);
    assert_eq!(db["batteries"].as_array().unwrap().len(), 5);
    assert_eq!(db["cultivationLines"].as_array().unwrap().len(), 50);
    assert_eq!(db["investmentInvitations"].as_array().unwrap().len(), 3);
    assert_eq!(db["lotStatuses"].as_array().unwrap().len(), 6);
    assert_eq!(db["_migrations"].as_array().unwrap().len(), 16);
    assert_eq!(db["presentations"].as_array().unwrap().len(), 8);
    assert_eq!(db["presentationMeasures"].as_array().unwrap().len(), 28);
    assert_eq!(db["measurementUnits"].as_array().unwrap().len(), 5);
    assert_eq!(db["categories"].as_array().unwrap().len(), 30);
    assert_eq!(db["pricing"].as_array().unwrap().len(), 7);
    assert_eq!(db["monitoringTableHeaders"].as_array().unwrap().len(), 7);
    for status in db["investmentStatuses"].as_array().unwrap() {
        assert!(status.get("color").is_none());
        assert!(status.get("icon").is_none());
    }
}

#[test]
fn test_second_migrate_is_a_no_op() {
    let tmp = migrated();
    let before = fs::read_to_string(tmp.path().join("db.json")).unwrap();

    let output = run(tmp.path(), &["migrate"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No pending migrations"));
    assert_eq!(fs::read_to_string(tmp.path().join("db.json")).unwrap(), before);
}

#[test]
fn test_dry_run_leaves_file_untouched() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init"]);

    let output = run(tmp.path(), &["migrate", "--dry-run"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Nothing was saved"));
    assert_eq!(read_db(tmp.path()), json!({}));
}

#[test]
fn test_migrate_to_target_and_status() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init"]);

    let output = run(tmp.path(), &["migrate", "--to", "0004_batteries_and_lines"]);
    assert!(output.status.success());
    assert_eq!(read_db(tmp.path())["_migrations"].as_array().unwrap().len(), 4);

    let output = run(tmp.path(), &["migrate-status"]);
    let out = stdout(&output);
    assert!(out.contains("12 pending"));
    assert!(out.contains("[x] 0004_batteries_and_lines"));
    assert!(out.contains("[ ] 0005_investment_statuses"));

    let output = run(tmp.path(), &["migrate", "--to", "9999_nope"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown migration"));
}

#[test]
fn test_expire_invitations_marks_overdue_pending() {
    let tmp = migrated();

    let output = run(tmp.path(), &["expire-invitations", "--dry-run"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("invitation-001 -> expired"));
    assert_eq!(read_db(tmp.path())["investmentInvitations"][0]["status"], "pending");

    let output = run(tmp.path(), &["expire-invitations"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Expired 1 invitation(s)"));
    let db = read_db(tmp.path());
    assert_eq!(db["investmentInvitations"][0]["status"], "expired");
    assert!(db["investmentInvitations"][0]["responseDate"].is_string());
    assert_eq!(db["investmentInvitations"][1]["status"], "accepted");

    let output = run(tmp.path(), &["expire-invitations"]);
    assert!(stdout(&output).contains("No overdue invitations"));
}

#[test]
fn test_harvest_migration_makes_lots_eligible() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("db.json"),
        json!({
            "lots": [
                {"id": "lot-001", "averageSize": 40, "status": "growing"},
                {"id": "lot-002", "averageSize": 35, "status": "growing"}
            ]
        })
        .to_string(),
    )
    .unwrap();
    assert!(run(tmp.path(), &["migrate"]).status.success());

    let output = run(tmp.path(), &["harvest-report", "--json"]);
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["eligible"], 2);

    let db = read_db(tmp.path());
    assert_eq!(db["lots"][0]["lineId"], "line-1");
    assert_eq!(db["lots"][1]["lineId"], "line-2");
}

#[test]
fn test_collections_hides_migration_log() {
    let tmp = migrated();

    let output = run(tmp.path(), &["collections", "--json"]);
    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();

    assert!(names.contains(&"batteries"));
    assert!(!names.contains(&"_migrations"));
}

#[test]
fn test_list_and_get() {
    let tmp = migrated();

    let output = run(tmp.path(), &["list", "batteries"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Batería A"));

    let output = run(tmp.path(), &["get", "cultivationLines", "line-11"]);
    let line: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(line["code"], "B-1");

    let output = run(tmp.path(), &["get", "cultivationLines", "line-99"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Record not found"));

    let output = run(tmp.path(), &["list", "harvests"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Collection not found"));
}

#[test]
fn test_drop_requires_force_without_tty() {
    let tmp = migrated();

    let output = run(tmp.path(), &["drop", "pricing"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--force"));
    assert!(read_db(tmp.path()).get("pricing").is_some());

    let output = run(tmp.path(), &["drop", "pricing", "--force"]);
    assert!(output.status.success());
    assert!(read_db(tmp.path()).get("pricing").is_none());
}

#[test]
fn test_rewrite_imports_command() {
    let tmp = TempDir::new().unwrap();
    let pages = tmp.path().join("src/pages");
    fs::create_dir_all(&pages).unwrap();
    fs::write(
        pages.join("Dashboard.jsx"),
        "import { useAuthStore } from '../stores/authStore';\n",
    )
    .unwrap();

    let output = run(tmp.path(), &["rewrite-imports", "src"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("authStore"));
    assert_eq!(
        fs::read_to_string(pages.join("Dashboard.jsx")).unwrap(),
        "import { useAuthStore } from '../stores';\n"
    );
}

#[test]
fn test_comment_legacy_reports_missing_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Page.jsx"),
        "import { mockAPI } from '../mock/api';\n",
    )
    .unwrap();

    let output = run(tmp.path(), &["comment-legacy", "Page.jsx", "Missing.jsx"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Modified:  Page.jsx"));
    assert!(out.contains("Not found: Missing.jsx"));
}

#[test]
fn test_sweep_storage_runs_once() {
    let tmp = TempDir::new().unwrap();
    let dump = tmp.path().join("storage.json");
    fs::write(
        &dump,
        json!({"conchas-abanico:lots": "[]", "theme": "dark"}).to_string(),
    )
    .unwrap();

    let output = run(tmp.path(), &["sweep-storage", "storage.json"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("1 item(s) removed"));

    let output = run(tmp.path(), &["sweep-storage", "storage.json"]);
    assert!(stdout(&output).contains("already done"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&dump).unwrap()).unwrap();
    assert_eq!(saved, json!({"theme": "dark", "cleanup-done-v1": "true"}));
}

//! E2E tests for the dashboard and ticket CRUD.
//!
//! Every test signs in first, so the demo tickets (101-103) are seeded on
//! the first protected command unless the config disables it.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn td_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("td"));
    cmd.env("TICKETDESK_HOME", dir);
    cmd.env("TICKETDESK_LATENCY_MS", "0");
    cmd.env("TICKETDESK_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn signed_in_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    td_cmd(dir.path())
        .args(["register", "-u", "alice", "-p", "s3cret"])
        .assert()
        .success();
    td_cmd(dir.path())
        .args(["login", "-u", "alice", "-p", "s3cret"])
        .assert()
        .success();
    dir
}

fn json_stdout(dir: &Path, args: &[&str]) -> Value {
    let output = td_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

fn listed_ids(dir: &Path) -> Vec<u64> {
    json_stdout(dir, &["list"])
        .as_array()
        .expect("list --json should be an array")
        .iter()
        .map(|t| t["id"].as_u64().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[test]
fn dashboard_counts_demo_tickets() {
    let dir = signed_in_dir();
    let stats = json_stdout(dir.path(), &["dashboard"]);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["open"], 2);
    assert_eq!(stats["resolved"], 1);
    assert_eq!(stats["by_priority"]["high"], 1);
}

#[test]
fn dashboard_text_is_plain_counts() {
    let dir = signed_in_dir();
    td_cmd(dir.path())
        .args(["dashboard", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total:       3"));
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[test]
fn list_is_newest_first() {
    let dir = signed_in_dir();
    assert_eq!(listed_ids(dir.path()), vec![103, 102, 101]);
}

#[test]
fn list_filters_by_status() {
    let dir = signed_in_dir();
    let tickets = json_stdout(dir.path(), &["list", "--status", "in progress"]);
    let tickets = tickets.as_array().unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["status"], "in_progress");
}

#[test]
fn list_text_has_header_and_rows() {
    let dir = signed_in_dir();
    td_cmd(dir.path())
        .args(["list", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ID  STATUS  PRIORITY  TITLE\n103  closed"));
}

#[test]
fn create_applies_defaults_and_prepends() {
    let dir = signed_in_dir();
    let created = json_stdout(
        dir.path(),
        &["create", "--title", "  Printer offline  ", "--description", "Floor 3"],
    );
    let ticket = &created["ticket"];
    assert_eq!(ticket["id"], 104);
    assert_eq!(ticket["title"], "Printer offline");
    assert_eq!(ticket["status"], "open");
    assert_eq!(ticket["priority"], "medium");
    assert!(ticket["createdAt"].as_u64().is_some());
    assert_eq!(created["notice"]["message"], "Ticket created successfully!");

    assert_eq!(listed_ids(dir.path())[0], 104);
}

#[test]
fn create_with_blank_title_fails_without_change() {
    let dir = signed_in_dir();
    td_cmd(dir.path())
        .args(["create", "--title", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Title is required."));
    assert_eq!(listed_ids(dir.path()).len(), 3);
}

#[test]
fn update_changes_fields_but_not_created_at() {
    let dir = signed_in_dir();
    let before = json_stdout(dir.path(), &["show", "101"]);

    let updated = json_stdout(
        dir.path(),
        &["update", "#101", "--status", "closed", "--clear-description"],
    );
    let ticket = &updated["ticket"];
    assert_eq!(ticket["status"], "closed");
    assert_eq!(ticket["priority"], before["priority"]);
    assert_eq!(ticket["title"], before["title"]);
    assert!(ticket.get("description").is_none_or(Value::is_null));
    assert_eq!(ticket["createdAt"], before["createdAt"]);
    assert_eq!(updated["notice"]["message"], "Ticket #101 updated.");
}

#[test]
fn delete_removes_exactly_one_ticket() {
    let dir = signed_in_dir();
    let deleted = json_stdout(dir.path(), &["delete", "102", "--force"]);
    assert_eq!(deleted["deleted"], true);
    assert_eq!(
        deleted["notice"]["message"],
        "Ticket #102 deleted successfully."
    );
    assert_eq!(listed_ids(dir.path()), vec![103, 101]);
}

#[test]
fn ids_are_not_reused_after_delete() {
    let dir = signed_in_dir();
    let first = json_stdout(dir.path(), &["create", "--title", "one"]);
    assert_eq!(first["ticket"]["id"], 104);
    json_stdout(dir.path(), &["delete", "104", "--force"]);

    let second = json_stdout(dir.path(), &["create", "--title", "two"]);
    assert_eq!(second["ticket"]["id"], 105);
}

#[test]
fn missing_ids_report_not_found() {
    let dir = signed_in_dir();
    for args in [
        vec!["show", "999"],
        vec!["update", "999", "--title", "x"],
        vec!["delete", "999", "--force"],
    ] {
        td_cmd(dir.path())
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Ticket #999 not found."));
    }
    assert_eq!(listed_ids(dir.path()), vec![103, 102, 101]);
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn config_can_disable_demo_seeding() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[tickets]\nseed_demo = false\n",
    )
    .unwrap();
    td_cmd(dir.path())
        .args(["register", "-u", "alice", "-p", "s3cret"])
        .assert()
        .success();
    td_cmd(dir.path())
        .args(["login", "-u", "alice", "-p", "s3cret"])
        .assert()
        .success();

    assert!(listed_ids(dir.path()).is_empty());
    let created = json_stdout(dir.path(), &["create", "--title", "first"]);
    assert_eq!(created["ticket"]["id"], 101);
}

#[test]
fn config_output_mode_applies_without_flags() {
    let dir = signed_in_dir();
    std::fs::write(dir.path().join("config.toml"), "output = \"json\"\n").unwrap();
    let output = td_cmd(dir.path()).arg("dashboard").output().unwrap();
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 3);
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[latency\n").unwrap();
    td_cmd(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

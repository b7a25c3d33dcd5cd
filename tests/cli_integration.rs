//! Tests of the `vulntriage` binary.

mod common;

use assert_cmd::Command;
use common::{write_temp_file, STORE_JSONL};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn vulntriage() -> Command {
    let mut cmd = Command::cargo_bin("vulntriage").expect("binary builds");
    cmd.env_remove("VULNTRIAGE_CONFIG").env_remove("VULNTRIAGE_LOG");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

#[test]
fn rank_prints_json_ranking() {
    let (dir, path) = write_temp_file("vulns.jsonl", STORE_JSONL);
    let value = json_stdout(
        vulntriage()
            .current_dir(dir.path())
            .args(["rank", "--format", "json", "--reference-date", "2025-06", "--top", "3"])
            .arg(&path),
    );
    let records = value["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["_id"], "v9");
    assert_eq!(records[0]["_class"], "critical");
    assert!(value["thresholds"]["t3"].is_number());
}

#[test]
fn batch_updates_store_unless_dry_run() {
    let (dir, path) = write_temp_file("vulns.jsonl", STORE_JSONL);

    vulntriage()
        .current_dir(dir.path())
        .args(["batch", "--dry-run", "--format", "json"])
        .arg(&path)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&path).unwrap(), STORE_JSONL);

    let summary = json_stdout(
        vulntriage()
            .current_dir(dir.path())
            .args(["batch", "--format", "json"])
            .arg(&path),
    );
    assert_eq!(summary["updated"], 10);
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("\"priority_class\"").count(), 10);
}

#[test]
fn score_rejects_document_without_identity() {
    let (dir, path) = write_temp_file("vulns.jsonl", STORE_JSONL);
    let doc = dir.path().join("doc.json");
    fs::write(&doc, r#"{"cvss": 9.1}"#).unwrap();

    vulntriage()
        .current_dir(dir.path())
        .arg("score")
        .arg(&path)
        .arg(&doc)
        .assert()
        .failure();
}

#[test]
fn triage_writes_markdown_to_file() {
    let (dir, path) = write_temp_file("vulns.jsonl", STORE_JSONL);
    let out = dir.path().join("triage.md");

    vulntriage()
        .current_dir(dir.path())
        .args(["triage", "--capacity", "4", "--format", "markdown", "--output"])
        .arg(&out)
        .arg(&path)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("# Triage Selection"));
    assert!(text.contains("| Suppressed | 1 |"));
    assert!(!text.contains('\u{1b}'));
}

#[test]
fn config_file_weights_apply() {
    let (dir, path) = write_temp_file("vulns.jsonl", STORE_JSONL);
    // Only the age feature counts: the oldest record ranks first
    fs::write(
        dir.path().join(".vulntriage.toml"),
        "[weights]\nseverity = 0\nexploit_probability = 0\ncriticality = 0\nage = 1\n\n[pipeline]\nreference_date = \"2025-06\"\n",
    )
    .unwrap();

    let value = json_stdout(
        vulntriage()
            .current_dir(dir.path())
            .args(["rank", "--format", "json"])
            .arg(&path),
    );
    assert_eq!(value["records"][0]["_id"], "v0");
}

#[test]
fn explicit_missing_config_fails() {
    let (dir, path) = write_temp_file("vulns.jsonl", STORE_JSONL);
    vulntriage()
        .current_dir(dir.path())
        .args(["rank", "--config", "absent.toml"])
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn init_creates_config_once() {
    let dir = TempDir::new().unwrap();
    vulntriage().current_dir(dir.path()).arg("init").assert().success();
    assert!(dir.path().join(".vulntriage.toml").exists());

    vulntriage().current_dir(dir.path()).arg("init").assert().failure();
    vulntriage()
        .current_dir(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

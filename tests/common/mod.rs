// Shared fixtures for vulntriage integration tests
#![allow(dead_code)]

use indoc::indoc;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use vulntriage::config::PipelineConfig;
use vulntriage::scoring::ReferenceMonth;
use vulntriage::Record;

/// Month every fixture is scored against, so age scores are stable
pub const REFERENCE: (i32, u32) = (2025, 6);

/// Ten vulnerabilities in JSON Lines; v9 is the clear outlier and v3 is
/// tagged "ok".
pub const STORE_JSONL: &str = indoc! {r#"
    {"_id": "v0", "name": "left-pad", "cve_id": "CVE-2021-0001", "cvss": 2.1, "epss": 0.01, "companyCriticality": 1, "date": "2019-03"}
    {"_id": "v1", "name": "tar", "cve_id": "CVE-2022-0002", "cvss": 3.4, "epss": 0.02, "companyCriticality": 2, "date": "2020-07"}
    {"_id": "v2", "name": "minimist", "cve_id": "CVE-2022-0003", "cvss": 4.0, "epss": 0.05, "companyCriticality": 3, "date": "2021-01"}
    {"_id": "v3", "name": "lodash", "cve_id": "CVE-2023-0004", "cvss": 5.3, "epss": 0.08, "companyCriticality": 4, "date": "2022-11", "tags": ["ok"]}
    {"_id": "v4", "name": "axios", "cve_id": "CVE-2023-0005", "cvss": 5.9, "epss": 0.10, "companyCriticality": 5, "date": "2023-02"}
    {"_id": "v5", "name": "express", "cve_id": "CVE-2024-0006", "cvss": 6.5, "epss": 0.15, "companyCriticality": 5, "date": "2023-08"}
    {"_id": "v6", "name": "openssl", "cve_id": "CVE-2024-0007", "cvss": 7.2, "epss": 0.22, "companyCriticality": 6, "date": "2024-01"}
    {"_id": "v7", "name": "log4j", "cve_id": "CVE-2024-0008", "cvss": 7.8, "epss": 0.30, "companyCriticality": 7, "date": "2024-06"}
    {"_id": "v8", "name": "struts", "cve_id": "CVE-2025-0009", "cvss": 8.1, "epss": 0.35, "companyCriticality": 7, "date": "2024-12"}
    {"_id": "v9", "name": "xz", "cve_id": "CVE-2025-0010", "cvss": 10.0, "epss": 0.97, "companyCriticality": 10, "date": "2025-05"}
"#};

pub fn reference() -> ReferenceMonth {
    ReferenceMonth::new(REFERENCE.0, REFERENCE.1)
}

pub fn pipeline() -> PipelineConfig {
    PipelineConfig::default().with_reference(reference())
}

pub fn population() -> Vec<Record> {
    vulntriage::io::parse_population(STORE_JSONL).expect("fixture parses")
}

/// One record per value of a single custom field `s`.
pub fn single_field_population(values: &[f64]) -> Vec<Record> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Record::new().with_field("_id", format!("r{i}")).with_field("s", json!(v)))
        .collect()
}

/// Write `contents` to `name` inside a fresh temp directory.
pub fn write_temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write fixture");
    (dir, path)
}

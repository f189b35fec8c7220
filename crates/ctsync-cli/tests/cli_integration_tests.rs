// Dweve CT Sync - Controlled Terminology Synchronization
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const FIXTURE: &str = include_str!("../../ctsync/tests/fixtures/sdtm_two_codelists.odm.xml");

fn ctsync_cmd() -> Command {
    Command::cargo_bin("ctsync").expect("Failed to find ctsync binary")
}

fn workspace() -> (TempDir, String, String) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("sdtm.odm.xml");
    fs::write(&source, FIXTURE).expect("Failed to write fixture");
    let store = dir.path().join("store.json");
    (
        dir,
        source.to_string_lossy().into_owned(),
        store.to_string_lossy().into_owned(),
    )
}

fn read_store(path: &str) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("store file")).expect("store json")
}

#[test]
fn test_help_output() {
    ctsync_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("controlled terminology"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_no_subcommand_fails() {
    ctsync_cmd().assert().failure();
}

#[test]
fn test_types_lists_all() {
    ctsync_cmd()
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("sdtm"))
        .stdout(predicate::str::contains("define-xml"))
        .stdout(predicate::str::contains("glossary"));
}

#[test]
fn test_sync_single_invocation() {
    let (_dir, source, store) = workspace();

    let output = ctsync_cmd()
        .args(["sync", "--type", "sdtm", "--source", &source, "--store", &store])
        .args(["--max-writes", "100"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let response: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["ok"], Value::Bool(true));
    assert_eq!(response["writes"], 12);
    assert_eq!(response["done"], Value::Bool(true));
    assert_eq!(response["version"], "2025-09-26");

    let snapshot = read_store(&store);
    assert_eq!(snapshot["terms"].as_object().unwrap().len(), 6);
    assert_eq!(snapshot["codelists"].as_object().unwrap().len(), 2);
    assert_eq!(snapshot["terms"]["sdtm__C66742__NA"]["decodeText"], "Not Applicable");
}

#[test]
fn test_sync_until_done_with_narrow_budget() {
    let (dir, source, store) = workspace();
    let config = dir.path().join("ctsync.toml");
    fs::write(&config, "[budget]\nmin = 2\n").unwrap();

    let output = ctsync_cmd()
        .args(["sync", "--type", "sdtm", "--source", &source, "--store", &store])
        .args(["--max-writes", "4", "--until-done", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let responses: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let writes: Vec<u64> = responses.iter().map(|r| r["writes"].as_u64().unwrap()).collect();
    assert_eq!(writes, vec![4, 4, 4, 0]);
    assert_eq!(responses.last().unwrap()["done"], Value::Bool(true));

    assert_eq!(read_store(&store)["terms"].as_object().unwrap().len(), 6);
}

#[test]
fn test_sync_resume_arguments() {
    let (_dir, source, store) = workspace();

    let output = ctsync_cmd()
        .args(["sync", "--type", "sdtm", "--source", &source, "--store", &store])
        .args(["--resume-group", "C66731", "--resume-leaf", "U"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let response: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["writes"], 6);
    let snapshot = read_store(&store);
    let terms = snapshot["terms"].as_object().unwrap();
    assert!(terms.keys().all(|key| key.starts_with("sdtm__C66742__")));
}

#[test]
fn test_resume_group_requires_leaf() {
    ctsync_cmd()
        .args(["sync", "--type", "sdtm", "--resume-group", "C66731"])
        .assert()
        .failure();
}

#[test]
fn test_unknown_type_fails() {
    ctsync_cmd()
        .args(["sync", "--type", "meddra"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown terminology type: meddra"));
}

#[test]
fn test_missing_source_fails() {
    let (dir, _source, store) = workspace();
    let missing = dir.path().join("missing.xml");

    ctsync_cmd()
        .args(["sync", "--type", "sdtm", "--store", &store, "--source"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_failed_sync_keeps_committed_batches() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("broken.xml");
    let store = dir.path().join("store.json");

    // 300 terms: the first 245 fill a 490-operation batch that commits before
    // the mismatched close tag is reached.
    let mut document = String::from(r#"<ODM FileOID="CT_2024-01-01"><CodeList ExtCodeID="C1">"#);
    for i in 0..300 {
        document.push_str(&format!(r#"<EnumeratedItem CodedValue="V{}"/>"#, i));
    }
    document.push_str("</Mismatched></CodeList></ODM>");
    fs::write(&source, document).unwrap();

    ctsync_cmd()
        .args(["sync", "--type", "sdtm", "--source"])
        .arg(&source)
        .arg("--store")
        .arg(&store)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    let snapshot = read_store(&store.to_string_lossy());
    assert_eq!(snapshot["terms"].as_object().unwrap().len(), 245);
    assert_eq!(snapshot["codelists"].as_object().unwrap().len(), 1);
}

#[test]
fn test_sniff_file() {
    let (_dir, source, _store) = workspace();

    ctsync_cmd()
        .args(["sniff", &source])
        .assert()
        .success()
        .stdout(predicate::str::diff("2025-09-26\n"));
}

#[test]
fn test_sniff_without_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.xml");
    fs::write(&path, "<ODM><CodeList/></ODM>").unwrap();

    ctsync_cmd()
        .arg("sniff")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::diff("unknown\n"));
}

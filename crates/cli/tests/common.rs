// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn lq() -> Command {
    let mut cmd = cargo_bin_cmd!("lq");
    cmd.env_remove("LQ_LOG").env("NO_COLOR", "1");
    cmd
}

/// Helper to create an initialized temp directory.
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    lq().arg("init").current_dir(temp.path()).assert().success();
    temp
}

/// Import JSON Lines into an initialized project.
pub fn seed(temp: &TempDir, lines: &[&str]) {
    let path = temp.path().join("seed.jsonl");
    std::fs::write(&path, lines.join("\n")).unwrap();
    lq().arg("import")
        .arg(&path)
        .current_dir(temp.path())
        .assert()
        .success();
}

pub fn issue(id: &str, issue_type: &str, priority: u8) -> String {
    format!(
        r#"{{"kind":"issue","id":"{id}","type":"{issue_type}","title":"Issue {id}","priority":{priority}}}"#
    )
}

pub fn blocked_by(issue: &str, blocker: &str) -> String {
    format!(r#"{{"kind":"relation","from":"{issue}","to":"{blocker}","relation":"blocked_by"}}"#)
}

/// Run a command and parse its stdout as JSON.
pub fn json(temp: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = lq()
        .args(args)
        .current_dir(temp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).unwrap()
}

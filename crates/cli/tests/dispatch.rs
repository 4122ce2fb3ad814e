// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;
use similar_asserts::assert_eq;

#[test]
fn empty_queue_is_success() {
    let temp = init_temp();

    lq().arg("next")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("No work available\n");

    lq().args(["next", "-o", "json"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn next_claims_highest_ranked() {
    let temp = init_temp();
    seed(&temp, &[&issue("task", "task", 2), &issue("sig", "signal", 1)]);

    lq().arg("next")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Claimed #2 sig [signal] urgent: Issue sig"))
        .stdout(predicate::str::contains("(no matching template)"));

    let task = json(&temp, &["next", "-o", "json"]);
    assert_eq!(task["issue"]["id"].as_str(), Some("task"));
    assert_eq!(task["issue"]["status"].as_str(), Some("in_progress"));
    assert!(task["prompt"].is_null());

    lq().arg("next")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("No work available\n");
}

#[test]
fn next_renders_matching_template() {
    let temp = init_temp();
    seed(
        &temp,
        &[
            &issue("sig", "signal", 1),
            r#"{"kind":"template","id":"t1","slug":"any","conditions":{},"specificity":1}"#,
            r#"{"kind":"version","id":"v1","template_id":"t1","version":1,"content":"generic"}"#,
            r#"{"kind":"promote","version_id":"v1"}"#,
            r#"{"kind":"template","id":"t3","slug":"signals","conditions":{"type":"signal"},"specificity":3}"#,
            r#"{"kind":"version","id":"v3","template_id":"t3","version":1,"content":"Triage {{ issue.title }} (#{{issue.number}})"}"#,
            r#"{"kind":"promote","version_id":"v3"}"#,
        ],
    );

    let task = json(&temp, &["next", "-o", "json"]);

    assert_eq!(task["prompt"].as_str(), Some("Triage Issue sig (#1)"));
    assert_eq!(task["meta"]["template_slug"].as_str(), Some("signals"));
    assert_eq!(task["meta"]["version_id"].as_str(), Some("v3"));
}

#[test]
fn queue_previews_without_claiming() {
    let temp = init_temp();
    seed(
        &temp,
        &[
            &issue("a", "task", 3),
            &issue("b", "hypothesis", 1),
            &issue("c", "task", 1),
            &blocked_by("c", "a"),
        ],
    );

    let preview = json(&temp, &["queue", "-o", "json"]);
    let ids: Vec<&str> = preview["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["issue"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(preview["total"].as_u64(), Some(2));
    assert_eq!(preview["items"][0]["breakdown"]["type_bonus"].as_i64(), Some(40));

    // Still claimable after preview.
    let task = json(&temp, &["next", "-o", "json"]);
    assert_eq!(task["issue"]["id"].as_str(), Some("b"));
}

#[test]
fn queue_text_paging() {
    let temp = init_temp();
    seed(
        &temp,
        &[&issue("a", "task", 1), &issue("b", "task", 2), &issue("c", "task", 3)],
    );

    lq().args(["queue", "--limit", "1", "--offset", "1"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("#2 b [task] high: Issue b"))
        .stdout(predicate::str::contains("Showing 2-2 of 3"))
        .stdout(predicate::str::contains("Issue a").not());
}

#[test]
fn complete_unblocks_dependent() {
    let temp = init_temp();
    seed(
        &temp,
        &[&issue("a", "task", 2), &issue("b", "task", 1), &blocked_by("b", "a")],
    );

    let claimed = json(&temp, &["next", "-o", "json"]);
    assert_eq!(claimed["issue"]["id"].as_str(), Some("a"));

    let report = json(&temp, &["complete", "a", "Fixed the thing", "-o", "json"]);
    assert_eq!(report["issue"]["status"].as_str(), Some("done"));
    assert_eq!(report["note"]["body"].as_str(), Some("Fixed the thing"));
    assert_eq!(report["note"]["author_kind"].as_str(), Some("agent"));
    assert_eq!(
        report["candidates_newly_unblocked"][0]["id"].as_str(),
        Some("b")
    );

    let next = json(&temp, &["next", "-o", "json"]);
    assert_eq!(next["issue"]["id"].as_str(), Some("b"));
}

#[test]
fn complete_text_lists_candidates() {
    let temp = init_temp();
    seed(
        &temp,
        &[&issue("a", "task", 2), &issue("b", "task", 1), &blocked_by("b", "a")],
    );

    lq().args(["complete", "a", "done"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed #1 a [task] high: Issue a"))
        .stdout(predicate::str::contains("May now be unblocked"))
        .stdout(predicate::str::contains("#2 b [task] urgent: Issue b"));
}

#[test]
fn complete_unknown_issue_fails() {
    let temp = init_temp();

    lq().args(["complete", "ghost", "done"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("issue not found: ghost"));
}

#[test]
fn project_filter_on_next() {
    let temp = init_temp();
    seed(
        &temp,
        &[
            r#"{"kind":"issue","id":"web-1","type":"task","title":"Web","priority":4,"project_id":"web"}"#,
            &issue("other", "signal", 1),
        ],
    );

    let task = json(&temp, &["next", "--project", "web", "-o", "json"]);
    assert_eq!(task["issue"]["id"].as_str(), Some("web-1"));
}

#[test]
fn scoring_config_changes_ranking() {
    let temp = init_temp();
    std::fs::write(
        temp.path().join(".loopq/config.toml"),
        "[scoring.types]\nmonitor = 500\n",
    )
    .unwrap();
    seed(&temp, &[&issue("sig", "signal", 1), &issue("mon", "monitor", 4)]);

    let task = json(&temp, &["next", "-o", "json"]);
    assert_eq!(task["issue"]["id"].as_str(), Some("mon"));
}

#[test]
fn debug_logging_goes_to_stderr() {
    let temp = init_temp();
    seed(&temp, &[&issue("a", "task", 2)]);

    lq().args(["next", "-o", "json"])
        .env("LQ_LOG", "lq_core=debug")
        .current_dir(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("claimed issue"));
}

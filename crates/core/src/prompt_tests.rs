// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::{Duration, TimeZone};
use serde_json::json;
use yare::parameterized;

use crate::graph::IssueGraph;
use crate::issue::{Priority, Status};
use crate::testing::{make_issue, TestContext};

fn issue() -> Issue {
    let mut issue = Issue::new(
        "iss-1".into(),
        IssueType::Signal,
        "Checkout errors spiking".into(),
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    );
    issue.number = 42;
    issue.priority = Priority::URGENT;
    issue.description = Some("500s on /checkout".into());
    issue.project_id = Some("proj-web".into());
    issue.signal_source = Some("sentry".into());
    issue.labels = vec!["frontend".into(), "payments".into()];
    issue
}

fn template(slug: &str, specificity: i64, conditions: serde_json::Value) -> PromptTemplate {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    PromptTemplate {
        id: format!("tpl-{slug}"),
        slug: slug.into(),
        name: slug.into(),
        conditions,
        specificity,
        active_version: Some(PromptVersion {
            id: format!("ver-{slug}"),
            template_id: format!("tpl-{slug}"),
            version: 1,
            content: format!("[{slug}] {{{{issue.title}}}}"),
            status: VersionStatus::Active,
            usage_count: 0,
            completion_rate: None,
            promoted_at: Some(base),
            created_at: base,
        }),
    }
}

#[parameterized(
    empty = { json!({}), true },
    null = { serde_json::Value::Null, true },
    type_match = { json!({"type": "signal"}), true },
    type_mismatch = { json!({"type": "task"}), false },
    labels_subset = { json!({"labels": ["payments"]}), true },
    labels_all_present = { json!({"labels": ["payments", "frontend"]}), true },
    labels_missing = { json!({"labels": ["payments", "backend"]}), false },
    project_match = { json!({"project_id": "proj-web"}), true },
    project_camel_case = { json!({"projectId": "proj-web"}), true },
    project_mismatch = { json!({"project_id": "proj-api"}), false },
    source_match = { json!({"type": "signal", "signal_source": "sentry"}), true },
    source_mismatch = { json!({"signalSource": "posthog"}), false },
    no_failed_sessions = { json!({"has_failed_sessions": false}), true },
    wants_failed_sessions = { json!({"hasFailedSessions": true}), false },
    confidence_without_hypothesis = { json!({"hypothesis_confidence": 0.5}), false },
)]
fn conditions_match(raw: serde_json::Value, expected: bool) {
    let conditions = TemplateConditions::parse("t", &raw).unwrap();
    assert_eq!(conditions.matches(&MatchContext::new(&issue())), expected);
}

#[parameterized(
    wants_failures = { json!({"has_failed_sessions": true}), true },
    wants_clean = { json!({"has_failed_sessions": false}), false },
    unconstrained = { json!({}), true },
)]
fn failed_session_condition(raw: serde_json::Value, expected: bool) {
    let issue = issue();
    let ctx = MatchContext {
        issue: &issue,
        has_failed_sessions: true,
    };
    let conditions = TemplateConditions::parse("t", &raw).unwrap();
    assert_eq!(conditions.matches(&ctx), expected);
}

#[parameterized(
    below_threshold = { 0.5, true },
    at_threshold = { 0.7, true },
    above_confidence = { 0.8, false },
)]
fn hypothesis_confidence_is_a_minimum(min: f64, expected: bool) {
    let mut issue = issue();
    issue.issue_type = IssueType::Hypothesis;
    issue.hypothesis_confidence = Some(0.7);
    let conditions =
        TemplateConditions::parse("t", &json!({"hypothesisConfidence": min})).unwrap();
    assert_eq!(conditions.matches(&MatchContext::new(&issue)), expected);
}

#[parameterized(
    unknown_key = { json!({"colour": "red"}) },
    bad_type = { json!({"type": "bug"}) },
    labels_not_list = { json!({"labels": "payments"}) },
    not_object = { json!("signal") },
    confidence_out_of_range = { json!({"hypothesis_confidence": 1.5}) },
    failed_sessions_not_bool = { json!({"has_failed_sessions": "yes"}) },
)]
fn malformed_conditions_rejected(raw: serde_json::Value) {
    let err = TemplateConditions::parse("broken", &raw).unwrap_err();
    assert!(matches!(err, Error::MalformedConditions { ref slug, .. } if slug == "broken"));
}

#[test]
fn higher_specificity_wins() {
    let templates = vec![
        template("generic", 1, json!({})),
        template("signal-specific", 3, json!({"type": "signal"})),
    ];
    let issue = issue();
    let (t, _) = select_template(&templates, &MatchContext::new(&issue)).unwrap();
    assert_eq!(t.slug, "signal-specific");
}

#[test]
fn specificity_tie_prefers_latest_promotion() {
    let mut older = template("older", 5, json!({}));
    let mut newer = template("newer", 5, json!({}));
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    older.active_version.as_mut().unwrap().promoted_at = Some(base);
    newer.active_version.as_mut().unwrap().promoted_at = Some(base + Duration::hours(1));

    let templates = vec![older, newer];
    let issue = issue();
    let (t, _) = select_template(&templates, &MatchContext::new(&issue)).unwrap();
    assert_eq!(t.slug, "newer");
}

#[test]
fn ranking_skips_malformed_and_orders_the_rest() {
    let templates = vec![
        template("broken", 100, json!({"nonsense": true})),
        template("fallback", 1, json!({})),
        template("signals", 4, json!({"type": "signal"})),
        template("tasks", 9, json!({"type": "task"})),
    ];
    let issue = issue();
    let slugs: Vec<&str> = rank_templates(&templates, &MatchContext::new(&issue))
        .into_iter()
        .map(|(t, _)| t.slug.as_str())
        .collect();
    assert_eq!(slugs, vec!["signals", "fallback"]);
}

#[test]
fn templates_without_live_version_are_ignored() {
    let mut draft = template("draft", 10, json!({}));
    draft.active_version.as_mut().unwrap().status = VersionStatus::Draft;
    let mut empty = template("empty", 10, json!({}));
    empty.active_version = None;

    let templates = vec![draft, empty];
    let issue = issue();
    assert!(select_template(&templates, &MatchContext::new(&issue)).is_none());
}

fn render(issue: &Issue, content: &str) -> String {
    let t = template("x", 1, json!({}));
    let ctx = HydrationContext::new(issue, &t, t.live_version().unwrap());
    PromptRenderer::new().unwrap().render(content, &ctx).unwrap()
}

#[test]
fn hydrate_substitutes_issue_fields() {
    let mut t = template("full", 1, json!({}));
    t.active_version.as_mut().unwrap().content = "#{{issue.number}} {{ issue.title }}\n\
         id={{issue.id}} type={{issue.type}} p={{issue.priority}} ({{priority_label issue.priority}})\n\
         {{issue.description}}\n\
         labels: {{#each labels}}{{this.name}}{{#unless @last}}, {{/unless}}{{/each}} \
         via {{template.slug}} v{{version.number}} ({{meta.version_id}})"
        .into();
    let version = t.live_version().unwrap().clone();
    let ctx = HydrationContext::new(&issue(), &t, &version);

    let prompt = PromptRenderer::new().unwrap().hydrate(&version, &ctx).unwrap();
    assert_eq!(
        prompt.text,
        "#42 Checkout errors spiking\n\
         id=iss-1 type=signal p=1 (urgent)\n\
         500s on /checkout\n\
         labels: frontend, payments via full v1 (ver-full)"
    );
    assert_eq!(prompt.meta.template_id, "tpl-full");
    assert_eq!(prompt.meta.version_id, "ver-full");
    assert_eq!(prompt.meta.version_number, 1);
}

#[test]
fn if_block_is_omitted_for_missing_value() {
    let mut i = issue();
    let content = "Fix {{issue.title}}.{{#if issue.description}} Details: {{issue.description}}{{/if}}";
    assert_eq!(
        render(&i, content),
        "Fix Checkout errors spiking. Details: 500s on /checkout"
    );

    i.description = None;
    assert_eq!(render(&i, content), "Fix Checkout errors spiking.");
}

#[parameterized(
    urgent = { 1, "urgent" },
    low = { 4, "low" },
    none = { 0, "none" },
)]
fn priority_label_helper(priority: i64, expected: &str) {
    let mut i = issue();
    i.priority = Priority::try_from(priority).unwrap();
    assert_eq!(render(&i, "{{priority_label issue.priority}}"), expected);
}

#[test]
fn priority_label_helper_tolerates_unknown_values() {
    assert_eq!(render(&issue(), "{{priority_label 9}}"), "unknown");
    assert_eq!(render(&issue(), "[{{priority_label issue.nope}}]"), "[unknown]");
}

#[test]
fn json_helper_pretty_prints() {
    assert_eq!(
        render(&issue(), "{{json issue.labels}}"),
        "[\n  \"frontend\",\n  \"payments\"\n]"
    );
}

#[parameterized(
    unknown_placeholder = { "a{{nope}}b", "ab" },
    nested_missing = { "a{{parent.title}}b", "ab" },
    no_placeholders = { "plain text", "plain text" },
    single_braces = { "{issue.id}", "{issue.id}" },
    adjacent = { "{{issue.id}}{{issue.number}}", "iss-142" },
)]
fn render_is_lenient(content: &str, expected: &str) {
    assert_eq!(render(&issue(), content), expected);
}

#[test]
fn output_is_not_html_escaped() {
    let mut i = issue();
    i.title = "<b>a & b</b> \"quoted\"".into();
    assert_eq!(render(&i, "{{issue.title}}"), "<b>a & b</b> \"quoted\"");
}

#[test]
fn syntax_error_is_reported() {
    let t = template("bad", 1, json!({}));
    let ctx = HydrationContext::new(&issue(), &t, t.live_version().unwrap());
    let err = PromptRenderer::new()
        .unwrap()
        .render("{{#if issue.title}}unclosed", &ctx)
        .unwrap_err();
    assert!(matches!(err, Error::Render { ref slug, .. } if slug == "bad"));
}

/// Parent `p` with children `a` (blocked by `b`) and a canceled attempt `s`.
fn family() -> TestContext {
    let mut ctx = TestContext::new();
    let mut parent = make_issue("p", IssueType::Plan, 2);
    parent.project_id = Some("web".into());
    let mut a = make_issue("a", IssueType::Task, 2);
    a.parent_id = Some("p".into());
    a.project_id = Some("web".into());
    let mut s = make_issue("s", IssueType::Task, 3);
    s.parent_id = Some("p".into());
    s.status = Status::Canceled;
    s.agent_summary = Some("ran out of retries".into());

    ctx.insert(parent)
        .insert(a)
        .insert(s)
        .issue("b", IssueType::Task, 1)
        .blocked_by("a", "b")
        .goal("web", 40.0, 100.0);
    ctx
}

#[test]
fn load_builds_family_blockers_and_goal() {
    let ctx = family();
    let a = ctx.db.get_issue("a").unwrap();
    let t = template("x", 1, json!({}));

    let hydration = HydrationContext::load(&ctx.db, &a, &t, t.live_version().unwrap()).unwrap();

    assert_eq!(hydration.parent.as_ref().map(|p| p.id.as_str()), Some("p"));
    let siblings: Vec<&str> = hydration.siblings.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(siblings, vec!["s"]);
    assert!(hydration.children.is_empty());
    assert_eq!(hydration.blocked_by.len(), 1);
    assert_eq!(hydration.blocked_by[0].id, "b");
    assert_eq!(hydration.blocked_by[0].title, "Issue b");
    assert!(hydration.blocking.is_empty());
    assert_eq!(hydration.goal.as_ref().map(|g| g.id.as_str()), Some("goal-web"));
    assert_eq!(hydration.project, Some(ProjectRef { id: "web".into() }));
}

#[test]
fn load_lists_children_of_top_level_issue() {
    let ctx = family();
    let p = ctx.db.get_issue("p").unwrap();
    let t = template("x", 1, json!({}));

    let hydration = HydrationContext::load(&ctx.db, &p, &t, t.live_version().unwrap()).unwrap();

    assert!(hydration.parent.is_none());
    assert!(hydration.siblings.is_empty());
    let children: Vec<&str> = hydration.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(children, vec!["a", "s"]);
}

#[test]
fn partials_render_loaded_context() {
    let ctx = family();
    let b = ctx.db.get_issue("b").unwrap();
    let a = ctx.db.get_issue("a").unwrap();
    let t = template("x", 1, json!({}));
    let hydration = HydrationContext::load(&ctx.db, &a, &t, t.live_version().unwrap()).unwrap();

    let text = PromptRenderer::new()
        .unwrap()
        .render(
            "{{> parent_context}}{{> sibling_context}}{{> blocker_context}}{{> project_and_goal_context}}",
            &hydration,
        )
        .unwrap();

    assert!(text.contains("## Parent Issue"));
    assert!(text.contains("Issue p"));
    assert!(text.contains("[canceled]: Issue s"));
    assert!(text.contains("## Blocked By"));
    assert!(text.contains(&format!("#{} [todo]: Issue b", b.number)));
    assert!(!text.contains("## Blocking"));
    assert!(text.contains("Goal for web"));
}

#[test]
fn match_context_sees_failed_sibling_sessions() {
    let ctx = family();
    let a = ctx.db.get_issue("a").unwrap();
    let b = ctx.db.get_issue("b").unwrap();

    assert!(MatchContext::load(&ctx.db, &a).unwrap().has_failed_sessions);
    assert!(!MatchContext::load(&ctx.db, &b).unwrap().has_failed_sessions);
}

#[test]
fn match_template_uses_graph_context() {
    let mut ctx = family();
    ctx.template(
        "retry",
        5,
        json!({"hasFailedSessions": true}),
        "Retry {{issue.title}} after {{#each siblings}}{{this.agent_summary}}{{/each}}",
    )
    .default_template();
    let templates = ctx.db.list_active_templates().unwrap();

    let a = ctx.db.get_issue("a").unwrap();
    let prompt = match_template(&ctx.db, &a, &templates).unwrap().unwrap();
    assert_eq!(prompt.meta.template_slug, "retry");
    assert_eq!(prompt.text, "Retry Issue a after ran out of retries");

    let b = ctx.db.get_issue("b").unwrap();
    let prompt = match_template(&ctx.db, &b, &templates).unwrap().unwrap();
    assert_eq!(prompt.meta.template_slug, "default");
}

#[test]
fn match_template_without_candidates_is_none() {
    let ctx = family();
    let a = ctx.db.get_issue("a").unwrap();
    assert!(match_template(&ctx.db, &a, &[]).unwrap().is_none());
}

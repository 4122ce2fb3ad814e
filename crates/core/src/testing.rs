// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Test infrastructure: an in-memory store with a fluent seeding API.
//!
//! ```rust,ignore
//! let mut ctx = TestContext::new();
//! ctx.issue("a", IssueType::Task, 2)
//!     .issue("b", IssueType::Signal, 1)
//!     .blocked_by("a", "b");
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::goal::{Goal, GoalStatus};
use crate::graph::IssueGraph;
use crate::issue::{AuthorKind, Issue, IssueType, Note, Priority, RelationType, Status};
use crate::prompt::{PromptTemplate, PromptVersion, VersionStatus};

/// Fixed reference time so age bonuses are reproducible.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Build an unsaved issue created ten minutes before [`now`].
pub fn make_issue(id: &str, issue_type: IssueType, priority: i64) -> Issue {
    let mut issue = Issue::new(
        id.to_string(),
        issue_type,
        format!("Issue {id}"),
        now() - Duration::minutes(10),
    );
    issue.priority = Priority::try_from(priority).expect("valid priority");
    issue
}

pub struct TestContext {
    pub db: Database,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        TestContext { db }
    }

    /// Insert a todo issue created ten minutes before [`now`].
    pub fn issue(&mut self, id: &str, issue_type: IssueType, priority: i64) -> &mut Self {
        self.insert(make_issue(id, issue_type, priority))
    }

    pub fn issue_with_status(
        &mut self,
        id: &str,
        issue_type: IssueType,
        priority: i64,
        status: Status,
    ) -> &mut Self {
        let mut issue = make_issue(id, issue_type, priority);
        issue.status = status;
        self.insert(issue)
    }

    pub fn insert(&mut self, issue: Issue) -> &mut Self {
        self.db.create_issue(&issue).expect("Failed to create issue");
        self
    }

    /// `issue` cannot proceed until `blocker` is done or canceled.
    pub fn blocked_by(&mut self, issue: &str, blocker: &str) -> &mut Self {
        self.db
            .add_relation(issue, blocker, RelationType::BlockedBy)
            .expect("Failed to add relation");
        self
    }

    pub fn goal(&mut self, project: &str, current: f64, target: f64) -> &mut Self {
        self.db
            .create_goal(&Goal {
                id: format!("goal-{project}"),
                project_id: Some(project.to_string()),
                title: format!("Goal for {project}"),
                status: GoalStatus::Active,
                current_value: Some(current),
                target_value: Some(target),
            })
            .expect("Failed to create goal");
        self
    }

    /// Create a template with a single promoted version.
    pub fn template(
        &mut self,
        slug: &str,
        specificity: i64,
        conditions: serde_json::Value,
        content: &str,
    ) -> &mut Self {
        let template_id = format!("tpl-{slug}");
        self.db
            .create_template(&PromptTemplate {
                id: template_id.clone(),
                slug: slug.to_string(),
                name: slug.to_string(),
                conditions,
                specificity,
                active_version: None,
            })
            .expect("Failed to create template");
        let version_id = format!("ver-{slug}-1");
        self.db
            .create_version(&PromptVersion {
                id: version_id.clone(),
                template_id,
                version: 1,
                content: content.to_string(),
                status: VersionStatus::Draft,
                usage_count: 0,
                completion_rate: None,
                promoted_at: None,
                created_at: now(),
            })
            .expect("Failed to create version");
        self.db
            .promote_version(&version_id)
            .expect("Failed to promote version");
        self
    }

    /// A catch-all template matching every issue.
    pub fn default_template(&mut self) -> &mut Self {
        self.template("default", 0, json!({}), "Work on {{issue.title}}")
    }
}

/// Wraps a store and injects interference from "other callers".
pub struct FaultyGraph<'a> {
    pub inner: &'a Database,
    /// Issues another caller claims just before each of our claim attempts.
    pub stolen: Vec<String>,
    /// Fail every note write with a storage error.
    pub fail_notes: bool,
    /// Fail template listing with a storage error.
    pub fail_templates: bool,
    /// Fail single-issue and child reads with a storage error.
    pub fail_reads: bool,
}

/// The error a locked SQLite database reports.
pub fn busy() -> Error {
    Error::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        Some("database is locked".into()),
    ))
}

impl<'a> FaultyGraph<'a> {
    pub fn new(inner: &'a Database) -> Self {
        FaultyGraph {
            inner,
            stolen: Vec::new(),
            fail_notes: false,
            fail_templates: false,
            fail_reads: false,
        }
    }

    pub fn steal(mut self, id: &str) -> Self {
        self.stolen.push(id.to_string());
        self
    }

    pub fn failing_notes(mut self) -> Self {
        self.fail_notes = true;
        self
    }

    pub fn failing_templates(mut self) -> Self {
        self.fail_templates = true;
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }
}

impl IssueGraph for FaultyGraph<'_> {
    fn list_issues(&self, status: Status, project_id: Option<&str>) -> Result<Vec<Issue>> {
        self.inner.list_issues(status, project_id)
    }

    fn get_issue(&self, id: &str) -> Result<Issue> {
        if self.fail_reads {
            return Err(busy());
        }
        self.inner.get_issue(id)
    }

    fn list_children(&self, parent_id: &str) -> Result<Vec<Issue>> {
        if self.fail_reads {
            return Err(busy());
        }
        self.inner.list_children(parent_id)
    }

    fn compare_and_set_status(&self, id: &str, expected: Status, new: Status) -> Result<bool> {
        if self.stolen.iter().any(|s| s == id) {
            self.inner.set_status(id, Status::InProgress)?;
        }
        self.inner.compare_and_set_status(id, expected, new)
    }

    fn set_status(&self, id: &str, status: Status) -> Result<Issue> {
        self.inner.set_status(id, status)
    }

    fn create_note(&self, issue_id: &str, body: &str, author: AuthorKind) -> Result<Note> {
        if self.fail_notes {
            return Err(busy());
        }
        self.inner.create_note(issue_id, body, author)
    }

    fn list_active_templates(&self) -> Result<Vec<PromptTemplate>> {
        if self.fail_templates {
            return Err(busy());
        }
        self.inner.list_active_templates()
    }

    fn list_active_goals(&self) -> Result<Vec<Goal>> {
        self.inner.list_active_goals()
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed issue graph.
//!
//! [`Database`] implements [`IssueGraph`] and also carries the seeding
//! operations (issue, relation, goal and template creation) used by the
//! CLI importer and the tests.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::goal::Goal;
use crate::graph::IssueGraph;
use crate::issue::{AuthorKind, Issue, IssueRelation, Note, Priority, RelationType, Status};
use crate::prompt::{PromptTemplate, PromptVersion};

/// SQL schema for the dispatch store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS issues (
    id TEXT PRIMARY KEY,
    number INTEGER NOT NULL UNIQUE,
    type TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'triage',
    priority INTEGER NOT NULL DEFAULT 0,
    parent_id TEXT,
    project_id TEXT,
    signal_source TEXT,
    agent_summary TEXT,
    hypothesis_confidence REAL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    completed_at TEXT
);

-- Directed relations; blocks/blocked_by are stored in both directions
CREATE TABLE IF NOT EXISTS relations (
    issue_id TEXT NOT NULL,
    related_issue_id TEXT NOT NULL,
    type TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (issue_id, related_issue_id, type),
    FOREIGN KEY (issue_id) REFERENCES issues(id),
    FOREIGN KEY (related_issue_id) REFERENCES issues(id),
    CHECK (issue_id != related_issue_id)
);

CREATE TABLE IF NOT EXISTS labels (
    issue_id TEXT NOT NULL,
    label TEXT NOT NULL,
    PRIMARY KEY (issue_id, label),
    FOREIGN KEY (issue_id) REFERENCES issues(id)
);

CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id TEXT NOT NULL,
    body TEXT NOT NULL,
    author_kind TEXT NOT NULL,
    author_name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (issue_id) REFERENCES issues(id)
);

CREATE TABLE IF NOT EXISTS goals (
    id TEXT PRIMARY KEY,
    project_id TEXT,
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    current_value REAL,
    target_value REAL
);

CREATE TABLE IF NOT EXISTS prompt_templates (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    conditions TEXT NOT NULL DEFAULT '{}',
    specificity INTEGER NOT NULL DEFAULT 10,
    active_version_id TEXT
);

CREATE TABLE IF NOT EXISTS prompt_versions (
    id TEXT PRIMARY KEY,
    template_id TEXT NOT NULL,
    version INTEGER NOT NULL,
    content TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    usage_count INTEGER NOT NULL DEFAULT 0,
    completion_rate REAL,
    promoted_at TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (template_id, version),
    FOREIGN KEY (template_id) REFERENCES prompt_templates(id)
);

CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_id);
CREATE INDEX IF NOT EXISTS idx_issues_parent ON issues(parent_id);
CREATE INDEX IF NOT EXISTS idx_relations_related ON relations(related_issue_id);
CREATE INDEX IF NOT EXISTS idx_relations_type ON relations(type);
CREATE INDEX IF NOT EXISTS idx_notes_issue ON notes(issue_id);
CREATE INDEX IF NOT EXISTS idx_goals_project ON goals(project_id);
CREATE INDEX IF NOT EXISTS idx_versions_template ON prompt_versions(template_id);
"#;

const ISSUE_COLUMNS: &str = "i.id, i.number, i.type, i.title, i.description, i.status,
     i.priority, i.parent_id, i.project_id, i.signal_source,
     i.created_at, i.updated_at, i.completed_at, i.agent_summary, i.hypothesis_confidence";

fn corrupted(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::CorruptedData(message)),
    )
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value
        .parse()
        .map_err(|_| corrupted(format!("invalid value '{value}' in column '{column}'")))
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| corrupted(format!("invalid timestamp '{value}' in column '{column}'")))
}

fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    value.map(|v| parse_timestamp(&v, column)).transpose()
}

fn issue_from_row(row: &Row<'_>) -> std::result::Result<Issue, rusqlite::Error> {
    let type_str: String = row.get(2)?;
    let status_str: String = row.get(5)?;
    let priority: i64 = row.get(6)?;
    let created_str: String = row.get(10)?;
    let updated_str: String = row.get(11)?;
    let completed_str: Option<String> = row.get(12)?;

    Ok(Issue {
        id: row.get(0)?,
        number: row.get(1)?,
        issue_type: parse_db(&type_str, "type")?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: parse_db(&status_str, "status")?,
        priority: Priority::try_from(priority)
            .map_err(|_| corrupted(format!("invalid priority {priority}")))?,
        parent_id: row.get(7)?,
        project_id: row.get(8)?,
        signal_source: row.get(9)?,
        labels: Vec::new(),
        agent_summary: row.get(13)?,
        hypothesis_confidence: row.get(14)?,
        relations: Vec::new(),
        created_at: parse_timestamp(&created_str, "created_at")?,
        updated_at: parse_timestamp(&updated_str, "updated_at")?,
        completed_at: parse_timestamp_opt(completed_str, "completed_at")?,
    })
}

fn version_from_row(
    row: &Row<'_>,
    offset: usize,
) -> std::result::Result<PromptVersion, rusqlite::Error> {
    let status_str: String = row.get(offset + 4)?;
    let promoted: Option<String> = row.get(offset + 7)?;
    let created_str: String = row.get(offset + 8)?;
    Ok(PromptVersion {
        id: row.get(offset)?,
        template_id: row.get(offset + 1)?,
        version: row.get(offset + 2)?,
        content: row.get(offset + 3)?,
        status: parse_db(&status_str, "status")?,
        usage_count: row.get(offset + 5)?,
        completion_rate: row.get(offset + 6)?,
        promoted_at: parse_timestamp_opt(promoted, "promoted_at")?,
        created_at: parse_timestamp(&created_str, "created_at")?,
    })
}

/// Run schema creation on a database connection. Idempotent.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// SQLite database connection implementing the issue graph.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL lets readers build queues while another connection claims
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Insert an issue and its labels. Returns the assigned sequence number.
    pub fn create_issue(&self, issue: &Issue) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO issues (id, number, type, title, description, status, priority,
             parent_id, project_id, signal_source, agent_summary, hypothesis_confidence,
             created_at, updated_at, completed_at)
             VALUES (?1, (SELECT COALESCE(MAX(number), 0) + 1 FROM issues),
                     ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                issue.id,
                issue.issue_type.as_str(),
                issue.title,
                issue.description,
                issue.status.as_str(),
                i64::from(issue.priority),
                issue.parent_id,
                issue.project_id,
                issue.signal_source,
                issue.agent_summary,
                issue.hypothesis_confidence,
                issue.created_at.to_rfc3339(),
                issue.updated_at.to_rfc3339(),
                issue.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        for label in &issue.labels {
            tx.execute(
                "INSERT OR IGNORE INTO labels (issue_id, label) VALUES (?1, ?2)",
                params![issue.id, label],
            )?;
        }
        let number = tx.query_row(
            "SELECT number FROM issues WHERE id = ?1",
            params![issue.id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(number)
    }

    /// Check if an issue exists.
    pub fn issue_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Add a label to an issue.
    pub fn add_label(&self, issue_id: &str, label: &str) -> Result<()> {
        if !self.issue_exists(issue_id)? {
            return Err(Error::IssueNotFound(issue_id.to_string()));
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO labels (issue_id, label) VALUES (?1, ?2)",
            params![issue_id, label],
        )?;
        Ok(())
    }

    /// Relate two issues. `blocks` and `blocked_by` also write the inverse edge.
    pub fn add_relation(
        &self,
        issue_id: &str,
        related_issue_id: &str,
        relation: RelationType,
    ) -> Result<()> {
        if issue_id == related_issue_id {
            return Err(Error::SelfRelation(issue_id.to_string()));
        }
        for id in [issue_id, related_issue_id] {
            if !self.issue_exists(id)? {
                return Err(Error::IssueNotFound(id.to_string()));
            }
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO relations (issue_id, related_issue_id, type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![issue_id, related_issue_id, relation.as_str(), now],
        )?;
        if let Some(inverse) = relation.inverse() {
            tx.execute(
                "INSERT OR IGNORE INTO relations (issue_id, related_issue_id, type, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![related_issue_id, issue_id, inverse.as_str(), now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Get all notes for an issue, ordered by creation.
    pub fn get_notes(&self, issue_id: &str) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, issue_id, body, author_kind, author_name, created_at
             FROM notes WHERE issue_id = ?1 ORDER BY id",
        )?;

        let notes = stmt
            .query_map(params![issue_id], note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    pub fn create_goal(&self, goal: &Goal) -> Result<()> {
        self.conn.execute(
            "INSERT INTO goals (id, project_id, title, status, current_value, target_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                goal.id,
                goal.project_id,
                goal.title,
                goal.status.as_str(),
                goal.current_value,
                goal.target_value,
            ],
        )?;
        Ok(())
    }

    /// Insert a template. Its `active_version` is ignored; use [`Database::promote_version`].
    pub fn create_template(&self, template: &PromptTemplate) -> Result<()> {
        self.conn.execute(
            "INSERT INTO prompt_templates (id, slug, name, conditions, specificity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                template.id,
                template.slug,
                template.name,
                serde_json::to_string(&template.conditions)?,
                template.specificity,
            ],
        )?;
        Ok(())
    }

    pub fn create_version(&self, version: &PromptVersion) -> Result<()> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM prompt_templates WHERE id = ?1",
            params![version.template_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(Error::TemplateNotFound(version.template_id.clone()));
        }
        self.conn.execute(
            "INSERT INTO prompt_versions (id, template_id, version, content, status,
             usage_count, completion_rate, promoted_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                version.id,
                version.template_id,
                version.version,
                version.content,
                version.status.as_str(),
                version.usage_count,
                version.completion_rate,
                version.promoted_at.map(|t| t.to_rfc3339()),
                version.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Make a version its template's active version, retiring the previous one.
    pub fn promote_version(&self, version_id: &str) -> Result<()> {
        self.promote_version_at(version_id, Utc::now())
    }

    /// [`Database::promote_version`] with an explicit promotion time.
    pub fn promote_version_at(&self, version_id: &str, at: DateTime<Utc>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let template_id: String = tx
            .query_row(
                "SELECT template_id FROM prompt_versions WHERE id = ?1",
                params![version_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::VersionNotFound(version_id.to_string()))?;

        tx.execute(
            "UPDATE prompt_versions SET status = 'retired'
             WHERE template_id = ?1 AND status = 'active' AND id != ?2",
            params![template_id, version_id],
        )?;
        tx.execute(
            "UPDATE prompt_versions SET status = 'active', promoted_at = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), version_id],
        )?;
        tx.execute(
            "UPDATE prompt_templates SET active_version_id = ?1 WHERE id = ?2",
            params![version_id, template_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// Issue rows matching `filter`, ordered by number, without edges.
fn query_issues<P: rusqlite::Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> Result<Vec<Issue>> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues i WHERE {filter} ORDER BY i.number");
    let mut stmt = conn.prepare(&sql)?;
    let issues = stmt
        .query_map(params, issue_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(issues)
}

/// Load labels and relations for exactly the given issues.
///
/// Edges are keyed by the ids already selected, never by re-applying the
/// row filter, so an issue cannot come back without its blockers.
fn attach_edges(conn: &Connection, issues: &mut [Issue]) -> Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    let ids: Vec<&str> = issues.iter().map(|i| i.id.as_str()).collect();
    let ids = serde_json::to_string(&ids)?;

    let mut labels: HashMap<String, Vec<String>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT l.issue_id, l.label FROM labels l
         WHERE l.issue_id IN (SELECT value FROM json_each(?1))
         ORDER BY l.issue_id, l.label",
    )?;
    let rows = stmt.query_map(params![ids], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (issue_id, label) = row?;
        labels.entry(issue_id).or_default().push(label);
    }

    let mut relations: HashMap<String, Vec<IssueRelation>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT r.issue_id, r.type, r.related_issue_id, t.status
         FROM relations r
         JOIN issues t ON t.id = r.related_issue_id
         WHERE r.issue_id IN (SELECT value FROM json_each(?1))
         ORDER BY r.issue_id, r.type, r.related_issue_id",
    )?;
    let rows = stmt.query_map(params![ids], |row| {
        let issue_id: String = row.get(0)?;
        let type_str: String = row.get(1)?;
        let target_status: String = row.get(3)?;
        Ok((
            issue_id,
            IssueRelation {
                relation: parse_db(&type_str, "type")?,
                target_id: row.get(2)?,
                target_status: parse_db(&target_status, "status")?,
            },
        ))
    })?;
    for row in rows {
        let (issue_id, relation) = row?;
        relations.entry(issue_id).or_default().push(relation);
    }

    for issue in issues.iter_mut() {
        issue.labels = labels.remove(&issue.id).unwrap_or_default();
        issue.relations = relations.remove(&issue.id).unwrap_or_default();
    }
    Ok(())
}

fn note_from_row(row: &Row<'_>) -> std::result::Result<Note, rusqlite::Error> {
    let kind_str: String = row.get(3)?;
    let created_str: String = row.get(5)?;
    Ok(Note {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        body: row.get(2)?,
        author_kind: parse_db::<AuthorKind>(&kind_str, "author_kind")?,
        author_name: row.get(4)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
    })
}

impl IssueGraph for Database {
    fn list_issues(&self, status: Status, project_id: Option<&str>) -> Result<Vec<Issue>> {
        // One read snapshot for rows and edges
        let tx = self.conn.unchecked_transaction()?;
        let mut issues = query_issues(
            &tx,
            "i.status = ?1 AND (?2 IS NULL OR i.project_id = ?2)",
            params![status.as_str(), project_id],
        )?;
        attach_edges(&tx, &mut issues)?;
        tx.commit()?;
        Ok(issues)
    }

    fn list_children(&self, parent_id: &str) -> Result<Vec<Issue>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut issues = query_issues(&tx, "i.parent_id = ?1", params![parent_id])?;
        attach_edges(&tx, &mut issues)?;
        tx.commit()?;
        Ok(issues)
    }

    fn get_issue(&self, id: &str) -> Result<Issue> {
        let tx = self.conn.unchecked_transaction()?;
        let mut issues = query_issues(&tx, "i.id = ?1", params![id])?;
        attach_edges(&tx, &mut issues)?;
        tx.commit()?;
        issues
            .pop()
            .ok_or_else(|| Error::IssueNotFound(id.to_string()))
    }

    fn compare_and_set_status(&self, id: &str, expected: Status, new: Status) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let affected = self.conn.execute(
            "UPDATE issues SET status = ?1, updated_at = ?2,
                 completed_at = CASE WHEN ?1 = 'done' THEN ?2 ELSE NULL END
             WHERE id = ?3 AND status = ?4",
            params![new.as_str(), now, id, expected.as_str()],
        )?;
        Ok(affected == 1)
    }

    fn set_status(&self, id: &str, status: Status) -> Result<Issue> {
        let now = Utc::now().to_rfc3339();
        let affected = self.conn.execute(
            "UPDATE issues SET status = ?1, updated_at = ?2,
                 completed_at = CASE WHEN ?1 = 'done' THEN ?2 ELSE NULL END
             WHERE id = ?3",
            params![status.as_str(), now, id],
        )?;

        if affected == 0 {
            return Err(Error::IssueNotFound(id.to_string()));
        }
        self.get_issue(id)
    }

    fn create_note(&self, issue_id: &str, body: &str, author: AuthorKind) -> Result<Note> {
        if !self.issue_exists(issue_id)? {
            return Err(Error::IssueNotFound(issue_id.to_string()));
        }
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO notes (issue_id, body, author_kind, author_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                issue_id,
                body,
                author.as_str(),
                author.as_str(),
                created_at.to_rfc3339()
            ],
        )?;
        Ok(Note {
            id: self.conn.last_insert_rowid(),
            issue_id: issue_id.to_string(),
            body: body.to_string(),
            author_kind: author,
            author_name: author.as_str().to_string(),
            created_at,
        })
    }

    fn list_active_templates(&self) -> Result<Vec<PromptTemplate>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.slug, t.name, t.conditions, t.specificity,
                    v.id, v.template_id, v.version, v.content, v.status,
                    v.usage_count, v.completion_rate, v.promoted_at, v.created_at
             FROM prompt_templates t
             JOIN prompt_versions v ON v.id = t.active_version_id
             WHERE v.status = 'active'
             ORDER BY t.slug",
        )?;

        let templates = stmt
            .query_map([], |row| {
                let raw: String = row.get(3)?;
                // Unparseable JSON is kept as a string so the matcher rejects
                // this one template instead of failing the whole listing.
                let conditions =
                    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
                Ok(PromptTemplate {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    name: row.get(2)?,
                    conditions,
                    specificity: row.get(4)?,
                    active_version: Some(version_from_row(row, 5)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(templates)
    }

    fn list_active_goals(&self) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, title, status, current_value, target_value
             FROM goals WHERE status = 'active' ORDER BY id",
        )?;

        let goals = stmt
            .query_map([], |row| {
                let status_str: String = row.get(3)?;
                Ok(Goal {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    title: row.get(2)?,
                    status: parse_db(&status_str, "status")?,
                    current_value: row.get(4)?,
                    target_value: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(goals)
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bulk loading from JSON Lines.
//!
//! Every line is parsed before anything is written, so a malformed file
//! leaves the database untouched. Records are then applied in file order;
//! later lines may refer to ids created by earlier ones.

use std::fmt;
use std::io::{self, BufRead, BufReader};

use chrono::{DateTime, Utc};
use lq_core::{
    Database, Goal, GoalStatus, Issue, IssueType, Priority, PromptTemplate, PromptVersion,
    RelationType, Status, VersionStatus,
};
use serde::Deserialize;

use crate::error::{Error, Result};

use super::open_db;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record {
    Issue(IssueRecord),
    Relation(RelationRecord),
    Label(LabelRecord),
    Goal(GoalRecord),
    Template(TemplateRecord),
    Version(VersionRecord),
    Promote(PromoteRecord),
}

#[derive(Debug, Deserialize)]
struct IssueRecord {
    id: String,
    #[serde(rename = "type")]
    issue_type: IssueType,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_status")]
    status: Status,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    signal_source: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    agent_summary: Option<String>,
    #[serde(default)]
    hypothesis_confidence: Option<f64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

fn default_status() -> Status {
    Status::Todo
}

#[derive(Debug, Deserialize)]
struct RelationRecord {
    from: String,
    to: String,
    relation: RelationType,
}

#[derive(Debug, Deserialize)]
struct LabelRecord {
    issue_id: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct GoalRecord {
    id: String,
    #[serde(default)]
    project_id: Option<String>,
    title: String,
    #[serde(default = "default_goal_status")]
    status: GoalStatus,
    #[serde(default)]
    current_value: Option<f64>,
    #[serde(default)]
    target_value: Option<f64>,
}

fn default_goal_status() -> GoalStatus {
    GoalStatus::Active
}

#[derive(Debug, Deserialize)]
struct TemplateRecord {
    id: String,
    slug: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    conditions: serde_json::Value,
    #[serde(default = "default_specificity")]
    specificity: i64,
}

fn default_specificity() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
struct VersionRecord {
    id: String,
    template_id: String,
    version: i64,
    content: String,
}

#[derive(Debug, Deserialize)]
struct PromoteRecord {
    version_id: String,
    #[serde(default)]
    promoted_at: Option<DateTime<Utc>>,
}

/// Counts of applied (or, for a dry run, parsed) records.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportSummary {
    pub issues: usize,
    pub relations: usize,
    pub labels: usize,
    pub goals: usize,
    pub templates: usize,
    pub versions: usize,
    pub promotions: usize,
}

impl ImportSummary {
    fn count(&mut self, record: &Record) {
        match record {
            Record::Issue(_) => self.issues += 1,
            Record::Relation(_) => self.relations += 1,
            Record::Label(_) => self.labels += 1,
            Record::Goal(_) => self.goals += 1,
            Record::Template(_) => self.templates += 1,
            Record::Version(_) => self.versions += 1,
            Record::Promote(_) => self.promotions += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.issues
            + self.relations
            + self.labels
            + self.goals
            + self.templates
            + self.versions
            + self.promotions
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.issues, "issue"),
            (self.relations, "relation"),
            (self.labels, "label"),
            (self.goals, "goal"),
            (self.templates, "template"),
            (self.versions, "version"),
            (self.promotions, "promotion"),
        ]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, name)| format!("{} {}{}", n, name, if *n == 1 { "" } else { "s" }))
        .collect();

        if parts.is_empty() {
            write!(f, "nothing")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

pub fn run(file: &str, dry_run: bool) -> Result<()> {
    let reader: Box<dyn BufRead> = if file == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let f = std::fs::File::open(file)
            .map_err(|e| Error::Io(io::Error::other(format!("cannot open {}: {}", file, e))))?;
        Box::new(BufReader::new(f))
    };

    let (db, _) = open_db()?;
    let summary = run_impl(&db, reader, dry_run)?;
    if dry_run {
        println!("Would import {}", summary);
    } else {
        println!("Imported {}", summary);
    }
    Ok(())
}

pub(crate) fn run_impl(db: &Database, reader: impl BufRead, dry_run: bool) -> Result<ImportSummary> {
    let records = parse(reader)?;

    let mut summary = ImportSummary::default();
    for (line, record) in &records {
        if !dry_run {
            apply(db, record).map_err(|source| Error::ImportFailed {
                line: *line,
                source,
            })?;
        }
        summary.count(record);
    }

    tracing::info!(records = summary.total(), dry_run, "import finished");
    Ok(summary)
}

fn parse(reader: impl BufRead) -> Result<Vec<(usize, Record)>> {
    let mut records = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record: Record = serde_json::from_str(line).map_err(|e| Error::ParseLineError {
            line: line_num + 1,
            reason: e.to_string(),
        })?;
        records.push((line_num + 1, record));
    }
    Ok(records)
}

fn apply(db: &Database, record: &Record) -> lq_core::Result<()> {
    match record {
        Record::Issue(r) => {
            let mut issue = Issue::new(
                r.id.clone(),
                r.issue_type,
                r.title.clone(),
                r.created_at.unwrap_or_else(Utc::now),
            );
            issue.description = r.description.clone();
            issue.status = r.status;
            issue.priority = r.priority;
            issue.parent_id = r.parent_id.clone();
            issue.project_id = r.project_id.clone();
            issue.signal_source = r.signal_source.clone();
            issue.labels = r.labels.clone();
            issue.agent_summary = r.agent_summary.clone();
            issue.hypothesis_confidence = r.hypothesis_confidence;
            db.create_issue(&issue)?;
        }
        Record::Relation(r) => db.add_relation(&r.from, &r.to, r.relation)?,
        Record::Label(r) => db.add_label(&r.issue_id, &r.label)?,
        Record::Goal(r) => db.create_goal(&Goal {
            id: r.id.clone(),
            project_id: r.project_id.clone(),
            title: r.title.clone(),
            status: r.status,
            current_value: r.current_value,
            target_value: r.target_value,
        })?,
        Record::Template(r) => db.create_template(&PromptTemplate {
            id: r.id.clone(),
            slug: r.slug.clone(),
            name: r.name.clone().unwrap_or_else(|| r.slug.clone()),
            conditions: r.conditions.clone(),
            specificity: r.specificity,
            active_version: None,
        })?,
        Record::Version(r) => db.create_version(&PromptVersion {
            id: r.id.clone(),
            template_id: r.template_id.clone(),
            version: r.version,
            content: r.content.clone(),
            status: VersionStatus::Draft,
            usage_count: 0,
            completion_rate: None,
            promoted_at: None,
            created_at: Utc::now(),
        })?,
        Record::Promote(r) => match r.promoted_at {
            Some(at) => db.promote_version_at(&r.version_id, at)?,
            None => db.promote_version(&r.version_id)?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;

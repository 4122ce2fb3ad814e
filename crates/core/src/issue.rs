// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core issue types: Issue, IssueType, Status, Priority, relations and notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Classification of issues by their nature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// Externally detected event that needs triage.
    Signal,
    /// Proposed explanation for one or more signals.
    Hypothesis,
    /// Breakdown of a hypothesis into actionable work.
    Plan,
    /// Standard unit of work.
    Task,
    /// Ongoing check that a change had the intended effect.
    Monitor,
}

impl IssueType {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Signal => "signal",
            IssueType::Hypothesis => "hypothesis",
            IssueType::Plan => "plan",
            IssueType::Task => "task",
            IssueType::Monitor => "monitor",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "signal" => Ok(IssueType::Signal),
            "hypothesis" => Ok(IssueType::Hypothesis),
            "plan" => Ok(IssueType::Plan),
            "task" => Ok(IssueType::Task),
            "monitor" => Ok(IssueType::Monitor),
            _ => Err(Error::InvalidIssueType(s.to_string())),
        }
    }
}

/// Workflow status of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Newly arrived, not yet looked at.
    Triage,
    /// Accepted but not scheduled.
    Backlog,
    /// Scheduled and waiting for an agent. The only dispatchable state.
    Todo,
    /// Claimed by an agent.
    InProgress,
    /// Successfully completed.
    Done,
    /// Dropped without completion.
    Canceled,
}

impl Status {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Triage => "triage",
            Status::Backlog => "backlog",
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Done => "done",
            Status::Canceled => "canceled",
        }
    }

    /// Returns true if this is a terminal state (done or canceled).
    ///
    /// A blocker in a terminal state no longer blocks anything.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::Canceled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "triage" => Ok(Status::Triage),
            "backlog" => Ok(Status::Backlog),
            "todo" => Ok(Status::Todo),
            "in_progress" | "in-progress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            "canceled" | "cancelled" => Ok(Status::Canceled),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Issue priority: 1 (urgent) through 4 (low), with 0 meaning "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Priority(u8);

impl Priority {
    pub const NONE: Priority = Priority(0);
    pub const URGENT: Priority = Priority(1);
    pub const HIGH: Priority = Priority(2);
    pub const MEDIUM: Priority = Priority(3);
    pub const LOW: Priority = Priority(4);

    /// Raw numeric value as stored.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Human label used in prompts and text output.
    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "urgent",
            2 => "high",
            3 => "medium",
            4 => "low",
            _ => "none",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NONE
    }
}

impl TryFrom<i64> for Priority {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match u8::try_from(value) {
            Ok(v) if v <= 4 => Ok(Priority(v)),
            _ => Err(Error::InvalidPriority(value)),
        }
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> i64 {
        i64::from(p.0)
    }
}

#[cfg(feature = "schemars")]
impl schemars::JsonSchema for Priority {
    fn schema_name() -> String {
        "Priority".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <u8 as schemars::JsonSchema>::json_schema(gen)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directed relation types between issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// The source must finish before the target can proceed.
    Blocks,
    /// The source cannot proceed until the target is done or canceled.
    BlockedBy,
    /// Informational link.
    Related,
    /// The source duplicates the target.
    Duplicate,
}

impl RelationType {
    /// Returns the string representation used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Blocks => "blocks",
            RelationType::BlockedBy => "blocked_by",
            RelationType::Related => "related",
            RelationType::Duplicate => "duplicate",
        }
    }

    /// The relation seen from the other end, for relation types that have one.
    pub fn inverse(&self) -> Option<RelationType> {
        match self {
            RelationType::Blocks => Some(RelationType::BlockedBy),
            RelationType::BlockedBy => Some(RelationType::Blocks),
            RelationType::Related | RelationType::Duplicate => None,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "blocks" => Ok(RelationType::Blocks),
            "blocked_by" | "blocked-by" => Ok(RelationType::BlockedBy),
            "related" => Ok(RelationType::Related),
            "duplicate" => Ok(RelationType::Duplicate),
            _ => Err(Error::InvalidRelation(s.to_string())),
        }
    }
}

/// An outgoing relation, with the target's status loaded alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct IssueRelation {
    pub relation: RelationType,
    pub target_id: String,
    pub target_status: Status,
}

impl IssueRelation {
    /// True for a `blocked_by` edge whose target is still open.
    pub fn is_unresolved_blocker(&self) -> bool {
        self.relation == RelationType::BlockedBy && !self.target_status.is_terminal()
    }
}

/// The primary entity representing a unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Issue {
    /// Unique identifier.
    pub id: String,
    /// Sequence number assigned by the store.
    pub number: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub status: Status,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Where a signal came from (e.g. "sentry", "posthog").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_source: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// What an agent reported the last time it worked on this issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_summary: Option<String>,
    /// Confidence in 0..=1 carried by hypothesis issues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypothesis_confidence: Option<f64>,
    /// Outgoing relations. Populated by list reads, ignored on insert.
    #[serde(default)]
    pub relations: Vec<IssueRelation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Creates a new todo issue with no priority. The store assigns `number`.
    pub fn new(
        id: String,
        issue_type: IssueType,
        title: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Issue {
            id,
            number: 0,
            title,
            description: None,
            issue_type,
            status: Status::Todo,
            priority: Priority::NONE,
            parent_id: None,
            project_id: None,
            signal_source: None,
            labels: Vec::new(),
            agent_summary: None,
            hypothesis_confidence: None,
            relations: Vec::new(),
            created_at,
            updated_at: created_at,
            completed_at: None,
        }
    }

    /// True if any `blocked_by` relation points at an open issue.
    pub fn is_blocked(&self) -> bool {
        self.relations.iter().any(IssueRelation::is_unresolved_blocker)
    }

    /// True if this issue lists `blocker_id` as one of its `blocked_by` targets.
    pub fn is_blocked_by(&self, blocker_id: &str) -> bool {
        self.relations
            .iter()
            .any(|r| r.relation == RelationType::BlockedBy && r.target_id == blocker_id)
    }

    /// A canceled attempt an agent left a summary on.
    pub fn is_failed_session(&self) -> bool {
        self.status == Status::Canceled && self.agent_summary.is_some()
    }

    /// Todo and not blocked: the queue eligibility predicate.
    pub fn is_eligible(&self) -> bool {
        self.status == Status::Todo && !self.is_blocked()
    }
}

/// Who wrote a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum AuthorKind {
    Human,
    Agent,
}

impl AuthorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorKind::Human => "human",
            AuthorKind::Agent => "agent",
        }
    }
}

impl fmt::Display for AuthorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuthorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "human" => Ok(AuthorKind::Human),
            "agent" => Ok(AuthorKind::Agent),
            _ => Err(Error::InvalidAuthorKind(s.to_string())),
        }
    }
}

/// An attributed note attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Note {
    /// Database-assigned identifier.
    pub id: i64,
    pub issue_id: String,
    pub body: String,
    pub author_kind: AuthorKind,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;

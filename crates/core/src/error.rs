// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lq-core operations.

use thiserror::Error;

/// All possible errors that can occur in lq-core operations.
///
/// An empty queue is not an error: claim and preview operations model it
/// as `Ok(None)` or an empty list.
#[derive(Debug, Error)]
pub enum Error {
    #[error("issue not found: {0}\n  hint: list the queue again and retry with a current id")]
    IssueNotFound(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("version not found: {0}")]
    VersionNotFound(String),

    #[error("claim conflict on {issue_id}: another caller changed its status first")]
    Conflict { issue_id: String },

    #[error("claimed {issue_id} but could not load it: {source}\n  hint: the issue is now in_progress; complete it or move it back to todo")]
    ClaimNotLoaded {
        issue_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid issue type: '{0}'\n  hint: valid types are: signal, hypothesis, plan, task, monitor")]
    InvalidIssueType(String),

    #[error("invalid status: '{0}'\n  hint: valid statuses are: triage, backlog, todo, in_progress, done, canceled")]
    InvalidStatus(String),

    #[error("invalid relation: '{0}'\n  hint: valid relations are: blocks, blocked_by, related, duplicate")]
    InvalidRelation(String),

    #[error("invalid priority: {0}\n  hint: priority is 0 (none) or 1 (urgent) through 4 (low)")]
    InvalidPriority(i64),

    #[error("invalid author kind: '{0}'\n  hint: valid kinds are: human, agent")]
    InvalidAuthorKind(String),

    #[error("malformed conditions on template {slug}: {reason}")]
    MalformedConditions { slug: String, reason: String },

    #[error("cannot render template {slug}: {reason}")]
    Render { slug: String, reason: String },

    #[error("cannot relate an issue to itself: {0}")]
    SelfRelation(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("issue {issue_id} is done but its outcome note was not recorded: {source}")]
    OutcomeNotRecorded {
        issue_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    /// Storage failures may succeed on a later attempt; everything else is
    /// a property of the request itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Database(_) | Error::Io(_) => true,
            Error::OutcomeNotRecorded { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// A specialized Result type for lq-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

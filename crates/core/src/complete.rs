// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Completion: close an issue, record its outcome, report dependents.

use crate::error::{Error, Result};
use crate::graph::IssueGraph;
use crate::issue::{AuthorKind, Issue, Note, Status};

/// Result of completing an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub issue: Issue,
    pub note: Note,
    /// Todo issues that listed the completed issue as a blocker.
    ///
    /// These are candidates worth re-evaluating, not a promise of
    /// eligibility: any of them may still have another open blocker.
    pub candidates_newly_unblocked: Vec<Issue>,
}

/// Mark an issue done and attach `outcome` as an agent note.
///
/// The status write and the note are independent. If the note fails the
/// issue stays `done` and the error is [`Error::OutcomeNotRecorded`];
/// retry the note alone with [`record_outcome`].
pub fn complete<G: IssueGraph>(graph: &G, issue_id: &str, outcome: &str) -> Result<Completion> {
    let issue = graph.set_status(issue_id, Status::Done)?;

    let note = graph
        .create_note(issue_id, outcome, AuthorKind::Agent)
        .map_err(|e| Error::OutcomeNotRecorded {
            issue_id: issue_id.to_string(),
            source: Box::new(e),
        })?;

    let candidates_newly_unblocked: Vec<Issue> = graph
        .list_issues(Status::Todo, None)?
        .into_iter()
        .filter(|candidate| candidate.is_blocked_by(issue_id))
        .collect();

    tracing::info!(
        issue = %issue.id,
        candidates = candidates_newly_unblocked.len(),
        "completed issue"
    );

    Ok(Completion {
        issue,
        note,
        candidates_newly_unblocked,
    })
}

/// Attach an outcome note without touching status.
pub fn record_outcome<G: IssueGraph>(graph: &G, issue_id: &str, outcome: &str) -> Result<Note> {
    graph.create_note(issue_id, outcome, AuthorKind::Agent)
}

#[cfg(test)]
#[path = "complete_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Claiming: hand the best eligible issue to exactly one caller.
//!
//! The only ordering guarantee comes from
//! [`IssueGraph::compare_and_set_status`]. A caller that loses the race for
//! a candidate moves down its own snapshot of the queue; it never re-runs
//! the query, so one call performs at most `queue.len()` write attempts.
//!
//! Once a claim succeeds nothing may fail the call: the caller would never
//! learn which issue it now owns. Reload and prompt failures after that
//! point are logged and degrade the result instead.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::graph::IssueGraph;
use crate::issue::{Issue, Status};
use crate::prompt::{match_template, HydratedPrompt};
use crate::queue::{build_queue, QueueFilter};
use crate::score::ScoreWeights;

/// A successfully claimed issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// The issue as stored after the transition to `in_progress`.
    pub issue: Issue,
    /// `None` when no template matches; not an error.
    pub prompt: Option<HydratedPrompt>,
    /// Higher-ranked candidates another caller took first.
    pub skipped: Vec<String>,
}

/// Move one issue from `todo` to `in_progress`.
///
/// Fails with [`Error::Conflict`] when the issue is no longer `todo`, and
/// with [`Error::ClaimNotLoaded`] when the claim went through but the
/// issue could not be read back.
pub fn claim_issue<G: IssueGraph>(graph: &G, issue_id: &str) -> Result<Issue> {
    if !graph.compare_and_set_status(issue_id, Status::Todo, Status::InProgress)? {
        return Err(Error::Conflict {
            issue_id: issue_id.to_string(),
        });
    }
    graph.get_issue(issue_id).map_err(|e| Error::ClaimNotLoaded {
        issue_id: issue_id.to_string(),
        source: Box::new(e),
    })
}

/// Claim the highest-ranked eligible issue, or `Ok(None)` when the queue
/// is empty or every candidate was taken by someone else.
pub fn claim_next<G: IssueGraph>(
    graph: &G,
    filter: &QueueFilter,
    weights: &ScoreWeights,
    now: DateTime<Utc>,
) -> Result<Option<Claim>> {
    let queue = build_queue(graph, filter, weights, now)?;
    if queue.is_empty() {
        return Ok(None);
    }
    let templates = graph.list_active_templates()?;
    let mut skipped = Vec::new();

    for entry in &queue {
        let id = entry.issue.id.as_str();
        let issue = match claim_issue(graph, id) {
            Ok(issue) => issue,
            Err(Error::Conflict { issue_id }) => {
                tracing::debug!(issue = %issue_id, "lost claim race, trying next candidate");
                skipped.push(issue_id);
                continue;
            }
            Err(Error::ClaimNotLoaded { issue_id, source }) => {
                tracing::warn!(issue = %issue_id, "claimed issue not reloaded, using queued copy: {source}");
                let mut issue = entry.issue.clone();
                issue.status = Status::InProgress;
                issue
            }
            Err(e) => return Err(e),
        };

        tracing::info!(issue = %issue.id, score = entry.score, "claimed issue");
        let prompt = match match_template(graph, &issue, &templates) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(issue = %issue.id, "claimed without a prompt: {e}");
                None
            }
        };
        return Ok(Some(Claim {
            issue,
            prompt,
            skipped,
        }));
    }

    if !skipped.is_empty() {
        tracing::debug!(lost = skipped.len(), "queue exhausted by concurrent claimers");
    }
    Ok(None)
}

#[cfg(test)]
#[path = "claim_tests.rs"]
mod tests;

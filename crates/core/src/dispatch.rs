// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Caller-facing operations: get the next task, preview the queue,
//! complete a task.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::claim::claim_next;
use crate::complete::{complete, record_outcome};
use crate::error::Result;
use crate::graph::IssueGraph;
use crate::issue::{Issue, IssueType, Note, Priority, Status};
use crate::prompt::PromptMeta;
use crate::queue::{build_queue, QueueEntry, QueueFilter};
use crate::score::ScoreWeights;

/// Largest page `preview_queue` returns.
pub const MAX_PREVIEW_LIMIT: usize = 200;

/// The fields of an issue an agent needs to start work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct IssueSummary {
    pub id: String,
    pub number: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub priority: Priority,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl From<&Issue> for IssueSummary {
    fn from(issue: &Issue) -> Self {
        IssueSummary {
            id: issue.id.clone(),
            number: issue.number,
            title: issue.title.clone(),
            description: issue.description.clone(),
            issue_type: issue.issue_type,
            priority: issue.priority,
            status: issue.status,
            project_id: issue.project_id.clone(),
        }
    }
}

/// A claimed issue with its rendered instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct NextTask {
    pub issue: IssueSummary,
    /// `None` when no template matched the issue.
    pub prompt: Option<String>,
    pub meta: Option<PromptMeta>,
    /// Candidates lost to concurrent claimers during this call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

/// One page of the ranked queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct QueuePreview {
    pub items: Vec<QueueEntry>,
    /// Size of the whole eligible queue, not just this page.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CompletionReport {
    pub issue: IssueSummary,
    pub note: Note,
    pub candidates_newly_unblocked: Vec<IssueSummary>,
}

/// Stateless front end over an [`IssueGraph`].
///
/// Any number of dispatchers may share one store; each call reads what it
/// needs and the claim guarantee comes from the store alone.
pub struct Dispatcher<G> {
    graph: G,
    weights: ScoreWeights,
}

impl<G: IssueGraph> Dispatcher<G> {
    pub fn new(graph: G) -> Self {
        Self::with_weights(graph, ScoreWeights::default())
    }

    pub fn with_weights(graph: G, weights: ScoreWeights) -> Self {
        Dispatcher { graph, weights }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Claim the best eligible issue. `Ok(None)` means no work is available.
    pub fn next_task(&self, project: Option<&str>) -> Result<Option<NextTask>> {
        let filter = filter_for(project);
        let claim = claim_next(&self.graph, &filter, &self.weights, Utc::now())?;
        Ok(claim.map(|c| {
            let (prompt, meta) = match c.prompt {
                Some(p) => (Some(p.text), Some(p.meta)),
                None => (None, None),
            };
            NextTask {
                issue: IssueSummary::from(&c.issue),
                prompt,
                meta,
                skipped: c.skipped,
            }
        }))
    }

    /// Read-only page of the ranked queue. `limit` is clamped to 1..=200.
    pub fn preview_queue(
        &self,
        project: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<QueuePreview> {
        let queue = build_queue(
            &self.graph,
            &filter_for(project),
            &self.weights,
            Utc::now(),
        )?;
        let total = queue.len();
        let items = queue
            .into_iter()
            .skip(offset)
            .take(limit.clamp(1, MAX_PREVIEW_LIMIT))
            .collect();
        Ok(QueuePreview { items, total })
    }

    pub fn complete_task(&self, issue_id: &str, outcome: &str) -> Result<CompletionReport> {
        let done = complete(&self.graph, issue_id, outcome)?;
        Ok(CompletionReport {
            issue: IssueSummary::from(&done.issue),
            note: done.note,
            candidates_newly_unblocked: done
                .candidates_newly_unblocked
                .iter()
                .map(IssueSummary::from)
                .collect(),
        })
    }

    /// Retry just the outcome note after [`crate::Error::OutcomeNotRecorded`].
    pub fn record_outcome(&self, issue_id: &str, outcome: &str) -> Result<Note> {
        record_outcome(&self.graph, issue_id, outcome)
    }
}

fn filter_for(project: Option<&str>) -> QueueFilter {
    QueueFilter {
        project_id: project.map(str::to_string),
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

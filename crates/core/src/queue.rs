// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue building: eligibility filtering and deterministic ranking.
//!
//! Building a queue is read-only and can run concurrently with anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::Result;
use crate::graph::IssueGraph;
use crate::issue::{Issue, Status};
use crate::score::{score, ScoreBreakdown, ScoreWeights, ScoringContext};

/// Narrows the candidate set before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueFilter {
    pub project_id: Option<String>,
}

impl QueueFilter {
    pub fn project(project_id: impl Into<String>) -> Self {
        QueueFilter {
            project_id: Some(project_id.into()),
        }
    }
}

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct QueueEntry {
    pub issue: Issue,
    pub score: i64,
    pub breakdown: ScoreBreakdown,
}

/// Total order over queue entries: score desc, priority asc, created_at asc, id asc.
pub fn compare_entries(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.issue.priority.cmp(&b.issue.priority))
        .then_with(|| a.issue.created_at.cmp(&b.issue.created_at))
        .then_with(|| a.issue.id.cmp(&b.issue.id))
}

/// Drop ineligible issues, score the rest and sort them.
pub fn rank(issues: Vec<Issue>, ctx: &ScoringContext) -> Vec<QueueEntry> {
    let mut entries: Vec<QueueEntry> = issues
        .into_iter()
        .filter(Issue::is_eligible)
        .map(|issue| {
            let breakdown = score(&issue, ctx);
            QueueEntry {
                score: breakdown.total(),
                breakdown,
                issue,
            }
        })
        .collect();
    entries.sort_by(compare_entries);
    entries
}

/// Build the full ordered queue of eligible issues.
pub fn build_queue<G: IssueGraph>(
    graph: &G,
    filter: &QueueFilter,
    weights: &ScoreWeights,
    now: DateTime<Utc>,
) -> Result<Vec<QueueEntry>> {
    let candidates = graph.list_issues(Status::Todo, filter.project_id.as_deref())?;
    let goals = graph.list_active_goals()?;
    let ctx = ScoringContext::new(now, weights.clone(), &goals);

    let considered = candidates.len();
    let queue = rank(candidates, &ctx);
    tracing::debug!(
        considered,
        eligible = queue.len(),
        project = filter.project_id.as_deref().unwrap_or("*"),
        "built dispatch queue"
    );
    Ok(queue)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

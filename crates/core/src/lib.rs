// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! lq-core: dispatch queue and claim engine for the loopq work tracker.
//!
//! Agents pull work one issue at a time. This crate ranks the eligible
//! backlog, hands the top issue to exactly one caller, attaches the best
//! matching prompt template, and reports which dependents a completion
//! may have unblocked.
//!
//! Storage lives behind the [`IssueGraph`] trait; [`Database`] is the
//! SQLite implementation. The engine itself keeps no state between calls.

pub mod claim;
pub mod complete;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod goal;
pub mod graph;
pub mod issue;
pub mod prompt;
pub mod queue;
pub mod score;

#[cfg(test)]
#[path = "testing.rs"]
pub(crate) mod testing;

pub use claim::{claim_next, Claim};
pub use complete::{complete, record_outcome, Completion};
pub use db::Database;
pub use dispatch::{CompletionReport, Dispatcher, IssueSummary, NextTask, QueuePreview};
pub use error::{Error, Result};
pub use goal::{Goal, GoalStatus};
pub use graph::IssueGraph;
pub use issue::{
    AuthorKind, Issue, IssueRelation, IssueType, Note, Priority, RelationType, Status,
};
pub use prompt::{
    HydratedPrompt, HydrationContext, MatchContext, PromptMeta, PromptRenderer, PromptTemplate,
    PromptVersion, TemplateConditions, VersionStatus,
};
pub use queue::{build_queue, QueueEntry, QueueFilter};
pub use score::{ScoreBreakdown, ScoreWeights, ScoringContext};

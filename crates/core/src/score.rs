// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic issue scoring.
//!
//! `total = priority_weight + goal_bonus + age_bonus + type_bonus`, with
//! every component drawn from a fixed table so rankings are explainable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::goal::Goal;
use crate::issue::{Issue, IssueType, Priority};

/// Weight per priority level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub urgent: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
    pub none: i64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        PriorityWeights {
            urgent: 100,
            high: 75,
            medium: 50,
            low: 25,
            none: 10,
        }
    }
}

impl PriorityWeights {
    pub fn weight(&self, priority: Priority) -> i64 {
        match priority.value() {
            1 => self.urgent,
            2 => self.high,
            3 => self.medium,
            4 => self.low,
            _ => self.none,
        }
    }
}

/// Bonus per issue type. Detection work outranks routine tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeWeights {
    pub signal: i64,
    pub hypothesis: i64,
    pub plan: i64,
    pub task: i64,
    pub monitor: i64,
}

impl Default for TypeWeights {
    fn default() -> Self {
        TypeWeights {
            signal: 50,
            hypothesis: 40,
            plan: 30,
            task: 20,
            monitor: 10,
        }
    }
}

impl TypeWeights {
    pub fn bonus(&self, issue_type: IssueType) -> i64 {
        match issue_type {
            IssueType::Signal => self.signal,
            IssueType::Hypothesis => self.hypothesis,
            IssueType::Plan => self.plan,
            IssueType::Task => self.task,
            IssueType::Monitor => self.monitor,
        }
    }
}

/// Tunable scoring constants. Loaded from the `[scoring]` config table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Flat bonus for issues in a project whose active goal is at risk.
    pub goal_bonus: i64,
    /// A goal is at risk while `current / target` is below this ratio.
    pub goal_at_risk_ratio: f64,
    pub age_bonus_per_day: i64,
    /// Upper bound on the age bonus.
    pub max_age_bonus: i64,
    pub priority: PriorityWeights,
    pub types: TypeWeights,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            goal_bonus: 20,
            goal_at_risk_ratio: 1.0,
            age_bonus_per_day: 1,
            max_age_bonus: 30,
            priority: PriorityWeights::default(),
            types: TypeWeights::default(),
        }
    }
}

/// Everything the scorer needs besides the issue itself.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub now: DateTime<Utc>,
    pub weights: ScoreWeights,
    /// Projects with at least one active, behind-target goal.
    pub at_risk_projects: HashSet<String>,
}

impl ScoringContext {
    pub fn new(now: DateTime<Utc>, weights: ScoreWeights, goals: &[Goal]) -> Self {
        let at_risk_projects = goals
            .iter()
            .filter(|g| g.is_at_risk(weights.goal_at_risk_ratio))
            .filter_map(|g| g.project_id.clone())
            .collect();
        ScoringContext {
            now,
            weights,
            at_risk_projects,
        }
    }
}

/// Additive components of an issue's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ScoreBreakdown {
    pub priority_weight: i64,
    pub goal_bonus: i64,
    pub age_bonus: i64,
    pub type_bonus: i64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i64 {
        self.priority_weight + self.goal_bonus + self.age_bonus + self.type_bonus
    }
}

/// Score one issue. Pure: same issue and context always give the same result.
pub fn score(issue: &Issue, ctx: &ScoringContext) -> ScoreBreakdown {
    let w = &ctx.weights;

    let goal_bonus = match &issue.project_id {
        Some(p) if ctx.at_risk_projects.contains(p) => w.goal_bonus,
        _ => 0,
    };

    let days = (ctx.now - issue.created_at).num_days().max(0);
    let age_bonus = days
        .saturating_mul(w.age_bonus_per_day)
        .clamp(0, w.max_age_bonus.max(0));

    ScoreBreakdown {
        priority_weight: w.priority.weight(issue.priority),
        goal_bonus,
        age_bonus,
        type_bonus: w.types.bonus(issue.issue_type),
    }
}

#[cfg(test)]
#[path = "score_tests.rs"]
mod tests;

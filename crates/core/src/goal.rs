// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Goals: measurable targets attached to projects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Achieved,
    Abandoned,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Achieved => "achieved",
            GoalStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(GoalStatus::Active),
            "achieved" => Ok(GoalStatus::Achieved),
            "abandoned" => Ok(GoalStatus::Abandoned),
            _ => Err(Error::InvalidInput(format!("invalid goal status: '{s}'"))),
        }
    }
}

/// A measurable target, optionally linked to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub title: String,
    pub status: GoalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
}

impl Goal {
    /// Progress toward the target, or `None` when there is no positive target.
    pub fn progress(&self) -> Option<f64> {
        match self.target_value {
            Some(target) if target > 0.0 => Some(self.current_value.unwrap_or(0.0) / target),
            _ => None,
        }
    }

    /// An active goal whose progress is below `threshold`.
    ///
    /// Goals without a usable target count as at risk while active.
    pub fn is_at_risk(&self, threshold: f64) -> bool {
        self.status == GoalStatus::Active && self.progress().map_or(true, |p| p < threshold)
    }
}

#[cfg(test)]
#[path = "goal_tests.rs"]
mod tests;

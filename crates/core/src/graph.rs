// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The storage contract the dispatch engine runs against.

use crate::error::Result;
use crate::goal::Goal;
use crate::issue::{AuthorKind, Issue, Note, Status};
use crate::prompt::PromptTemplate;

/// Read and write access to issues and their relations.
///
/// Each method is a single atomic operation against the store. The engine
/// never holds locks of its own; the only ordering guarantee it relies on
/// is [`IssueGraph::compare_and_set_status`].
pub trait IssueGraph {
    /// Issues in `status`, optionally narrowed to one project, with labels
    /// and relations populated.
    fn list_issues(&self, status: Status, project_id: Option<&str>) -> Result<Vec<Issue>>;

    fn get_issue(&self, id: &str) -> Result<Issue>;

    /// Every issue whose parent is `parent_id`, in any status.
    fn list_children(&self, parent_id: &str) -> Result<Vec<Issue>>;

    /// Set `status` to `new` only if it is currently `expected`.
    ///
    /// Returns `false` when the issue is missing or its status differs.
    fn compare_and_set_status(&self, id: &str, expected: Status, new: Status) -> Result<bool>;

    /// Unconditional status write.
    fn set_status(&self, id: &str, status: Status) -> Result<Issue>;

    fn create_note(&self, issue_id: &str, body: &str, author: AuthorKind) -> Result<Note>;

    /// Templates whose active version is live.
    fn list_active_templates(&self) -> Result<Vec<PromptTemplate>>;

    fn list_active_goals(&self) -> Result<Vec<Goal>>;
}

impl<G: IssueGraph + ?Sized> IssueGraph for &G {
    fn list_issues(&self, status: Status, project_id: Option<&str>) -> Result<Vec<Issue>> {
        (**self).list_issues(status, project_id)
    }

    fn get_issue(&self, id: &str) -> Result<Issue> {
        (**self).get_issue(id)
    }

    fn list_children(&self, parent_id: &str) -> Result<Vec<Issue>> {
        (**self).list_children(parent_id)
    }

    fn compare_and_set_status(&self, id: &str, expected: Status, new: Status) -> Result<bool> {
        (**self).compare_and_set_status(id, expected, new)
    }

    fn set_status(&self, id: &str, status: Status) -> Result<Issue> {
        (**self).set_status(id, status)
    }

    fn create_note(&self, issue_id: &str, body: &str, author: AuthorKind) -> Result<Note> {
        (**self).create_note(issue_id, body, author)
    }

    fn list_active_templates(&self) -> Result<Vec<PromptTemplate>> {
        (**self).list_active_templates()
    }

    fn list_active_goals(&self) -> Result<Vec<Goal>> {
        (**self).list_active_goals()
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt templates: condition matching, selection and hydration.
//!
//! A claimed issue is paired with the most specific template whose
//! conditions it satisfies. The template's active version is a Handlebars
//! template rendered against a [`HydrationContext`] loaded from the graph.
//!
//! Rendering is lenient: missing values render as empty strings and
//! nothing is HTML-escaped, since prompts are plain text.

use chrono::{DateTime, Utc};
use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::goal::Goal;
use crate::graph::IssueGraph;
use crate::issue::{Issue, IssueType, Priority, RelationType, Status};

/// Lifecycle state of a prompt version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Active,
    Draft,
    Retired,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Active => "active",
            VersionStatus::Draft => "draft",
            VersionStatus::Retired => "retired",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(VersionStatus::Active),
            "draft" => Ok(VersionStatus::Draft),
            "retired" => Ok(VersionStatus::Retired),
            _ => Err(Error::InvalidInput(format!("invalid version status: '{s}'"))),
        }
    }
}

/// An immutable content snapshot of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    pub id: String,
    pub template_id: String,
    /// Monotonic version number within the template.
    pub version: i64,
    pub content: String,
    pub status: VersionStatus,
    #[serde(default)]
    pub usage_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f64>,
    /// When this version was last promoted to active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A named instruction template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// Raw condition object as stored. Parsed with [`TemplateConditions::parse`].
    #[serde(default)]
    pub conditions: serde_json::Value,
    pub specificity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_version: Option<PromptVersion>,
}

impl PromptTemplate {
    /// The active version, if there is one and it is still marked active.
    pub fn live_version(&self) -> Option<&PromptVersion> {
        self.active_version
            .as_ref()
            .filter(|v| v.status == VersionStatus::Active)
    }
}

/// Issue attributes a template can require. Every present key must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConditions {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    /// All of these labels must be on the issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(alias = "projectId", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(alias = "signalSource", default, skip_serializing_if = "Option::is_none")]
    pub signal_source: Option<String>,
    /// Whether an earlier attempt under the same parent was abandoned.
    #[serde(alias = "hasFailedSessions", default, skip_serializing_if = "Option::is_none")]
    pub has_failed_sessions: Option<bool>,
    /// Minimum hypothesis confidence, in 0..=1.
    #[serde(
        alias = "hypothesisConfidence",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hypothesis_confidence: Option<f64>,
}

impl TemplateConditions {
    /// Parse a stored condition object. `null` is the same as `{}`.
    pub fn parse(slug: &str, raw: &serde_json::Value) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedConditions {
            slug: slug.to_string(),
            reason,
        };
        if raw.is_null() {
            return Ok(TemplateConditions::default());
        }
        let conditions =
            TemplateConditions::deserialize(raw).map_err(|e| malformed(e.to_string()))?;
        if let Some(min) = conditions.hypothesis_confidence {
            if !(0.0..=1.0).contains(&min) {
                return Err(malformed(format!(
                    "hypothesis_confidence must be within 0..=1, got {min}"
                )));
            }
        }
        Ok(conditions)
    }

    pub fn matches(&self, ctx: &MatchContext<'_>) -> bool {
        let issue = ctx.issue;
        if self.issue_type.is_some_and(|t| t != issue.issue_type) {
            return false;
        }
        if let Some(required) = &self.labels {
            if !required.iter().all(|l| issue.labels.contains(l)) {
                return false;
            }
        }
        if let Some(project) = &self.project_id {
            if issue.project_id.as_ref() != Some(project) {
                return false;
            }
        }
        if let Some(source) = &self.signal_source {
            if issue.signal_source.as_ref() != Some(source) {
                return false;
            }
        }
        if self
            .has_failed_sessions
            .is_some_and(|wanted| wanted != ctx.has_failed_sessions)
        {
            return false;
        }
        if let Some(min) = self.hypothesis_confidence {
            match issue.hypothesis_confidence {
                Some(confidence) if confidence >= min => {}
                _ => return false,
            }
        }
        true
    }
}

/// What template conditions are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub issue: &'a Issue,
    /// A canceled sibling under the same parent carries an agent summary.
    pub has_failed_sessions: bool,
}

impl<'a> MatchContext<'a> {
    pub fn new(issue: &'a Issue) -> Self {
        MatchContext {
            issue,
            has_failed_sessions: false,
        }
    }

    pub fn load<G: IssueGraph>(graph: &G, issue: &'a Issue) -> Result<Self> {
        let has_failed_sessions = match &issue.parent_id {
            Some(parent) => graph
                .list_children(parent)?
                .iter()
                .any(Issue::is_failed_session),
            None => false,
        };
        Ok(MatchContext {
            issue,
            has_failed_sessions,
        })
    }
}

/// Identifies which template and version produced a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct PromptMeta {
    pub template_id: String,
    pub template_slug: String,
    pub version_id: String,
    pub version_number: i64,
}

/// Rendered instructions for a claimed issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydratedPrompt {
    pub text: String,
    pub meta: PromptMeta,
}

/// Higher specificity first, then the most recently promoted version.
fn compare_candidates(
    a: &(&PromptTemplate, &PromptVersion),
    b: &(&PromptTemplate, &PromptVersion),
) -> Ordering {
    b.0.specificity
        .cmp(&a.0.specificity)
        .then_with(|| match (a.1.promoted_at, b.1.promoted_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.0.slug.cmp(&b.0.slug))
}

/// Every live template whose conditions match, best first.
///
/// Templates with malformed conditions are logged and skipped so one bad
/// template cannot stop dispatch.
pub fn rank_templates<'a>(
    templates: &'a [PromptTemplate],
    ctx: &MatchContext<'_>,
) -> Vec<(&'a PromptTemplate, &'a PromptVersion)> {
    let mut candidates: Vec<_> = templates
        .iter()
        .filter_map(|t| {
            let version = t.live_version()?;
            match TemplateConditions::parse(&t.slug, &t.conditions) {
                Ok(conditions) if conditions.matches(ctx) => Some((t, version)),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(template = %t.slug, "skipping template: {e}");
                    None
                }
            }
        })
        .collect();
    candidates.sort_by(compare_candidates);
    candidates
}

/// Pick the best template for an issue.
pub fn select_template<'a>(
    templates: &'a [PromptTemplate],
    ctx: &MatchContext<'_>,
) -> Option<(&'a PromptTemplate, &'a PromptVersion)> {
    rank_templates(templates, ctx).into_iter().next()
}

/// Number and title of a related issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRef {
    pub id: String,
    pub number: i64,
    pub title: String,
    pub status: Status,
}

impl From<&Issue> for IssueRef {
    fn from(issue: &Issue) -> Self {
        IssueRef {
            id: issue.id.clone(),
            number: issue.number,
            title: issue.title.clone(),
            status: issue.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRef {
    pub name: String,
}

/// A previous attempt at the issue, as reported by the agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRef {
    pub status: Status,
    pub agent_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateRef {
    pub id: String,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionRef {
    pub id: String,
    pub number: i64,
}

/// Everything a template can reference while rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydrationContext {
    pub issue: Issue,
    pub parent: Option<Issue>,
    /// Other children of the same parent. Empty for top-level issues.
    pub siblings: Vec<Issue>,
    /// Direct children. Empty when the issue has a parent.
    pub children: Vec<Issue>,
    pub project: Option<ProjectRef>,
    pub goal: Option<Goal>,
    pub labels: Vec<LabelRef>,
    pub blocking: Vec<IssueRef>,
    pub blocked_by: Vec<IssueRef>,
    pub previous_sessions: Vec<SessionRef>,
    pub template: TemplateRef,
    pub version: VersionRef,
    pub meta: PromptMeta,
}

impl HydrationContext {
    /// Context from the issue alone, with no related issues or goal.
    pub fn new(issue: &Issue, template: &PromptTemplate, version: &PromptVersion) -> Self {
        HydrationContext {
            issue: issue.clone(),
            parent: None,
            siblings: Vec::new(),
            children: Vec::new(),
            project: issue.project_id.clone().map(|id| ProjectRef { id }),
            goal: None,
            labels: issue
                .labels
                .iter()
                .map(|name| LabelRef { name: name.clone() })
                .collect(),
            blocking: Vec::new(),
            blocked_by: Vec::new(),
            previous_sessions: issue
                .agent_summary
                .iter()
                .map(|summary| SessionRef {
                    status: issue.status,
                    agent_summary: summary.clone(),
                })
                .collect(),
            template: TemplateRef {
                id: template.id.clone(),
                slug: template.slug.clone(),
                name: template.name.clone(),
            },
            version: VersionRef {
                id: version.id.clone(),
                number: version.version,
            },
            meta: PromptMeta {
                template_id: template.id.clone(),
                template_slug: template.slug.clone(),
                version_id: version.id.clone(),
                version_number: version.version,
            },
        }
    }

    /// Full context: parent, family, blockers and the project's goal.
    pub fn load<G: IssueGraph>(
        graph: &G,
        issue: &Issue,
        template: &PromptTemplate,
        version: &PromptVersion,
    ) -> Result<Self> {
        let mut ctx = HydrationContext::new(issue, template, version);

        match &issue.parent_id {
            Some(parent_id) => {
                ctx.parent = find_issue(graph, parent_id)?;
                ctx.siblings = graph
                    .list_children(parent_id)?
                    .into_iter()
                    .filter(|s| s.id != issue.id)
                    .collect();
            }
            None => ctx.children = graph.list_children(&issue.id)?,
        }

        for relation in &issue.relations {
            let bucket = match relation.relation {
                RelationType::Blocks => &mut ctx.blocking,
                RelationType::BlockedBy => &mut ctx.blocked_by,
                RelationType::Related | RelationType::Duplicate => continue,
            };
            if let Some(target) = find_issue(graph, &relation.target_id)? {
                bucket.push(IssueRef::from(&target));
            }
        }

        if let Some(project) = &issue.project_id {
            ctx.goal = graph
                .list_active_goals()?
                .into_iter()
                .find(|g| g.project_id.as_ref() == Some(project));
        }
        Ok(ctx)
    }
}

/// `get_issue` with a vanished issue read as `None`.
fn find_issue<G: IssueGraph>(graph: &G, id: &str) -> Result<Option<Issue>> {
    match graph.get_issue(id) {
        Ok(issue) => Ok(Some(issue)),
        Err(Error::IssueNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Shared partials, usable as `{{> name}}` from any template.
const PARTIALS: &[(&str, &str)] = &[
    (
        "parent_context",
        "{{#if parent}}
## Parent Issue
#{{parent.number}} [{{parent.type}}]: {{parent.title}}
{{#if parent.description}}
{{parent.description}}
{{/if}}
{{/if}}",
    ),
    (
        "sibling_context",
        "{{#if siblings}}
## Sibling Issues
{{#each siblings}}
- #{{this.number}} [{{this.status}}]: {{this.title}}
{{/each}}
{{/if}}",
    ),
    (
        "blocker_context",
        "{{#if blocked_by}}
## Blocked By
{{#each blocked_by}}
- #{{this.number}} [{{this.status}}]: {{this.title}}
{{/each}}
{{/if}}
{{#if blocking}}
## Blocking
{{#each blocking}}
- #{{this.number}} [{{this.status}}]: {{this.title}}
{{/each}}
{{/if}}",
    ),
    (
        "project_and_goal_context",
        "{{#if project}}
## Project
{{project.id}}
{{#if goal}}
### Goal
{{goal.title}}
Progress: {{goal.current_value}} / {{goal.target_value}}
Status: {{goal.status}}
{{/if}}
{{/if}}",
    ),
];

handlebars_helper!(JsonHelper: |value: Json| {
    serde_json::to_string_pretty(value).unwrap_or_default()
});

handlebars_helper!(PriorityLabelHelper: |value: Json| {
    value
        .as_i64()
        .and_then(|n| Priority::try_from(n).ok())
        .map_or("unknown", |p| p.label())
});

/// Handlebars registry with the prompt helpers and partials installed.
pub struct PromptRenderer {
    registry: Handlebars<'static>,
}

impl PromptRenderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(no_escape);
        registry.register_helper("json", Box::new(JsonHelper));
        registry.register_helper("priority_label", Box::new(PriorityLabelHelper));
        for (name, content) in PARTIALS {
            registry
                .register_partial(name, *content)
                .map_err(|e| Error::Render {
                    slug: (*name).to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(PromptRenderer { registry })
    }

    /// Render one template version. Syntax errors are reported, not panicked on.
    pub fn render(&self, content: &str, ctx: &HydrationContext) -> Result<String> {
        self.registry
            .render_template(content, ctx)
            .map_err(|e| Error::Render {
                slug: ctx.template.slug.clone(),
                reason: e.to_string(),
            })
    }

    pub fn hydrate(
        &self,
        version: &PromptVersion,
        ctx: &HydrationContext,
    ) -> Result<HydratedPrompt> {
        Ok(HydratedPrompt {
            text: self.render(&version.content, ctx)?,
            meta: ctx.meta.clone(),
        })
    }
}

/// Select, load context for, and render the best template for `issue`.
///
/// A template that fails to render is logged and the next candidate is
/// tried. `Ok(None)` means nothing matched or nothing rendered.
pub fn match_template<G: IssueGraph>(
    graph: &G,
    issue: &Issue,
    templates: &[PromptTemplate],
) -> Result<Option<HydratedPrompt>> {
    let match_ctx = MatchContext::load(graph, issue)?;
    let candidates = rank_templates(templates, &match_ctx);
    if candidates.is_empty() {
        return Ok(None);
    }

    let renderer = PromptRenderer::new()?;
    for (template, version) in candidates {
        let ctx = HydrationContext::load(graph, issue, template, version)?;
        match renderer.hydrate(version, &ctx) {
            Ok(prompt) => return Ok(Some(prompt)),
            Err(e) => tracing::warn!(template = %template.slug, "skipping template: {e}"),
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;

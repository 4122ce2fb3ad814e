// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Text rendering for command output.

use lq_core::{CompletionReport, IssueSummary, IssueType, NextTask, Priority, QueueEntry, QueuePreview};

/// One-line issue header: `#12 iss-a [signal] urgent: Title`
fn issue_line(number: i64, id: &str, issue_type: IssueType, priority: Priority, title: &str) -> String {
    format!(
        "#{} {} [{}] {}: {}",
        number,
        id,
        issue_type,
        priority.label(),
        title
    )
}

pub fn format_summary(issue: &IssueSummary) -> String {
    issue_line(
        issue.number,
        &issue.id,
        issue.issue_type,
        issue.priority,
        &issue.title,
    )
}

/// Queue row with score and its components.
pub fn format_queue_entry(rank: usize, entry: &QueueEntry) -> String {
    let b = &entry.breakdown;
    format!(
        "{:>3}. {:>4}  {}  (priority {} + type {} + goal {} + age {})",
        rank,
        entry.score,
        issue_line(
            entry.issue.number,
            &entry.issue.id,
            entry.issue.issue_type,
            entry.issue.priority,
            &entry.issue.title,
        ),
        b.priority_weight,
        b.type_bonus,
        b.goal_bonus,
        b.age_bonus
    )
}

pub fn format_queue(preview: &QueuePreview, offset: usize) -> String {
    if preview.items.is_empty() {
        return if preview.total == 0 {
            "No eligible issues".to_string()
        } else {
            format!("No entries past offset {} ({} total)", offset, preview.total)
        };
    }

    let mut lines: Vec<String> = preview
        .items
        .iter()
        .enumerate()
        .map(|(i, entry)| format_queue_entry(offset + i + 1, entry))
        .collect();
    let shown_to = offset + preview.items.len();
    if shown_to < preview.total || offset > 0 {
        lines.push(format!(
            "\nShowing {}-{} of {}",
            offset + 1,
            shown_to,
            preview.total
        ));
    }
    lines.join("\n")
}

pub fn format_next_task(task: &NextTask) -> String {
    let mut out = format!("Claimed {}", format_summary(&task.issue));
    if let Some(meta) = &task.meta {
        out.push_str(&format!(
            "\nTemplate: {} v{}",
            meta.template_slug, meta.version_number
        ));
    }
    if !task.skipped.is_empty() {
        out.push_str(&format!(
            "\nSkipped (claimed by others): {}",
            task.skipped.join(", ")
        ));
    }
    match &task.prompt {
        Some(prompt) => {
            out.push_str("\n\n");
            out.push_str(prompt);
        }
        None => out.push_str("\n\n(no matching template)"),
    }
    out
}

pub fn format_completion(report: &CompletionReport) -> String {
    let mut out = format!("Completed {}", format_summary(&report.issue));
    if report.candidates_newly_unblocked.is_empty() {
        return out;
    }
    out.push_str("\n\nMay now be unblocked (re-check with 'lq queue'):");
    for issue in &report.candidates_newly_unblocked {
        out.push_str("\n  ");
        out.push_str(&format_summary(issue));
    }
    out
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;

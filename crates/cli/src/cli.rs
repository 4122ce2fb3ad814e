// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::help;
use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "lq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dispatch queue for agent work: rank, claim, complete")]
#[command(
    long_about = "Dispatch queue for agent work.\n\n\
    Ranks eligible issues, hands the best one to exactly one caller with a \
    rendered prompt, and reports what a completion may have unblocked."
)]
#[command(styles = help::styles())]
pub struct Cli {
    /// Run as if lq was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a loopq project in the current directory
    #[command(after_help = "\
Examples:
  lq init               Create .loopq/ here
  lq init --path repo   Create repo/.loopq/")]
    Init {
        /// Directory to initialize (defaults to the current directory)
        #[arg(long)]
        path: Option<String>,
    },

    /// Claim the highest-ranked eligible issue and print its prompt
    #[command(after_help = "\
Examples:
  lq next                 Claim from the whole queue
  lq next --project web   Only consider issues in project 'web'
  lq next -o json         Machine-readable output (null when empty)")]
    Next {
        /// Only consider issues in this project
        #[arg(long, short)]
        project: Option<String>,

        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show the ranked queue without claiming anything
    #[command(after_help = "\
Examples:
  lq queue                        Top 50 eligible issues
  lq queue --limit 10 --offset 10 Second page of ten
  lq queue -o json                Items with score breakdowns")]
    Queue {
        /// Only consider issues in this project
        #[arg(long, short)]
        project: Option<String>,

        /// Maximum number of entries (1-200)
        #[arg(long, short = 'n', default_value_t = 50)]
        limit: usize,

        /// Number of entries to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Mark an issue done and record its outcome
    #[command(after_help = "\
Examples:
  lq complete iss-1 \"Fixed null check in parser\"")]
    Complete {
        /// Issue ID
        id: String,

        /// Outcome summary, stored as an agent note
        #[arg(value_parser = non_empty_string)]
        outcome: String,

        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Load issues, relations, goals and templates from JSON Lines
    #[command(after_help = "\
Each line is an object tagged by \"kind\":
  {\"kind\":\"issue\",\"id\":\"a\",\"type\":\"task\",\"title\":\"Fix it\",\"priority\":2}
  {\"kind\":\"relation\",\"from\":\"b\",\"to\":\"a\",\"relation\":\"blocked_by\"}
  {\"kind\":\"label\",\"issue_id\":\"a\",\"label\":\"backend\"}
  {\"kind\":\"goal\",\"id\":\"g\",\"project_id\":\"web\",\"title\":\"Signups\",\"current_value\":10,\"target_value\":100}
  {\"kind\":\"template\",\"id\":\"t\",\"slug\":\"tasks\",\"conditions\":{\"type\":\"task\"},\"specificity\":3}
  {\"kind\":\"version\",\"id\":\"v\",\"template_id\":\"t\",\"version\":1,\"content\":\"Do {{issue.title}}\"}
  {\"kind\":\"promote\",\"version_id\":\"v\"}

Examples:
  lq import seed.jsonl         Load from a file
  cat seed.jsonl | lq import - Load from stdin")]
    Import {
        /// Input file, or '-' for stdin
        file: String,

        /// Validate the input without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Output JSON Schema for commands with JSON output
    #[command(subcommand)]
    Schema(SchemaCommand),
}

/// Schema output commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Subcommand)]
pub enum SchemaCommand {
    /// Output JSON Schema for 'lq next -o json'
    Next,
    /// Output JSON Schema for 'lq queue -o json'
    Queue,
    /// Output JSON Schema for 'lq complete -o json'
    Complete,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

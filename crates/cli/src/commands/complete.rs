// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use lq_core::{CompletionReport, Dispatcher, IssueGraph};

use crate::cli::OutputFormat;
use crate::display::format_completion;
use crate::error::Result;

use super::{open_dispatcher, print_json};

pub fn run(id: &str, outcome: &str, format: OutputFormat) -> Result<()> {
    let dispatcher = open_dispatcher()?;
    run_impl(&dispatcher, id, outcome, format).map(|_| ())
}

pub(crate) fn run_impl<G: IssueGraph>(
    dispatcher: &Dispatcher<G>,
    id: &str,
    outcome: &str,
    format: OutputFormat,
) -> Result<CompletionReport> {
    let report = dispatcher.complete_task(id, outcome)?;

    match format {
        OutputFormat::Text => println!("{}", format_completion(&report)),
        OutputFormat::Json => print_json(&report)?,
    }

    Ok(report)
}

#[cfg(test)]
#[path = "complete_tests.rs"]
mod tests;

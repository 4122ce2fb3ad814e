// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use lq_core::{Dispatcher, IssueGraph, NextTask};

use crate::cli::OutputFormat;
use crate::display::format_next_task;
use crate::error::Result;

use super::{open_dispatcher, print_json};

pub fn run(project: Option<&str>, format: OutputFormat) -> Result<()> {
    let dispatcher = open_dispatcher()?;
    run_impl(&dispatcher, project, format).map(|_| ())
}

/// Claim and print. Returns what was claimed so tests can inspect it.
pub(crate) fn run_impl<G: IssueGraph>(
    dispatcher: &Dispatcher<G>,
    project: Option<&str>,
    format: OutputFormat,
) -> Result<Option<NextTask>> {
    let task = dispatcher.next_task(project)?;

    match format {
        OutputFormat::Text => match &task {
            Some(t) => println!("{}", format_next_task(t)),
            None => println!("No work available"),
        },
        OutputFormat::Json => print_json(&task)?,
    }

    Ok(task)
}

#[cfg(test)]
#[path = "next_tests.rs"]
mod tests;

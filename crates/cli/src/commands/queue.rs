// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use lq_core::{Dispatcher, IssueGraph, QueuePreview};

use crate::cli::OutputFormat;
use crate::display::format_queue;
use crate::error::Result;

use super::{open_dispatcher, print_json};

pub fn run(project: Option<&str>, limit: usize, offset: usize, format: OutputFormat) -> Result<()> {
    let dispatcher = open_dispatcher()?;
    run_impl(&dispatcher, project, limit, offset, format).map(|_| ())
}

pub(crate) fn run_impl<G: IssueGraph>(
    dispatcher: &Dispatcher<G>,
    project: Option<&str>,
    limit: usize,
    offset: usize,
    format: OutputFormat,
) -> Result<QueuePreview> {
    let preview = dispatcher.preview_queue(project, limit, offset)?;

    match format {
        OutputFormat::Text => println!("{}", format_queue(&preview, offset)),
        OutputFormat::Json => print_json(&preview)?,
    }

    Ok(preview)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

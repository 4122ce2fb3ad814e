// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Schema command implementation.
//!
//! Outputs JSON Schema specifications for commands that support JSON output.

use lq_core::{CompletionReport, NextTask, QueuePreview};
use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::cli::SchemaCommand;
use crate::error::Result;

pub(crate) fn schema(cmd: SchemaCommand) -> RootSchema {
    match cmd {
        // `lq next -o json` prints `null` when nothing is claimable.
        SchemaCommand::Next => schema_for!(Option<NextTask>),
        SchemaCommand::Queue => schema_for!(QueuePreview),
        SchemaCommand::Complete => schema_for!(CompletionReport),
    }
}

/// Run the schema command.
pub fn run(cmd: SchemaCommand) -> Result<()> {
    let json = serde_json::to_string_pretty(&schema(cmd))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

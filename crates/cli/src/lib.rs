// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! lqrs - command-line front end for the loopq dispatch engine.
//!
//! Agents call `lq next` to claim the highest-ranked eligible issue and
//! receive its rendered prompt, then `lq complete` to close it. Humans use
//! `lq queue` to inspect the ranking and `lq import` to load work.
//!
//! ```rust,ignore
//! use lqrs::{find_project_dir, get_db_path, Config};
//!
//! let project_dir = find_project_dir()?;
//! let config = Config::load(&project_dir)?;
//! let db = lq_core::Database::open(&get_db_path(&project_dir, &config))?;
//! ```

mod cli;
mod commands;
mod display;
pub mod help;

pub mod config;
pub mod error;

pub use cli::{Cli, Command, OutputFormat, SchemaCommand};
pub use config::{find_project_dir, get_db_path, init_project_dir, Config};
pub use error::{Error, Result};

/// Environment variable holding the log filter (`tracing` directives).
pub const LOG_ENV: &str = "LQ_LOG";

/// Install the stderr log subscriber. Defaults to `warn`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Init { path } => commands::init::run(path),
        Command::Next { project, output } => commands::next::run(project.as_deref(), output),
        Command::Queue {
            project,
            limit,
            offset,
            output,
        } => commands::queue::run(project.as_deref(), limit, offset, output),
        Command::Complete {
            id,
            outcome,
            output,
        } => commands::complete::run(&id, &outcome, output),
        Command::Import { file, dry_run } => commands::import::run(&file, dry_run),
        Command::Schema(cmd) => commands::schema::run(cmd),
    }
}

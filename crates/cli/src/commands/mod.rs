// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod complete;
pub mod import;
pub mod init;
pub mod next;
pub mod queue;
pub mod schema;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use lq_core::{Database, Dispatcher};
use serde::Serialize;

use crate::config::{find_project_dir, get_db_path, Config};
use crate::error::Result;

/// Helper to open the database from the current context.
pub fn open_db() -> Result<(Database, Config)> {
    let project_dir = find_project_dir()?;
    let config = Config::load(&project_dir)?;
    let db_path = get_db_path(&project_dir, &config);
    tracing::debug!(path = %db_path.display(), "opening database");
    let db = Database::open(&db_path)?;
    Ok((db, config))
}

/// Open the project database behind a dispatcher using configured weights.
pub fn open_dispatcher() -> Result<Dispatcher<Database>> {
    let (db, config) = open_db()?;
    Ok(Dispatcher::with_weights(db, config.scoring))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

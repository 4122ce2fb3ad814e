// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use lq_core::Database;

use crate::config::{get_db_path, init_project_dir, Config};
use crate::error::Result;

pub fn run(path: Option<String>) -> Result<()> {
    let target = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    let project_dir = run_impl(&target)?;
    println!("Initialized loopq in {}", project_dir.display());
    Ok(())
}

/// Create `.loopq/` under `target` and its empty database.
pub(crate) fn run_impl(target: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(target)?;
    let project_dir = init_project_dir(target)?;
    let config = Config::load(&project_dir)?;
    Database::open(&get_db_path(&project_dir, &config))?;
    tracing::info!(path = %project_dir.display(), "initialized project");
    Ok(project_dir)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;

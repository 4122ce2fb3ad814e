// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.loopq/config.toml` and includes:
//! - `database`: Optional path to the SQLite file, relative to the project root
//! - `[scoring]`: Overrides for the queue scoring weights

use lq_core::ScoreWeights;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const PROJECT_DIR_NAME: &str = ".loopq";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "issues.db";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Project configuration stored in `.loopq/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database path, relative to the project root or absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Every key is optional; missing keys keep their defaults.
    #[serde(default)]
    pub scoring: ScoreWeights,
}

impl Config {
    /// Loads configuration from the given `.loopq/` directory.
    ///
    /// A missing file is the default configuration.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves configuration to the given `.loopq/` directory.
    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(project_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }
}

/// Find the .loopq directory by walking up from the current directory.
pub fn find_project_dir() -> Result<PathBuf> {
    find_project_dir_from(&std::env::current_dir()?)
}

pub fn find_project_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let project_dir = current.join(PROJECT_DIR_NAME);
        if project_dir.is_dir() {
            return Ok(project_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Get the database path from config.
pub fn get_db_path(project_dir: &Path, config: &Config) -> PathBuf {
    match &config.database {
        Some(database) => {
            let path = Path::new(database);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                project_dir.parent().unwrap_or(project_dir).join(path)
            }
        }
        None => project_dir.join(DB_FILE_NAME),
    }
}

/// Initialize a new .loopq directory at the given path.
pub fn init_project_dir(path: &Path) -> Result<PathBuf> {
    let project_dir = path.join(PROJECT_DIR_NAME);

    if project_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(project_dir.display().to_string()));
    }

    fs::create_dir_all(&project_dir)?;
    Config::default().save(&project_dir)?;
    fs::write(
        project_dir.join(GITIGNORE_FILE_NAME),
        "# Local database\nissues.db\nissues.db-wal\nissues.db-shm\n",
    )?;

    Ok(project_dir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the lqrs library.
///
/// Engine errors pass through unchanged so their hints reach the user.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'lq init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error(transparent)]
    Core(#[from] lq_core::Error),

    #[error("line {line}: {reason}")]
    ParseLineError { line: usize, reason: String },

    #[error("line {line}: {source}")]
    ImportFailed {
        line: usize,
        #[source]
        source: lq_core::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when retrying the same command may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Core(e) | Error::ImportFailed { source: e, .. } => e.is_retryable(),
            Error::Io(_) => true,
            _ => false,
        }
    }
}

/// A specialized Result type for lqrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

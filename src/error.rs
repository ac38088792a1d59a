//! Fatal, process-level errors.
//!
//! Anything in here aborts the whole invocation before per-plugin work
//! begins. Per-plugin git failures are not errors; they are reported as
//! [`crate::report::ItemOutcome::Failed`] values.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VimpckError {
    /// None of the configured resolvers produced an existing file
    #[error("no configuration file found (looked in: {})", .searched.join(", "))]
    ConfigNotFound { searched: Vec<String> },

    #[error("failed to parse configuration file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The pack path must already exist for this operation
    #[error("pack path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

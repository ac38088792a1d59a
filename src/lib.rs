//! # vimpck
//!
//! A declarative package manager for the (n)vim native package directory.
//!
//! ## Overview
//!
//! `vimpck` reads a TOML file listing plugin repository URLs and where each
//! should live (`<package>/<start|opt>/<name>` under a pack path), compares
//! that with what is actually cloned on disk, and runs `git` to converge the
//! two: cloning what is missing, pulling what is installed and not frozen,
//! and deleting what is no longer declared.
//!
//! ## Architecture
//!
//! - Declared state: the validated, defaulted configuration ([`declared`], [`config`])
//! - Git subprocess wrapper with structured failures ([`git`])
//! - Installed state discovered from the pack directory ([`discovery`])
//! - Reconciliation passes and their set computations ([`pack`])
//! - Progress events and failure summaries ([`report`], [`logger`])
//! - Command handlers used by the binary ([`handlers`])

/// Configuration file resolution and the per-user config directory.
///
/// Candidate configuration locations are an explicit, ordered list of
/// [`config::ConfigSource`] values so loading never depends on ambient
/// environment lookups.
pub mod config;

/// The declared configuration model.
///
/// Parses the TOML configuration, fills in default `package`, `type` and
/// `freeze` values, rejects invalid declarations, and edits the file when
/// declarations are removed.
pub mod declared;

/// Installed plugin discovery from the pack directory tree.
pub mod discovery;

/// Fatal errors that abort an invocation.
pub mod error;

/// Git subprocess operations.
///
/// A closed set of operations (clone, pull, rev-list, log, remote lookup,
/// submodule init/update) mapped to argv and run with an optional timeout.
pub mod git;

/// Command handlers for the `vimpck` binary.
pub mod handlers;

/// Logging configuration and utilities.
///
/// Console logging via `RUST_LOG` plus an append-only log file in the
/// config directory recording every git invocation and plugin outcome.
pub mod logger;

/// Reconciliation between declared and installed plugins.
///
/// Install, upgrade, remove, clean and list passes, each processing one
/// plugin at a time and reporting outcomes as they happen.
pub mod pack;

/// Progress events, per-plugin outcomes and failure summaries.
pub mod report;

pub use declared::{DeclaredState, PluginEntry, PluginType};
pub use error::VimpckError;
pub use git::Git;
pub use pack::Reconciler;

//! Reconciliation between the declared configuration and the pack directory.
//!
//! Each pass computes its work from a fresh discovery, then walks the items
//! one at a time: one blocking git call per plugin, each outcome reported
//! before the next plugin starts. A failing plugin never stops the pass.
//!
//! Concurrent runs against the same pack path or configuration file are not
//! supported.

mod install;
mod list;
mod plan;
mod remove;
mod upgrade;

pub use list::ListedPlugin;
pub use plan::{orphans, select_by_name, to_install, upgrade_candidates};
pub use remove::Removal;

use crate::declared::DeclaredState;
use crate::discovery::{self, Installed};
use crate::error::VimpckError;
use crate::git::Git;

/// Drives git to converge the pack directory on the declared state
pub struct Reconciler<'a> {
    declared: &'a DeclaredState,
    git: &'a Git,
}

impl<'a> Reconciler<'a> {
    pub fn new(declared: &'a DeclaredState, git: &'a Git) -> Self {
        Self { declared, git }
    }

    pub fn declared(&self) -> &DeclaredState {
        self.declared
    }

    /// Fail with [`VimpckError::NotADirectory`] unless the pack path exists.
    pub fn require_pack_path(&self) -> Result<(), VimpckError> {
        let pack_path = self.declared.pack_path();
        if pack_path.is_dir() {
            Ok(())
        } else {
            Err(VimpckError::NotADirectory(pack_path.to_path_buf()))
        }
    }

    /// Discover what is currently installed under the pack path.
    pub fn installed(&self) -> Result<Installed, VimpckError> {
        discovery::discover(self.declared.pack_path(), self.git)
    }
}

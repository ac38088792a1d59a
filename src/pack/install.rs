use anyhow::{Context, Result};
use std::fs;

use super::plan::to_install;
use super::Reconciler;
use crate::declared::{plugin_dir, resolve_target_dir};
use crate::git::GitOp;
use crate::report::{Action, ItemFailure, ItemOutcome, ItemReport, Reporter};

impl Reconciler<'_> {
    /// Clone every declared plugin that is not installed yet.
    ///
    /// Creates the pack path when missing. Running it again with an
    /// unchanged configuration does nothing.
    pub fn install(&self, reporter: &mut dyn Reporter) -> Result<Vec<ItemReport>> {
        let pack_path = self.declared.pack_path();
        fs::create_dir_all(pack_path)
            .with_context(|| format!("Failed to create pack path: {}", pack_path.display()))?;

        let installed = self.installed()?;
        let pending = to_install(self.declared, &installed.urls());
        log::info!(
            "{} declared, {} installed, {} to install",
            self.declared.entries().len(),
            installed.len(),
            pending.len()
        );

        let mut reports = Vec::with_capacity(pending.len());
        for entry in pending {
            let name = entry.name();
            reporter.begin(Action::Install, &name);

            let target = resolve_target_dir(pack_path, entry);
            let outcome = match fs::create_dir_all(&target) {
                Err(e) => ItemOutcome::Failed(ItemFailure::Io {
                    path: target.clone(),
                    message: e.to_string(),
                }),
                Ok(()) => match self.git.run(&target, &GitOp::Clone(entry.url.clone())) {
                    Ok(_) => ItemOutcome::Installed {
                        dir: plugin_dir(pack_path, entry),
                    },
                    Err(failure) => ItemOutcome::Failed(ItemFailure::Git(failure)),
                },
            };

            let report = ItemReport {
                action: Action::Install,
                name,
                url: Some(entry.url.clone()),
                outcome,
            };
            reporter.finish(&report);
            reports.push(report);
        }

        Ok(reports)
    }
}

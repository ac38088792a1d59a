use anyhow::Result;

use super::plan::upgrade_candidates;
use super::Reconciler;
use crate::git::{humanish, GitOp};
use crate::report::{Action, ItemFailure, ItemOutcome, ItemReport, Reporter};

impl Reconciler<'_> {
    /// Pull every installed, unfrozen plugin, or only those named in `names`.
    ///
    /// Fails with [`crate::error::VimpckError::NotADirectory`] when the pack
    /// path has never been created.
    pub fn upgrade(&self, names: &[String], reporter: &mut dyn Reporter) -> Result<Vec<ItemReport>> {
        self.require_pack_path()?;
        let installed = self.installed()?;

        let candidates = upgrade_candidates(self.declared, &installed.urls(), names);
        for name in names {
            if !candidates.iter().any(|url| humanish(url) == *name) {
                log::warn!("'{}' is not an installed, unfrozen plugin; skipping", name);
            }
        }

        let mut reports = Vec::with_capacity(candidates.len());
        for url in candidates {
            let Some(plugin) = installed.find_url(&url) else {
                continue;
            };
            let dir = installed.abs_path(plugin);
            let name = plugin
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| humanish(&url));
            reporter.begin(Action::Upgrade, &name);

            let outcome = self.pull_one(&dir);
            let report = ItemReport {
                action: Action::Upgrade,
                name,
                url: Some(url),
                outcome,
            };
            reporter.finish(&report);
            reports.push(report);
        }

        Ok(reports)
    }

    fn pull_one(&self, dir: &std::path::Path) -> ItemOutcome {
        let before = match self.git.run(dir, &GitOp::RevList) {
            Ok(hash) => hash,
            Err(failure) => return ItemOutcome::Failed(ItemFailure::Git(failure)),
        };

        if let Err(failure) = self.git.run(dir, &GitOp::Pull) {
            return ItemOutcome::Failed(ItemFailure::Git(failure));
        }

        let after = match self.git.run(dir, &GitOp::RevList) {
            Ok(hash) => hash,
            Err(failure) => return ItemOutcome::Failed(ItemFailure::Git(failure)),
        };

        if before == after {
            return ItemOutcome::UpToDate;
        }

        let log = self
            .git
            .run(
                dir,
                &GitOp::Log {
                    from: before.clone(),
                    to: after.clone(),
                },
            )
            .map_err(|failure| log::debug!("Could not read commit range: {failure}"))
            .ok();

        ItemOutcome::Updated {
            from: before,
            to: after,
            log,
        }
    }
}

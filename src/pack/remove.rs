use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;

use super::plan::{orphans, select_by_name};
use super::Reconciler;
use crate::declared::remove_declarations;
use crate::discovery::{Installed, InstalledPlugin};
use crate::report::{Action, ItemFailure, ItemOutcome, ItemReport, Reporter};

/// Result of an `rm` pass
#[derive(Debug, Default)]
pub struct Removal {
    pub reports: Vec<ItemReport>,
    /// Declarations deleted from the configuration file
    pub forgotten: usize,
}

impl Reconciler<'_> {
    /// Delete the named plugins from disk.
    ///
    /// With `remove_config`, the declarations whose directory name matches
    /// are also deleted from the configuration file, in a single rewrite
    /// after all directories have been handled. Names matching nothing on
    /// disk are reported as skipped.
    pub fn remove(
        &self,
        names: &[String],
        remove_config: bool,
        reporter: &mut dyn Reporter,
    ) -> Result<Removal> {
        self.require_pack_path()?;
        let installed = self.installed()?;
        let (selected, unmatched) = select_by_name(&installed, names);

        let mut reports = Vec::new();
        for plugin in selected {
            reports.push(delete_one(&installed, plugin, Action::Remove, false, reporter));
        }
        for name in &unmatched {
            reporter.begin(Action::Remove, name);
            let report = ItemReport {
                action: Action::Remove,
                name: name.clone(),
                url: None,
                outcome: ItemOutcome::Skipped("not installed".to_string()),
            };
            reporter.finish(&report);
            reports.push(report);
        }

        let forgotten = if remove_config { self.forget(names)? } else { 0 };

        Ok(Removal { reports, forgotten })
    }

    /// Delete every installed plugin that is no longer declared.
    ///
    /// `confirm` sees the orphans first and can veto the whole pass; it is
    /// not consulted on a dry run or when there is nothing to delete.
    pub fn clean<F>(
        &self,
        dry_run: bool,
        confirm: F,
        reporter: &mut dyn Reporter,
    ) -> Result<Vec<ItemReport>>
    where
        F: FnOnce(&[&InstalledPlugin]) -> Result<bool>,
    {
        self.require_pack_path()?;
        let installed = self.installed()?;
        let orphans = orphans(self.declared, &installed);

        if orphans.is_empty() {
            log::info!("No orphaned plugins under {}", installed.root().display());
            return Ok(Vec::new());
        }
        if !dry_run && !confirm(&orphans[..])? {
            log::info!("Clean cancelled");
            return Ok(Vec::new());
        }

        let mut reports = Vec::with_capacity(orphans.len());
        for plugin in orphans {
            reports.push(delete_one(&installed, plugin, Action::Clean, dry_run, reporter));
        }
        Ok(reports)
    }

    /// Drop declarations matching `names` from the configuration file.
    fn forget(&self, names: &[String]) -> Result<usize> {
        let urls: BTreeSet<String> = names
            .iter()
            .flat_map(|name| self.declared.find_by_name(name))
            .map(|entry| entry.url.clone())
            .collect();

        if urls.is_empty() {
            log::warn!("No declarations match {}", names.join(", "));
            return Ok(0);
        }

        match self.declared.source() {
            Some(path) => {
                let urls: Vec<String> = urls.into_iter().collect();
                remove_declarations(path, &urls)
            }
            None => {
                log::warn!("Configuration was not loaded from a file; nothing to rewrite");
                Ok(0)
            }
        }
    }
}

fn delete_one(
    installed: &Installed,
    plugin: &InstalledPlugin,
    action: Action,
    dry_run: bool,
    reporter: &mut dyn Reporter,
) -> ItemReport {
    let name = plugin
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| plugin.rel_path.display().to_string());
    reporter.begin(action, &name);

    let dir = installed.abs_path(plugin);
    let outcome = if dry_run {
        ItemOutcome::WouldRemove { dir }
    } else {
        match fs::remove_dir_all(&dir) {
            Ok(()) => ItemOutcome::Removed { dir },
            Err(e) => ItemOutcome::Failed(ItemFailure::Io {
                path: dir,
                message: e.to_string(),
            }),
        }
    };

    let report = ItemReport {
        action,
        name,
        url: Some(plugin.url.clone()),
        outcome,
    };
    reporter.finish(&report);
    report
}

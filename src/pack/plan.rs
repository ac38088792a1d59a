//! Pure set computations between declared and installed state.

use std::collections::BTreeSet;

use crate::declared::{DeclaredState, PluginEntry};
use crate::discovery::{Installed, InstalledPlugin};
use crate::git::humanish;

/// Declared plugins whose URL is not installed anywhere under the pack path
pub fn to_install<'d>(declared: &'d DeclaredState, installed: &BTreeSet<String>) -> Vec<&'d PluginEntry> {
    declared
        .entries()
        .values()
        .filter(|entry| !installed.contains(&entry.url))
        .collect()
}

/// URLs to pull: unfrozen declarations that are installed, narrowed to
/// `names` (plugin directory names) when that list is non-empty.
pub fn upgrade_candidates(
    declared: &DeclaredState,
    installed: &BTreeSet<String>,
    names: &[String],
) -> Vec<String> {
    declared
        .freeze_false()
        .into_iter()
        .filter(|url| installed.contains(url))
        .filter(|url| names.is_empty() || names.iter().any(|n| *n == humanish(url)))
        .collect()
}

/// Installed plugins whose URL is no longer declared
pub fn orphans<'i>(declared: &DeclaredState, installed: &'i Installed) -> Vec<&'i InstalledPlugin> {
    installed
        .plugins()
        .iter()
        .filter(|p| !declared.contains(&p.url))
        .collect()
}

/// Installed plugins matching `names`, plus the names that matched nothing
pub fn select_by_name<'i>(
    installed: &'i Installed,
    names: &[String],
) -> (Vec<&'i InstalledPlugin>, Vec<String>) {
    let mut selected: Vec<&InstalledPlugin> = Vec::new();
    let mut unmatched = Vec::new();

    for name in names {
        let found = installed.find_name(name);
        if found.is_empty() {
            unmatched.push(name.clone());
        }
        for plugin in found {
            if !selected.iter().any(|p| p.rel_path == plugin.rel_path) {
                selected.push(plugin);
            }
        }
    }

    (selected, unmatched)
}

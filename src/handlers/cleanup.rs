//! Removal handlers
//!
//! `rm` deletes named plugins, `clean` deletes plugins that are no longer
//! declared. Clean asks for confirmation when running interactively.

use anyhow::{Context, Result};
use colored::Colorize;
use inquire::Confirm;

use super::{is_interactive, print_tally};
use crate::declared::DeclaredState;
use crate::discovery::InstalledPlugin;
use crate::git::Git;
use crate::pack::Reconciler;
use crate::report::ConsoleReporter;

/// Handle `vimpck rm [-r] <names...>`
pub fn handle_remove(
    declared: &DeclaredState,
    git: &Git,
    names: &[String],
    remove_config: bool,
    verbose: bool,
) -> Result<()> {
    println!("{}", "Removing plugins...".cyan().bold());

    let mut reporter = ConsoleReporter::new(verbose);
    let removal = Reconciler::new(declared, git).remove(names, remove_config, &mut reporter)?;

    print_tally(&removal.reports);
    if removal.forgotten > 0 {
        println!(
            "  {} {} declaration(s) removed from configuration",
            "✓".green(),
            removal.forgotten
        );
    } else if remove_config {
        println!("  {}", "Configuration unchanged".dimmed());
    }
    reporter.print_summary();
    Ok(())
}

/// Handle `vimpck clean [--dry-run] [--yes]`
pub fn handle_clean(
    declared: &DeclaredState,
    git: &Git,
    dry_run: bool,
    assume_yes: bool,
    verbose: bool,
) -> Result<()> {
    if dry_run {
        println!("{}", "Orphaned plugins (dry run)".cyan().bold());
    } else {
        println!("{}", "Cleaning orphaned plugins...".cyan().bold());
    }

    let confirm = |orphans: &[&InstalledPlugin]| -> Result<bool> {
        if assume_yes || !is_interactive() {
            return Ok(true);
        }
        for plugin in orphans {
            println!("  {} {}", "-".yellow(), plugin.rel_path.display());
        }
        Confirm::new(&format!("Delete {} orphaned plugin(s)?", orphans.len()))
            .with_default(false)
            .prompt()
            .context("Failed to get confirmation")
    };

    let mut reporter = ConsoleReporter::new(verbose);
    let reports = Reconciler::new(declared, git).clean(dry_run, confirm, &mut reporter)?;

    if reports.is_empty() {
        println!("{}", "Nothing deleted".dimmed());
        return Ok(());
    }

    if dry_run {
        println!("{} plugin(s) would be deleted", reports.len());
    } else {
        print_tally(&reports);
    }
    reporter.print_summary();
    Ok(())
}

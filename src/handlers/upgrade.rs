use anyhow::Result;
use colored::Colorize;

use super::print_tally;
use crate::declared::DeclaredState;
use crate::git::Git;
use crate::pack::Reconciler;
use crate::report::{ConsoleReporter, ItemOutcome};

/// Handle `vimpck upgrade [names...]`
pub fn handle_upgrade(
    declared: &DeclaredState,
    git: &Git,
    names: &[String],
    verbose: bool,
) -> Result<()> {
    println!("{}", "Upgrading plugins...".cyan().bold());

    let mut reporter = ConsoleReporter::new(verbose);
    let reports = Reconciler::new(declared, git).upgrade(names, &mut reporter)?;

    if reports.is_empty() {
        println!("{}", "Nothing to upgrade".dimmed());
        return Ok(());
    }

    let updated = reports
        .iter()
        .filter(|r| matches!(r.outcome, ItemOutcome::Updated { .. }))
        .count();
    println!("  {} {} plugin(s) updated", "↑".cyan(), updated);
    print_tally(&reports);
    reporter.print_summary();
    Ok(())
}

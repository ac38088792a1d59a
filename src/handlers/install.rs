use anyhow::Result;
use colored::Colorize;

use super::print_tally;
use crate::declared::DeclaredState;
use crate::git::Git;
use crate::pack::Reconciler;
use crate::report::ConsoleReporter;

/// Handle `vimpck install`
pub fn handle_install(declared: &DeclaredState, git: &Git, verbose: bool) -> Result<()> {
    println!("{}", "Installing plugins...".cyan().bold());

    let mut reporter = ConsoleReporter::new(verbose);
    let reports = Reconciler::new(declared, git).install(&mut reporter)?;

    if reports.is_empty() {
        println!("{}", "Nothing to install".dimmed());
        return Ok(());
    }

    print_tally(&reports);
    reporter.print_summary();
    Ok(())
}

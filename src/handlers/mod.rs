//! Command handler modules
//!
//! Each handler runs one reconciliation pass with a console reporter and
//! renders its result. Per-plugin failures are printed in a summary and
//! never turn into an error; only fatal problems propagate.

pub mod cleanup;
pub mod install;
pub mod list;
pub mod upgrade;

pub use cleanup::{handle_clean, handle_remove};
pub use install::handle_install;
pub use list::handle_list;
pub use upgrade::handle_upgrade;

use colored::Colorize;

use crate::report::{ItemOutcome, ItemReport};

/// Check if we're attached to a terminal on both ends
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// One-line tally printed after a pass
fn print_tally(reports: &[ItemReport]) {
    let failed = reports.iter().filter(|r| r.outcome.is_failure()).count();
    let skipped = reports
        .iter()
        .filter(|r| matches!(r.outcome, ItemOutcome::Skipped(_)))
        .count();
    let done = reports.len() - failed - skipped;

    let mut line = format!("{done} done");
    if skipped > 0 {
        line.push_str(&format!(", {skipped} skipped"));
    }
    if failed > 0 {
        println!("{}", format!("{line}, {failed} failed").yellow());
    } else {
        println!("{}", line.green());
    }
}

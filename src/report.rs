use colored::Colorize;
use std::fmt;
use std::path::PathBuf;

use crate::git::GitFailure;
use crate::logger::trace_to_file;

/// Which reconciliation pass produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Upgrade,
    Remove,
    Clean,
}

impl Action {
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Install => "Installing",
            Action::Upgrade => "Upgrading",
            Action::Remove => "Removing",
            Action::Clean => "Cleaning",
        }
    }
}

/// Why a single plugin could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemFailure {
    Git(GitFailure),
    Io { path: PathBuf, message: String },
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemFailure::Git(failure) => write!(f, "{failure}"),
            ItemFailure::Io { path, message } => write!(f, "{}: {}", path.display(), message),
        }
    }
}

/// Result of processing one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Installed { dir: PathBuf },
    UpToDate,
    Updated {
        from: String,
        to: String,
        /// `git log --oneline` of the new commits, when it could be read
        log: Option<String>,
    },
    Removed { dir: PathBuf },
    /// Dry run: the directory would have been deleted
    WouldRemove { dir: PathBuf },
    /// Nothing was done, with the reason
    Skipped(String),
    Failed(ItemFailure),
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ItemOutcome::Failed(_))
    }
}

/// One plugin's outcome within a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub action: Action,
    /// Local directory name
    pub name: String,
    /// Remote URL, when known
    pub url: Option<String>,
    pub outcome: ItemOutcome,
}

/// Event sink fed by the reconciler while it works through a pass.
///
/// Events arrive in iteration order: `begin` for an item is always
/// followed by its `finish` before the next item begins.
pub trait Reporter {
    fn begin(&mut self, action: Action, name: &str);
    fn finish(&mut self, report: &ItemReport);
}

/// Renders progress to the terminal and keeps failures for a final summary
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    failures: Vec<ItemReport>,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            failures: Vec::new(),
            verbose,
        }
    }

    pub fn failures(&self) -> &[ItemReport] {
        &self.failures
    }

    /// Print the grouped failure summary, if anything failed.
    pub fn print_summary(&self) {
        if self.failures.is_empty() {
            return;
        }

        println!();
        println!(
            "{}",
            format!("{} plugin(s) failed:", self.failures.len()).red().bold()
        );
        for report in &self.failures {
            println!();
            println!("  {} {}", "✗".red(), report.name.bold());
            if let Some(url) = &report.url {
                println!("    {}: {}", "url".cyan(), url);
            }
            match &report.outcome {
                ItemOutcome::Failed(ItemFailure::Git(failure)) => {
                    println!("    {}: {}", "command".cyan(), failure.command_line());
                    match failure.exit_code() {
                        Some(code) => println!("    {}: {}", "exit code".cyan(), code),
                        None => println!("    {}: {}", "error".cyan(), failure.kind),
                    }
                    let stderr = failure.stderr.trim_end();
                    if !stderr.is_empty() {
                        println!("    {}:", "stderr".cyan());
                        for line in stderr.lines() {
                            println!("      {}", line.dimmed());
                        }
                    }
                }
                ItemOutcome::Failed(failure) => {
                    println!("    {}: {}", "error".cyan(), failure);
                }
                _ => {}
            }
        }
    }
}

impl Reporter for ConsoleReporter {
    fn begin(&mut self, action: Action, name: &str) {
        log::debug!("{} {}", action.verb(), name);
    }

    fn finish(&mut self, report: &ItemReport) {
        trace_to_file(&format!("{:?} {}: {:?}", report.action, report.name, report.outcome));

        let name = report.name.bold();
        match &report.outcome {
            ItemOutcome::Installed { dir } => {
                println!("  {} {} → {}", "✓".green(), name, dir.display())
            }
            ItemOutcome::UpToDate => {
                println!("  {} {} {}", "✓".green(), name, "already up to date".dimmed())
            }
            ItemOutcome::Updated { from, to, log } => {
                println!(
                    "  {} {} {}..{}",
                    "↑".cyan(),
                    name,
                    short(from),
                    short(to)
                );
                if let Some(log) = log.as_deref().filter(|l| !l.is_empty()) {
                    for line in log.lines() {
                        println!("      {}", line.dimmed());
                    }
                }
            }
            ItemOutcome::Removed { dir } => {
                println!("  {} {} ({})", "✓".green(), name, dir.display())
            }
            ItemOutcome::WouldRemove { dir } => {
                println!("  {} {} ({})", "-".yellow(), name, dir.display())
            }
            ItemOutcome::Skipped(reason) => {
                println!("  {} {} {}", "!".yellow(), name, reason.dimmed())
            }
            ItemOutcome::Failed(failure) => {
                println!("  {} {} {}", "✗".red(), name, "failed".red());
                if self.verbose {
                    println!("      {}", failure.to_string().dimmed());
                }
                self.failures.push(report.clone());
            }
        }
    }
}

/// Collects every event; used by tests and by callers that render later
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub begun: Vec<(Action, String)>,
    pub finished: Vec<ItemReport>,
}

impl Reporter for RecordingReporter {
    fn begin(&mut self, action: Action, name: &str) {
        self.begun.push((action, name.to_string()));
    }

    fn finish(&mut self, report: &ItemReport) {
        self.finished.push(report.clone());
    }
}

fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::FailureKind;

    fn failed(name: &str) -> ItemReport {
        ItemReport {
            action: Action::Install,
            name: name.to_string(),
            url: Some(format!("https://example.com/{name}")),
            outcome: ItemOutcome::Failed(ItemFailure::Git(GitFailure {
                kind: FailureKind::Exit(Some(128)),
                argv: vec!["git".into(), "clone".into()],
                stderr: "fatal: repository not found".into(),
            })),
        }
    }

    #[test]
    fn test_console_reporter_keeps_only_failures() {
        let mut reporter = ConsoleReporter::new(false);
        reporter.finish(&ItemReport {
            action: Action::Upgrade,
            name: "ok".into(),
            url: None,
            outcome: ItemOutcome::UpToDate,
        });
        reporter.finish(&failed("broken"));

        assert_eq!(reporter.failures().len(), 1);
        assert_eq!(reporter.failures()[0].name, "broken");
        reporter.print_summary();
    }

    #[test]
    fn test_recording_reporter_preserves_order() {
        let mut reporter = RecordingReporter::default();
        reporter.begin(Action::Install, "a");
        reporter.finish(&failed("a"));
        reporter.begin(Action::Install, "b");
        reporter.finish(&failed("b"));

        let names: Vec<_> = reporter.finished.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(reporter.finished.iter().all(|r| r.outcome.is_failure()));
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short("0ab83e7aa0b628d19bb608bdbe6a8bd2c4e78aaa"), "0ab83e7");
        assert_eq!(short("abc"), "abc");
    }
}

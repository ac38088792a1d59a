use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

use vimpck::config::ConfigManager;
use vimpck::{handlers, logger, DeclaredState, Git, PluginType};

#[derive(Parser)]
#[command(name = "vimpck")]
#[command(about = "Vim package manager", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this configuration file instead of the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Kill any single git command running longer than this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Show debug logging and failure details inline
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install declared plugins that are not installed yet
    Install,

    /// List installed plugins
    #[command(group(ArgGroup::new("kind").args(["start", "opt"])))]
    Ls {
        /// Only plugins loaded at startup
        #[arg(long)]
        start: bool,

        /// Only optional plugins
        #[arg(long)]
        opt: bool,
    },

    /// Pull new commits for installed, unfrozen plugins
    Upgrade {
        /// Only upgrade these plugins (directory names)
        names: Vec<String>,
    },

    /// Delete installed plugins
    Rm {
        /// Also remove the plugins' declarations from the configuration file
        #[arg(short = 'r', long = "remove-config")]
        remove_config: bool,

        /// Plugins to delete (directory names)
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Delete installed plugins that are no longer declared
    Clean {
        /// Only show what would be deleted
        #[arg(long)]
        dry_run: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = logger::init_logger(level) {
        eprintln!("warning: file logging disabled: {e:#}");
    }

    let sources = ConfigManager::default_sources(cli.config.as_deref());
    let declared = DeclaredState::load(&sources)?;

    let timeout = cli
        .timeout
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .or(declared.git_timeout());
    let git = Git::new().with_timeout(timeout);

    match cli.command {
        Commands::Install => handlers::handle_install(&declared, &git, cli.verbose)?,
        Commands::Ls { start, opt } => {
            let only = if start {
                Some(PluginType::Start)
            } else if opt {
                Some(PluginType::Opt)
            } else {
                None
            };
            handlers::handle_list(&declared, &git, only)?;
        }
        Commands::Upgrade { names } => {
            handlers::handle_upgrade(&declared, &git, &names, cli.verbose)?
        }
        Commands::Rm {
            remove_config,
            names,
        } => handlers::handle_remove(&declared, &git, &names, remove_config, cli.verbose)?,
        Commands::Clean { dry_run, yes } => {
            handlers::handle_clean(&declared, &git, dry_run, yes, cli.verbose)?
        }
    }

    Ok(())
}

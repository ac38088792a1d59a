use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::error::VimpckError;

/// Name of the per-user directory holding the config file and the log
const APP_DIR: &str = "vimpck";

/// Default configuration file name inside the app directory
const CONFIG_FILE: &str = "config.toml";

/// Environment variable pointing directly at a configuration file
pub const VIMPCKRC: &str = "VIMPCKRC";

/// One candidate location for the configuration file.
///
/// Resolvers are tried in order; the first one that yields an existing
/// file wins. Environment lookups happen when the list is built, so
/// loading from an explicit list never touches the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path given on the command line
    Explicit(PathBuf),
    /// Path taken from the `VIMPCKRC` variable
    Env(PathBuf),
    /// `$XDG_CONFIG_HOME/vimpck/config.toml`
    XdgConfigHome(PathBuf),
    /// `~/.config/vimpck/config.toml`
    Home(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(p)
            | ConfigSource::Env(p)
            | ConfigSource::XdgConfigHome(p)
            | ConfigSource::Home(p) => p,
        }
    }
}

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path:
    /// - $XDG_CONFIG_HOME/vimpck when the variable is set
    /// - ~/.config/vimpck otherwise
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg_config.is_empty() {
                return Ok(PathBuf::from(xdg_config).join(APP_DIR));
            }
        }
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".config").join(APP_DIR))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("vimpck.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
        Ok(config_dir)
    }

    /// Build the ordered resolver list from the command line and the environment.
    pub fn default_sources(explicit: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();

        if let Some(path) = explicit {
            sources.push(ConfigSource::Explicit(path.to_path_buf()));
        }
        if let Some(rc) = std::env::var_os(VIMPCKRC).filter(|v| !v.is_empty()) {
            sources.push(ConfigSource::Env(PathBuf::from(rc)));
        }
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            sources.push(ConfigSource::XdgConfigHome(
                PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE),
            ));
        }
        if let Some(home) = dirs::home_dir() {
            sources.push(ConfigSource::Home(
                home.join(".config").join(APP_DIR).join(CONFIG_FILE),
            ));
        }

        sources
    }

    /// Pick the first resolver whose file exists.
    ///
    /// An explicit path that does not exist is an error by itself.
    pub fn resolve(sources: &[ConfigSource]) -> Result<PathBuf, VimpckError> {
        for source in sources {
            let path = source.path();
            if path.is_file() {
                log::debug!("Using configuration file {}", path.display());
                return Ok(path.to_path_buf());
            }
            if matches!(source, ConfigSource::Explicit(_)) {
                return Err(VimpckError::ConfigNotFound {
                    searched: vec![path.display().to_string()],
                });
            }
        }

        Err(VimpckError::ConfigNotFound {
            searched: sources
                .iter()
                .map(|s| s.path().display().to_string())
                .collect(),
        })
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

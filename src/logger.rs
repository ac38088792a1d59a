use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ConfigManager;

/// Rotate the log file once it grows past this size
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Set once [`init_logger`] has prepared the log file
static FILE_LOGGING: AtomicBool = AtomicBool::new(false);

/// Initialize the logging system
///
/// Console logging goes to stderr so it never interleaves with the progress
/// stream on stdout. The level comes from `RUST_LOG` when set, otherwise
/// from `default_level` (`warn`, or `debug` with `-v`).
///
/// Every git invocation and plugin outcome is additionally appended to
/// `vimpck.log` in the config directory via [`log_to_file`].
pub fn init_logger(default_level: LevelFilter) -> Result<()> {
    ConfigManager::ensure_config_dir()?;

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(default_level);

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // already initialized in tests

    log_to_file(&format!("Logger initialized with level: {level:?}"))?;
    FILE_LOGGING.store(true, Ordering::Relaxed);

    Ok(())
}

/// Append one timestamped line to `vimpck.log`.
pub fn log_to_file(message: &str) -> Result<()> {
    let mut file = open_log(&ConfigManager::log_file_path()?)?;
    writeln!(
        file,
        "{} {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
        message
    )
    .context("Failed to write to log file")
}

/// Open the log for appending. A log past [`MAX_LOG_SIZE`] is first moved
/// to `vimpck.log.old`, replacing the previous one.
fn open_log(path: &Path) -> Result<File> {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if size > MAX_LOG_SIZE {
        let old = path.with_extension("log.old");
        let _ = fs::remove_file(&old);
        fs::rename(path, &old)
            .with_context(|| format!("Failed to rotate log file: {}", path.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

/// Like [`log_to_file`] but never fails, and does nothing until the logger
/// has been initialized (library users and tests get no log file).
pub fn trace_to_file(message: &str) {
    if !FILE_LOGGING.load(Ordering::Relaxed) {
        return;
    }
    if let Err(e) = log_to_file(message) {
        log::debug!("Could not write to log file: {e:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn with_temp_config_home<F: FnOnce()>(f: F) {
        let temp = TempDir::new().unwrap();
        let old = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", temp.path());
        f();
        match old {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_init_logger_succeeds() {
        with_temp_config_home(|| {
            assert!(init_logger(LevelFilter::Warn).is_ok());
            assert!(ConfigManager::log_file_path().unwrap().exists());
            FILE_LOGGING.store(false, Ordering::Relaxed);
        });
    }

    #[test]
    #[serial]
    fn test_log_to_file() {
        with_temp_config_home(|| {
            ConfigManager::ensure_config_dir().unwrap();
            log_to_file("git clone finished").unwrap();

            let log_path = ConfigManager::log_file_path().unwrap();
            let contents = std::fs::read_to_string(&log_path).unwrap();
            assert!(contents.contains("git clone finished"));
        });
    }

    #[test]
    fn test_oversized_log_is_rotated_on_open() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vimpck.log");
        fs::write(&path, vec![b'a'; (MAX_LOG_SIZE + 1) as usize]).unwrap();

        let mut file = open_log(&path).unwrap();
        writeln!(file, "fresh").unwrap();
        drop(file);

        let old = path.with_extension("log.old");
        assert_eq!(fs::metadata(&old).unwrap().len(), MAX_LOG_SIZE + 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_small_log_is_appended() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vimpck.log");
        fs::write(&path, "earlier\n").unwrap();

        let mut file = open_log(&path).unwrap();
        writeln!(file, "later").unwrap();
        drop(file);

        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
        assert!(!path.with_extension("log.old").exists());
    }
}

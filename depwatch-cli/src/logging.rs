//! Logging initialisation
//!
//! Two layers on one registry:
//! - console: human-readable, stderr, filtered by `--log-level` (`silent` disables it)
//! - file: JSON lines at debug level, `--write-log-to` or `~/.depwatch/logs/<unix-millis>.log`

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use colored::Colorize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use depwatch_core::types::ConsoleLogLevel;

use crate::error::CliError;

/// Where the file layer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFileTarget {
    Disabled,
    Path(PathBuf),
    /// `<dir>/<unix-millis>.log`
    Directory(PathBuf),
}

impl LogFileTarget {
    /// Concrete file path for this run, if any.
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            Self::Disabled => None,
            Self::Path(path) => Some(path.clone()),
            Self::Directory(dir) => {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or_default();
                Some(dir.join(format!("{millis}.log")))
            }
        }
    }
}

/// Resolved logging options.
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub console: ConsoleLogLevel,
    pub file: LogFileTarget,
}

impl LogOptions {
    /// Build options from the CLI flags, falling back to the configured level and directory.
    pub fn from_flags(
        log_level: Option<&str>,
        configured_level: &str,
        no_log_file: bool,
        write_log_to: Option<&Path>,
        log_dir: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let raw = log_level.unwrap_or(configured_level);
        let console = ConsoleLogLevel::from_str_loose(raw).ok_or_else(|| {
            CliError::Config(format!(
                "invalid log level '{raw}', must be one of: {}",
                ConsoleLogLevel::NAMES.join("|")
            ))
        })?;

        let file = match (no_log_file, write_log_to, log_dir) {
            (true, _, _) => LogFileTarget::Disabled,
            (false, Some(path), _) => LogFileTarget::Path(path.to_path_buf()),
            (false, None, Some(dir)) => LogFileTarget::Directory(dir),
            (false, None, None) => LogFileTarget::Disabled,
        };
        Ok(Self { console, file })
    }
}

/// Install the global subscriber.
///
/// Failing to open the log file is reported on stderr and the run continues
/// with console logging only.
pub fn init(options: &LogOptions) {
    let console = console_filter(options.console).map(|filter| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
    });

    let file = options.file.resolve().and_then(|path| match open_log_file(&path) {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG),
        ),
        Err(e) => {
            eprintln!(
                "{} cannot open log file {}: {}",
                "warning:".yellow().bold(),
                path.display(),
                e
            );
            None
        }
    });

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init();
}

fn console_filter(level: ConsoleLogLevel) -> Option<EnvFilter> {
    let directive = match level {
        ConsoleLogLevel::Silent => return None,
        ConsoleLogLevel::Error => "error",
        ConsoleLogLevel::Warn => "warn",
        ConsoleLogLevel::Info => "info",
        ConsoleLogLevel::Debug => "debug",
    };
    Some(EnvFilter::new(directive))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_level_overrides_config() {
        let opts = LogOptions::from_flags(Some("debug"), "warn", true, None, None).unwrap();
        assert_eq!(opts.console, ConsoleLogLevel::Debug);
        assert_eq!(opts.file, LogFileTarget::Disabled);
    }

    #[test]
    fn test_config_level_used_without_flag() {
        let opts = LogOptions::from_flags(None, "silent", true, None, None).unwrap();
        assert_eq!(opts.console, ConsoleLogLevel::Silent);
        assert!(console_filter(opts.console).is_none());
    }

    #[test]
    fn test_invalid_level_rejected() {
        let err = LogOptions::from_flags(Some("verbose"), "warn", true, None, None).unwrap_err();
        assert_eq!(err.exit_code(depwatch_core::types::OutputMode::Interactive), 1);
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn test_explicit_log_path_wins_over_directory() {
        let opts = LogOptions::from_flags(
            None,
            "warn",
            false,
            Some(Path::new("/tmp/run.log")),
            Some(PathBuf::from("/tmp/logs")),
        )
        .unwrap();
        assert_eq!(opts.file.resolve(), Some(PathBuf::from("/tmp/run.log")));
    }

    #[test]
    fn test_directory_target_uses_millis_file_name() {
        let target = LogFileTarget::Directory(PathBuf::from("/tmp/logs"));
        let path = target.resolve().unwrap();
        assert_eq!(path.parent(), Some(Path::new("/tmp/logs")));
        let stem = path.file_stem().unwrap().to_str().unwrap();
        assert!(stem.parse::<u128>().is_ok(), "unexpected file name {stem}");
        assert_eq!(path.extension().unwrap(), "log");
    }

    #[test]
    fn test_open_log_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/run.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}

//! Tracing subscriber for the viewer.
//!
//! Events go to stdout and, unless disabled in `[logging]`, to a file named
//! after the launch time in the app's `logs` directory. `RUST_LOG` wins over
//! the configured level.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, Registry, filter::ParseError, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

const LOG_FILE_PREFIX: &str = "loopscope_";
const LOG_FILE_EXTENSION: &str = "log";

static INSTALLED: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// `[logging]` table of the editor config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `loopscope::track=debug`.
    pub level: String,
    /// Write a log file per launch.
    pub write_file: bool,
    /// Log files kept after pruning, including the current one.
    pub retained_files: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            write_file: true,
            retained_files: 10,
        }
    }
}

impl LoggingOptions {
    /// Trim the level and bound the retention count.
    pub fn normalized(mut self) -> Self {
        let level = self.level.trim();
        self.level = if level.is_empty() {
            Self::default().level
        } else {
            level.to_string()
        };
        self.retained_files = self.retained_files.clamp(1, 100);
        self
    }
}

/// Reasons logging could not be set up.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The logs directory could not be resolved or created.
    #[error(transparent)]
    Dirs(#[from] AppDirError),
    /// The configured level is not a valid filter directive.
    #[error("Invalid log level \"{directive}\": {source}")]
    Filter {
        /// Directive as configured.
        directive: String,
        /// Parser error.
        source: ParseError,
    },
    /// The launch timestamp could not be formatted.
    #[error("Failed to format log file name: {0}")]
    FormatTime(#[from] time::error::Format),
    /// The file appender could not open its file.
    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),
    /// Listing or pruning the logs directory failed.
    #[error("Failed to prune logs in {path}: {source}")]
    Prune {
        /// Directory or file involved.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Another subscriber is already installed.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber; returns the log file in use, if any.
///
/// Later calls do nothing and return `Ok(None)`.
pub fn init(options: &LoggingOptions) -> Result<Option<PathBuf>, LoggingError> {
    if INSTALLED.get().is_some() {
        return Ok(None);
    }
    let filter = build_filter(std::env::var("RUST_LOG").ok(), &options.level)?;
    let timer = build_timer();
    let stdout_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stdout);

    let (file_layer, guard, log_path) = if options.write_file {
        let dir = app_dirs::logs_dir()?;
        let stem = log_file_stem(now_local_or_utc())?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(&stem)
            .filename_suffix(LOG_FILE_EXTENSION)
            .build(&dir)?;
        prune_old_logs(&dir, options.retained_files)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_timer(timer)
            .with_writer(writer);
        let path = dir.join(format!("{stem}.{LOG_FILE_EXTENSION}"));
        (Some(layer), Some(guard), Some(path))
    } else {
        (None, None, None)
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = INSTALLED.set(guard);

    match &log_path {
        Some(path) => tracing::info!("Logging to {}", path.display()),
        None => tracing::info!("File logging disabled"),
    }
    Ok(log_path)
}

fn build_filter(env: Option<String>, level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = env.filter(|value| !value.trim().is_empty()).unwrap_or_else(|| level.to_string());
    EnvFilter::try_new(&directive).map_err(|source| LoggingError::Filter { directive, source })
}

/// Launch files sort by name, so the oldest are the first in name order.
fn prune_old_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let prune_error = |path: &Path, source: std::io::Error| LoggingError::Prune {
        path: path.to_path_buf(),
        source,
    };
    let mut launches: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| prune_error(dir, source))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_launch_log(path))
        .collect();
    launches.sort();
    let excess = launches.len().saturating_sub(keep);
    for path in &launches[..excess] {
        fs::remove_file(path).map_err(|source| prune_error(path, source))?;
    }
    Ok(())
}

fn is_launch_log(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(|ext| ext.to_str()) == Some(LOG_FILE_EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
}

fn log_file_stem(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    Ok(format!("{LOG_FILE_PREFIX}{}", now.format(NAME_FORMAT)?))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[hour]:[minute]:[second].[subsecond digits:3]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::datetime;

    #[test]
    fn file_stem_sorts_by_launch_time() {
        let earlier = log_file_stem(datetime!(2023-11-14 22:13:20 UTC)).unwrap();
        let later = log_file_stem(datetime!(2024-01-02 03:04:05 UTC)).unwrap();
        assert_eq!(earlier, "loopscope_2023-11-14_22-13-20");
        assert!(earlier < later);
    }

    #[test]
    fn pruning_only_touches_launch_logs() {
        let dir = tempdir().unwrap();
        for day in 1..=5 {
            let name = format!("loopscope_2024-01-0{day}_00-00-00.log");
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::write(dir.path().join("other.log"), b"").unwrap();
        fs::write(dir.path().join("loopscope_notes.txt"), b"").unwrap();

        prune_old_logs(dir.path(), 2).unwrap();
        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            [
                "loopscope_2024-01-04_00-00-00.log",
                "loopscope_2024-01-05_00-00-00.log",
                "loopscope_notes.txt",
                "other.log",
            ]
        );
    }

    #[test]
    fn environment_overrides_the_configured_level() {
        assert!(build_filter(None, "loopscope::track=debug").is_ok());
        assert!(build_filter(Some("warn".into()), "loopscope=notalevel").is_ok());
        assert!(matches!(
            build_filter(Some("  ".into()), "loopscope=notalevel"),
            Err(LoggingError::Filter { .. })
        ));
    }

    #[test]
    fn options_are_normalized() {
        let options = LoggingOptions {
            level: "  ".into(),
            write_file: false,
            retained_files: 0,
        }
        .normalized();
        assert_eq!(options.level, "info");
        assert_eq!(options.retained_files, 1);
        assert!(!options.write_file);
    }
}

//! Tracing setup shared by `studyml-lessons` and `studyml-words`.
//!
//! Events go to stderr and to `logs/studyml-<tool>_<timestamp>.log` under the
//! app directory, one file per run. Stdout carries only the scores and
//! predictions. Each tool keeps its own newest [`KEEP_PER_TOOL`] files.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;

/// Run logs retained per tool.
pub const KEEP_PER_TOOL: usize = 10;

static FLUSH_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("No app directory available for run logs")]
    NoLogDir,
    #[error("Failed to prepare log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Creating, listing or removing a run log failed.
    #[error("Log file error at {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format run log timestamp: {0}")]
    Timestamp(time::error::Format),
    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(tracing::subscriber::SetGlobalDefaultError),
}

/// Run logs of one tool inside the shared logs directory.
struct LogFiles<'a> {
    dir: &'a Path,
    prefix: String,
}

impl<'a> LogFiles<'a> {
    fn new(dir: &'a Path, tool: &str) -> Self {
        Self {
            dir,
            prefix: format!("studyml-{tool}_"),
        }
    }

    fn name_at(&self, started: OffsetDateTime) -> Result<String, LoggingError> {
        const STAMP: &[FormatItem<'_>] =
            format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
        let stamp = started.format(STAMP).map_err(LoggingError::Timestamp)?;
        Ok(format!("{}{stamp}.log", self.prefix))
    }

    fn owns(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "log")
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&self.prefix))
    }

    fn create(&self, name: &str) -> Result<PathBuf, LoggingError> {
        let path = self.dir.join(name);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LoggingError::LogFile {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Delete this tool's oldest runs until at most `keep` remain.
    fn prune(&self, keep: usize) -> Result<usize, LoggingError> {
        let listing = fs::read_dir(self.dir).map_err(|source| LoggingError::LogFile {
            path: self.dir.to_path_buf(),
            source,
        })?;
        let mut runs: Vec<(SystemTime, PathBuf)> = listing
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
            .map(|entry| entry.path())
            .filter(|path| self.owns(path))
            .map(|path| {
                let modified = fs::metadata(&path)
                    .and_then(|meta| meta.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, path)
            })
            .collect();
        runs.sort();
        let stale = runs.len().saturating_sub(keep);
        for (_, path) in &runs[..stale] {
            fs::remove_file(path).map_err(|source| LoggingError::LogFile {
                path: path.clone(),
                source,
            })?;
        }
        Ok(stale)
    }
}

/// Install the stderr and run-log subscriber for `tool` (`"lessons"` or `"words"`).
///
/// Only the first call has an effect. The filter comes from `RUST_LOG` and
/// defaults to `info`. An error leaves the process without file logging.
pub fn init(tool: &str) -> Result<(), LoggingError> {
    if FLUSH_GUARD.get().is_some() {
        return Ok(());
    }

    let dir = app_dirs::logs_dir().map_err(|err| match err {
        app_dirs::AppDirError::NoBaseDir => LoggingError::NoLogDir,
        app_dirs::AppDirError::CreateDir { path, source } => LoggingError::LogDir { path, source },
    })?;
    let runs = LogFiles::new(&dir, tool);
    let name = runs.name_at(
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
    )?;
    let path = runs.create(&name)?;
    let removed = runs.prune(KEEP_PER_TOOL)?;
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::never(&dir, &name));

    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    const CLOCK: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let timer = fmt::time::OffsetTime::new(offset, CLOCK);
    let subscriber = Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_timer(timer.clone())
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_timer(timer)
                .with_writer(file_writer),
        );
    tracing::subscriber::set_global_default(subscriber)
        .map_err(LoggingError::AlreadyInstalled)?;
    let _ = FLUSH_GUARD.set(guard);

    tracing::info!(
        "studyml-{tool} logging to {} ({removed} old run logs removed)",
        path.display()
    );
    Ok(())
}

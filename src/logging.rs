//! Tracing setup for the trainer.
//!
//! Each run gets its own file under `.parley/logs`, named after the time the
//! run started, while the same events are echoed to stderr. stdout is left to
//! the epoch progress line and the final summary. `RUST_LOG` overrides the
//! default `info` filter.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use time::{OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Run logs kept on disk, newest first.
const KEEP_RUN_LOGS: usize = 10;
const RUN_LOG_PREFIX: &str = "parley-train";
const RUN_LOG_EXT: &str = "log";

const FILE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]");
const LINE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond digits:3]");

// Flushes the file writer when the process exits.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    Dir(#[from] AppDirError),
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to timestamp the run log: {0}")]
    Stamp(#[from] time::error::Format),
    #[error("A tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber with run logs in `.parley/logs`.
///
/// Returns the path of this run's log file. A second call in the same
/// process only reports the path it would have used.
pub fn init() -> Result<PathBuf, LoggingError> {
    init_in(&app_dirs::logs_dir()?)
}

/// Same as [`init`] with an explicit log directory.
pub fn init_in(dir: &Path) -> Result<PathBuf, LoggingError> {
    fs::create_dir_all(dir).map_err(|source| io_error("create", dir, source))?;
    let started = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let file_name = run_log_name(started)?;
    let path = dir.join(&file_name);
    if FILE_GUARD.get().is_some() {
        return Ok(path);
    }

    let file = open_run_log(&path)?;
    for stale in stale_run_logs(dir, KEEP_RUN_LOGS)? {
        fs::remove_file(&stale).map_err(|source| io_error("remove", &stale, source))?;
    }

    let (file_writer, guard) = tracing_appender::non_blocking(file);
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(offset, LINE_STAMP);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(timer.clone())
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_timer(timer)
                .with_writer(file_writer),
        );
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = FILE_GUARD.set(guard);
    tracing::debug!("Run log at {}", path.display());
    Ok(path)
}

// Append: a second run started within the same second shares the file.
fn open_run_log(path: &Path) -> Result<fs::File, LoggingError> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| io_error("open", path, source))
}

fn run_log_name(started: OffsetDateTime) -> Result<String, LoggingError> {
    let stamp = started.format(FILE_STAMP)?;
    Ok(format!("{RUN_LOG_PREFIX}-{stamp}.{RUN_LOG_EXT}"))
}

fn is_run_log(name: &str) -> bool {
    name.starts_with(RUN_LOG_PREFIX)
        && Path::new(name).extension().and_then(|ext| ext.to_str()) == Some(RUN_LOG_EXT)
}

/// Run logs beyond the newest `keep`. The timestamp in the name sorts
/// chronologically, so names decide age.
fn stale_run_logs(dir: &Path, keep: usize) -> Result<Vec<PathBuf>, LoggingError> {
    let entries = fs::read_dir(dir).map_err(|source| io_error("list", dir, source))?;
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_run_log(name))
        .collect();
    names.sort_unstable_by(|a, b| b.cmp(a));
    Ok(names.into_iter().skip(keep).map(|name| dir.join(name)).collect())
}

fn io_error(action: &'static str, path: &Path, source: std::io::Error) -> LoggingError {
    LoggingError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}

use std::path::PathBuf;
use std::sync::OnceLock;

use directories::ProjectDirs;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

const LOG_FILE_PREFIX: &str = "volume-overlay.log";
const DEFAULT_FILTER: &str = "info";

/// Keeps the file writer flushing until the process exits
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("No data directory available for logs")]
    NoDataDir,
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// `<data dir>/VolumeOverlay/logs`
pub fn log_dir() -> Result<PathBuf, LoggingError> {
    let dirs = ProjectDirs::from("", "", "VolumeOverlay").ok_or(LoggingError::NoDataDir)?;
    Ok(dirs.data_dir().join("logs"))
}

/// Install stdout + daily file logging. A second call does nothing.
pub fn init() -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let dir = log_dir()?;
    std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::daily(&dir, LOG_FILE_PREFIX));

    let timer = local_timer();
    let stdout_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_target(false)
        .with_writer(std::io::stdout);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);

    let subscriber = Registry::default()
        .with(env_filter())
        .with(stdout_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set(guard);

    tracing::info!("[Main] Logging to {}", dir.display());
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn local_timer() -> OffsetTime<&'static [BorrowedFormatItem<'static>]> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(
        offset,
        format_description!("[hour]:[minute]:[second].[subsecond digits:3]"),
    )
}

// === Tests ===
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_is_under_app_folder() {
        if let Ok(dir) = log_dir() {
            assert!(dir.ends_with("logs"));
            assert!(dir.to_string_lossy().to_lowercase().contains("volumeoverlay"));
        }
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}

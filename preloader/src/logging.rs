//! Log subscriber setup.
//!
//! The supervisor logs to a daily rolling file under the game directory and,
//! in headless sessions, to stderr as well. The helper logs to stderr only;
//! the supervisor forwards those lines into its own log.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::Local;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as layer_fmt, EnvFilter, Layer};

pub use tracing_appender::non_blocking::WorkerGuard;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log file name prefix inside the log directory.
pub const LOG_FILE_NAME: &str = "preloader.log";

/// Errors while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Local wall-clock timestamps.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the supervisor subscriber.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_supervisor_logging(log_dir: &Path, console: bool) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = console.then(|| {
        layer_fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimer)
            .boxed()
    });

    tracing_subscriber::registry()
        .with(env_filter())
        .with(console_layer)
        .with(
            layer_fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer),
        )
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    Ok(guard)
}

/// Install the helper subscriber: plain lines on stderr.
pub fn init_helper_logging() -> Result<(), LoggingError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            layer_fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .without_time()
                .with_target(false),
        )
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}

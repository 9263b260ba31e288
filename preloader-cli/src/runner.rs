//! Shared setup for commands that touch the game directory.

use std::path::{Path, PathBuf};

use preloader::config::{config_file_path, ControllerConfig};
use preloader::logging::{init_supervisor_logging, WorkerGuard};
use tracing::{info, warn};

use crate::error::CliError;

/// Log directory relative to the game directory.
pub const LOG_DIR: &str = "logs";

/// Loaded configuration plus the installed log subscriber.
///
/// Buffered log lines are flushed when the runner is dropped.
pub struct CliRunner {
    game_dir: PathBuf,
    config: ControllerConfig,
    _log_guard: WorkerGuard,
}

impl CliRunner {
    /// Install logging and load the configuration.
    ///
    /// `console` mirrors log lines to stderr. An unreadable or invalid config
    /// is reported and replaced by defaults so the game can still start.
    pub fn new(game_dir: &Path, console: bool) -> Result<Self, CliError> {
        let log_guard = init_supervisor_logging(&game_dir.join(LOG_DIR), console)?;

        let config = match ControllerConfig::load(game_dir) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_file_path(game_dir).display(),
                    "Using default configuration"
                );
                ControllerConfig::default()
            }
        };

        Ok(Self {
            game_dir: game_dir.to_path_buf(),
            config,
            _log_guard: log_guard,
        })
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command,
            game_dir = %self.game_dir.display(),
            entries = self.config.downloads.len(),
            "Preloader starting"
        );
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }
}

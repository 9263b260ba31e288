//! Helper command - progress display and decision source.
//!
//! Launched by `run` with the two shared file paths. Draws on stdout; log
//! lines go to stderr, which the supervisor forwards into its own log.

use std::path::PathBuf;
use std::time::Duration;

use preloader::coordination::SharedFiles;
use preloader::helper::{run_helper, HelperExit};
use preloader::logging::init_helper_logging;
use tracing::{info, warn};

use crate::error::CliError;
use crate::ui::ConsoleView;

/// Run the helper until the supervisor publishes a terminal message.
pub fn run(progress: PathBuf, decision: PathBuf, poll_interval_ms: u64) -> Result<(), CliError> {
    init_helper_logging()?;
    info!(progress = %progress.display(), "Helper starting");

    let files = SharedFiles::new(progress, decision);
    let mut view = ConsoleView::new();

    match run_helper(files, Duration::from_millis(poll_interval_ms), &mut view) {
        HelperExit::Done => Ok(()),
        HelperExit::Disconnected => {
            warn!("Progress poller stopped before the supervisor finished");
            Err(CliError::Exit(1))
        }
    }
}

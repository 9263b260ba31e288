//! Seams of the transfer engine.
//!
//! The engine talks to the network only through [`Downloader`], and the
//! orchestrator talks to the engine only through [`EntryProcessor`], so both
//! can be replaced in tests.

use std::path::Path;

use super::error::TransferResult;
use super::TransferOutcome;
use crate::config::DownloadEntry;

/// Stage an entry has reached inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// Turning the entry into a URL.
    Resolving,
    /// Fetching the file.
    Downloading,
}

impl TransferStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Resolving => "Resolving",
            Self::Downloading => "Downloading",
        }
    }
}

/// Callback notified at resolution start and transfer start.
pub type StatusCallback<'a> = &'a mut dyn FnMut(TransferStage);

/// Fetches a URL into a destination file.
pub trait Downloader: Send + Sync {
    /// Download `url` to `dest`, replacing any existing file atomically.
    ///
    /// Parent directories are created as needed. On error the destination is
    /// left as it was. Returns the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> TransferResult<u64>;
}

/// Processes a single download entry end to end.
pub trait EntryProcessor {
    /// Resolve, download and verify one entry.
    ///
    /// Never returns an error: every failure is reported as
    /// [`TransferOutcome::Failed`].
    fn process(&self, entry: &DownloadEntry, status: StatusCallback<'_>) -> TransferOutcome;
}

//! Per-entry transfer pipeline.
//!
//! For each entry the engine:
//!
//! 1. Skips it when the destination exists and the entry does not allow
//!    replacement. No resolution or network access happens in that case.
//! 2. Resolves the entry to a concrete URL and optional expected digest.
//! 3. Skips it when an existing destination already matches the digest.
//! 4. Backs up the existing destination when replacing is allowed.
//! 5. Downloads to a staging file and renames it over the destination.
//! 6. Verifies the digest according to [`HashMismatchPolicy`].
//!
//! Failures are contained: an entry that fails for any reason is reported as
//! [`TransferOutcome::Failed`] and the next entry is processed normally.

mod backup;
mod checksum;
mod error;
mod http;
mod traits;

pub use backup::{backup_file, BACKUP_DIR};
pub use checksum::{calculate_file_digest, verify_file, ExpectedHash, HashAlgorithm};
pub use error::{TransferError, TransferResult};
pub use http::HttpDownloader;
pub use traits::{Downloader, EntryProcessor, StatusCallback, TransferStage};

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DownloadEntry;
use crate::resolver::{ResolvedTransfer, SourceResolver};

/// Result of processing one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The file was downloaded and installed.
    Success,
    /// The entry could not be completed.
    Failed,
    /// Nothing needed to be done.
    Skipped,
}

/// What to do when a downloaded file does not match its expected digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMismatchPolicy {
    /// Keep the file and log a warning.
    #[default]
    Warn,
    /// Delete the file and mark the entry as failed.
    Fail,
}

/// Resolves, downloads and verifies entries relative to a game directory.
pub struct TransferEngine<R: SourceResolver, D: Downloader> {
    resolver: R,
    downloader: D,
    game_dir: PathBuf,
    backup_on_replace: bool,
    hash_mismatch: HashMismatchPolicy,
}

impl<R: SourceResolver, D: Downloader> TransferEngine<R, D> {
    /// Create an engine rooted at `game_dir`.
    pub fn new(resolver: R, downloader: D, game_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            downloader,
            game_dir: game_dir.into(),
            backup_on_replace: true,
            hash_mismatch: HashMismatchPolicy::default(),
        }
    }

    /// Enable or disable backups before replacement.
    pub fn with_backup_on_replace(mut self, value: bool) -> Self {
        self.backup_on_replace = value;
        self
    }

    /// Set the policy for digest mismatches after download.
    pub fn with_hash_mismatch(mut self, policy: HashMismatchPolicy) -> Self {
        self.hash_mismatch = policy;
        self
    }

    /// Absolute destination path for an entry.
    ///
    /// Rejects absolute paths and paths that climb out of the game directory.
    pub fn destination_path(&self, entry: &DownloadEntry) -> TransferResult<PathBuf> {
        let relative = &entry.destination;
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

        if relative.as_os_str().is_empty() || escapes {
            return Err(TransferError::InvalidDestination(relative.clone()));
        }

        Ok(self.game_dir.join(relative))
    }

    fn try_process(
        &self,
        entry: &DownloadEntry,
        status: StatusCallback<'_>,
    ) -> TransferResult<TransferOutcome> {
        let destination = self.destination_path(entry)?;

        if destination.exists() && !entry.replace_if_exists {
            info!(entry = %entry.name, "Destination exists, skipping");
            return Ok(TransferOutcome::Skipped);
        }

        status(TransferStage::Resolving);
        let resolved = self.resolver.resolve(entry)?;

        self.install(entry, &resolved, &destination, status)
    }

    /// Install an already-resolved entry at `destination`.
    fn install(
        &self,
        entry: &DownloadEntry,
        resolved: &ResolvedTransfer,
        destination: &Path,
        status: StatusCallback<'_>,
    ) -> TransferResult<TransferOutcome> {
        if destination.exists() {
            if let Some(expected) = &resolved.expected_hash {
                let existing = calculate_file_digest(destination, expected.algorithm)?;
                if expected.matches(&existing) {
                    info!(entry = %entry.name, "Existing file matches expected digest, skipping");
                    return Ok(TransferOutcome::Skipped);
                }
            }

            if self.backup_on_replace {
                let backup = backup_file(destination)?;
                info!(entry = %entry.name, backup = %backup.display(), "Backed up existing file");
            }
        }

        status(TransferStage::Downloading);
        let bytes = self.downloader.download(&resolved.url, destination)?;

        if let Some(expected) = &resolved.expected_hash {
            if let Err(e) = verify_file(destination, expected) {
                match self.hash_mismatch {
                    HashMismatchPolicy::Warn => {
                        warn!(entry = %entry.name, algorithm = expected.algorithm.name(), error = %e, "Digest mismatch, keeping file");
                    }
                    HashMismatchPolicy::Fail => {
                        if let Err(remove_err) = fs::remove_file(destination) {
                            warn!(path = %destination.display(), error = %remove_err, "Failed to remove mismatched file");
                        }
                        return Err(e);
                    }
                }
            }
        }

        info!(entry = %entry.name, bytes, url = %resolved.url, "Installed");
        Ok(TransferOutcome::Success)
    }
}

impl<R: SourceResolver, D: Downloader> EntryProcessor for TransferEngine<R, D> {
    fn process(&self, entry: &DownloadEntry, status: StatusCallback<'_>) -> TransferOutcome {
        match self.try_process(entry, status) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(entry = %entry.name, error = %e, "Transfer failed");
                TransferOutcome::Failed
            }
        }
    }
}

//! The two shared files.
//!
//! Every write serializes the full payload first and then replaces the file
//! with a rename, so a reader never sees half a message. Reads are tolerant:
//! a missing, empty or unparsable file reads as "nothing yet".

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::error::{ProtocolError, ProtocolResult};
use super::message::{DecisionMessage, ProgressMessage};

/// Progress file name in the game directory.
pub const PROGRESS_FILE: &str = "preloader_progress.json";

/// Decision file name in the game directory.
pub const DECISION_FILE: &str = "preloader_decision.json";

/// Replace `path` with `bytes` in one rename.
///
/// Parent directories are created as needed.
pub fn write_replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut staging = NamedTempFile::new_in(parent)?;
    staging.write_all(bytes)?;
    staging.flush()?;
    staging.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Paths of the progress and decision files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFiles {
    progress: PathBuf,
    decision: PathBuf,
}

impl SharedFiles {
    pub fn new(progress: impl Into<PathBuf>, decision: impl Into<PathBuf>) -> Self {
        Self {
            progress: progress.into(),
            decision: decision.into(),
        }
    }

    /// Default file names inside a directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PROGRESS_FILE), dir.join(DECISION_FILE))
    }

    pub fn progress_path(&self) -> &Path {
        &self.progress
    }

    pub fn decision_path(&self) -> &Path {
        &self.decision
    }

    /// Replace the progress file.
    pub fn write_progress(&self, message: &ProgressMessage) -> ProtocolResult<()> {
        let json = serde_json::to_vec(message).map_err(ProtocolError::Encode)?;
        write_replace(&self.progress, &json).map_err(|source| ProtocolError::Io {
            path: self.progress.clone(),
            source,
        })
    }

    /// Latest progress message, if one can be read.
    pub fn read_progress(&self) -> Option<ProgressMessage> {
        read_json(&self.progress)
    }

    /// Replace the decision file.
    pub fn write_decision(&self, decision: &DecisionMessage) -> ProtocolResult<()> {
        let json = serde_json::to_vec(decision).map_err(ProtocolError::Encode)?;
        write_replace(&self.decision, &json).map_err(|source| ProtocolError::Io {
            path: self.decision.clone(),
            source,
        })
    }

    /// Current decision without consuming it.
    pub fn read_decision(&self) -> Option<DecisionMessage> {
        read_json(&self.decision)
    }

    /// Read the decision and delete the file so it is consumed once.
    pub fn take_decision(&self) -> Option<DecisionMessage> {
        let decision = self.read_decision()?;
        if let Err(e) = remove_if_exists(&self.decision) {
            debug!(path = %self.decision.display(), error = %e, "Failed to remove decision file");
        }
        Some(decision)
    }

    /// Delete a stale decision before a new decision phase.
    pub fn clear_decision(&self) -> ProtocolResult<()> {
        remove_if_exists(&self.decision).map_err(|source| ProtocolError::Io {
            path: self.decision.clone(),
            source,
        })
    }

    /// Delete both files.
    pub fn remove_all(&self) {
        for path in [&self.progress, &self.decision] {
            if let Err(e) = remove_if_exists(path) {
                debug!(path = %path.display(), error = %e, "Failed to remove shared file");
            }
        }
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read(path).ok()?;
    if content.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Ignoring unreadable shared file");
            None
        }
    }
}

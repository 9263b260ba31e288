//! Error types for the transfer engine.

use std::io;
use std::path::PathBuf;

use crate::resolver::ResolutionError;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors that can occur while transferring a single entry.
///
/// None of these escape the engine: each one marks its entry as failed.
#[derive(Debug)]
pub enum TransferError {
    /// The entry could not be resolved to a URL.
    Resolution(ResolutionError),

    /// Destination is absolute or leaves the game directory.
    InvalidDestination(PathBuf),

    /// Failed to read a file.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to copy an existing file into the backup directory.
    BackupFailed { path: PathBuf, source: io::Error },

    /// The HTTP client could not be constructed.
    ClientInit(String),

    /// Transport-level download failure.
    DownloadFailed { url: String, reason: String },

    /// Server answered with a non-success status.
    HttpStatus { url: String, status: u16 },

    /// Network timeout.
    Timeout { url: String, timeout_secs: u64 },

    /// Downloaded file does not match the expected digest.
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolution(e) => write!(f, "resolution failed: {}", e),
            Self::InvalidDestination(path) => {
                write!(
                    f,
                    "destination {} must be relative to the game directory",
                    path.display()
                )
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::BackupFailed { path, source } => {
                write!(f, "failed to back up {}: {}", path.display(), source)
            }
            Self::ClientInit(reason) => write!(f, "failed to create HTTP client: {}", reason),
            Self::DownloadFailed { url, reason } => {
                write!(f, "failed to download {}: {}", url, reason)
            }
            Self::HttpStatus { url, status } => {
                write!(f, "download of {} returned HTTP {}", url, status)
            }
            Self::Timeout { url, timeout_secs } => {
                write!(f, "request to {} timed out after {}s", url, timeout_secs)
            }
            Self::ChecksumMismatch {
                filename,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "checksum mismatch for {}: expected {}, got {}",
                    filename, expected, actual
                )
            }
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolution(e) => Some(e),
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            Self::BackupFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ResolutionError> for TransferError {
    fn from(e: ResolutionError) -> Self {
        Self::Resolution(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_mismatch_display() {
        let err = TransferError::ChecksumMismatch {
            filename: "mod.jar".to_string(),
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        assert!(err.to_string().contains("checksum mismatch"));
        assert!(err.to_string().contains("abc123"));
        assert!(err.to_string().contains("def456"));
    }

    #[test]
    fn test_resolution_error_is_source() {
        use std::error::Error;

        let err: TransferError = ResolutionError::MissingField {
            provider: "Modrinth",
            field: "files",
        }
        .into();

        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("resolution failed"));
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for coordination operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Failures of the supervisor/helper protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to access {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),

    #[error("failed to launch helper: {0}")]
    HelperLaunch(io::Error),

    #[error("helper exited before a decision was made")]
    HelperExited,

    #[error("no helper and no interactive terminal to ask: {0}")]
    NoDecisionSource(String),

    #[error("terminal prompt failed: {0}")]
    Prompt(io::Error),
}

//! CLI error type.

use std::fmt;

use preloader::config::ConfigError;
use preloader::coordination::ProtocolError;
use preloader::logging::LoggingError;
use preloader::resolver::ResolutionError;
use preloader::transfer::TransferError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid arguments or setup failures
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigError),
    /// Logging could not be installed
    Logging(LoggingError),
    /// Supervisor/helper coordination failed
    Protocol(ProtocolError),
    /// An entry could not be resolved
    Resolution(ResolutionError),
    /// Downloader setup failed
    Transfer(TransferError),
    /// Filesystem error
    Io(std::io::Error),
    /// The process should exit with this status
    Exit(i32),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "Configuration error: {}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Protocol(e) => write!(f, "Coordination error: {}", e),
            CliError::Resolution(e) => write!(f, "Resolution error: {}", e),
            CliError::Transfer(e) => write!(f, "Download error: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Exit(code) => write!(f, "Exiting with status {}", code),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Protocol(e) => Some(e),
            CliError::Resolution(e) => Some(e),
            CliError::Transfer(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Config(_) | CliError::Exit(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ProtocolError> for CliError {
    fn from(e: ProtocolError) -> Self {
        CliError::Protocol(e)
    }
}

impl From<ResolutionError> for CliError {
    fn from(e: ResolutionError) -> Self {
        CliError::Resolution(e)
    }
}

impl From<TransferError> for CliError {
    fn from(e: TransferError) -> Self {
        CliError::Transfer(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

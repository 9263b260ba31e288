//! CLI subcommands.

pub mod check;
pub mod config;
pub mod helper;
pub mod init;
pub mod reset;
pub mod run;

use preloader::config::ControllerConfig;
use preloader::resolver::ReqwestClient;

use crate::error::CliError;

/// Registry client honoring the configured HTTP timeout.
pub fn registry_client(config: &ControllerConfig) -> Result<ReqwestClient, CliError> {
    Ok(ReqwestClient::with_timeout(config.http_timeout())?)
}

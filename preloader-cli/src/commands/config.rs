//! Configuration management CLI commands.

use std::path::Path;

use clap::Subcommand;
use preloader::config::config_file_path;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(game_dir: &Path, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(game_dir),
    }
}

/// Print the configuration file path.
fn run_path(game_dir: &Path) -> Result<(), CliError> {
    println!("{}", config_file_path(game_dir).display());
    Ok(())
}

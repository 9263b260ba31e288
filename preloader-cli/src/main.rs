//! Preloader CLI.
//!
//! `preloader run` is the supervisor: it downloads the configured files
//! before the game starts and shows progress through a helper process.
//! `preloader helper` is that helper and is launched by `run` itself.

mod commands;
mod error;
mod runner;
mod ui;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "preloader")]
#[command(version, about = "Download a modpack's required files before the game starts", long_about = None)]
struct Cli {
    /// Game directory holding config/, mods/ and the log directory
    #[arg(long, global = true, default_value = ".")]
    game_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the preloader before launching the game
    Run {
        /// Never launch the helper; ask on the terminal instead
        #[arg(long, conflicts_with = "interactive")]
        headless: bool,

        /// Always launch the helper, even without a terminal
        #[arg(long)]
        interactive: bool,

        /// Give up waiting for a decision after this many milliseconds
        #[arg(long)]
        decision_timeout_ms: Option<u64>,
    },

    /// Show progress and collect decisions (started by `run`)
    #[command(hide = true)]
    Helper {
        /// Progress file written by the supervisor
        progress: PathBuf,

        /// Decision file read by the supervisor
        decision: PathBuf,

        /// Progress file poll interval in milliseconds
        #[arg(long, default_value_t = preloader::config::DEFAULT_POLL_INTERVAL_MS)]
        poll_interval_ms: u64,
    },

    /// Create a configuration file with example entries
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Remove the first-run marker so the next launch runs again
    Reset,

    /// Resolve every enabled entry without downloading anything
    Check,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            headless,
            interactive,
            decision_timeout_ms,
        } => commands::run::run(commands::run::RunArgs {
            game_dir: cli.game_dir,
            headless,
            interactive,
            decision_timeout_ms,
        }),
        Commands::Helper {
            progress,
            decision,
            poll_interval_ms,
        } => commands::helper::run(progress, decision, poll_interval_ms),
        Commands::Init { force } => commands::init::run(&cli.game_dir, force),
        Commands::Reset => commands::reset::run(&cli.game_dir),
        Commands::Check => commands::check::run(&cli.game_dir),
        Commands::Config { command } => commands::config::run(&cli.game_dir, command),
    };

    match result {
        Ok(()) => {}
        Err(CliError::Exit(code)) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

//! Run command - the supervisor.
//!
//! Detects the session kind, wires the resolver, downloader and orchestrator
//! from the configuration and hands them to the supervisor together with the
//! matching coordinator.

use std::path::PathBuf;
use std::process;

use atty::Stream;
use preloader::config::ControllerConfig;
use preloader::coordination::{
    detect_session, Coordinator, DecisionPolicy, EnvironmentProbe, FileCoordinator,
    ProcessHelperLauncher, ProgressMessage, SessionKind, SharedFiles, TerminalCoordinator,
    TerminalPrompt,
};
use preloader::orchestrator::Orchestrator;
use preloader::resolver::EntryResolver;
use preloader::supervisor::{Supervisor, SupervisorOutcome};
use preloader::transfer::{EntryProcessor, HttpDownloader, TransferEngine};
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Exit status after Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

/// Arguments for the run command.
pub struct RunArgs {
    pub game_dir: PathBuf,
    pub headless: bool,
    pub interactive: bool,
    pub decision_timeout_ms: Option<u64>,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let probe = EnvironmentProbe::for_game_dir(&args.game_dir)
        .with_terminals(atty::is(Stream::Stdin), atty::is(Stream::Stdout))
        .with_overrides(args.headless, args.interactive);
    let session = detect_session(&probe);

    // The helper owns the terminal in interactive sessions.
    let runner = CliRunner::new(&args.game_dir, session == SessionKind::Headless)?;
    runner.log_startup("run");
    info!(?session, ?probe, "Session detected");

    let mut config = runner.config().clone();
    if args.decision_timeout_ms.is_some() {
        config = config.with_decision_timeout_ms(args.decision_timeout_ms);
    }
    let game_dir = runner.game_dir().to_path_buf();

    let resolver = EntryResolver::from_config(super::registry_client(&config)?, &config);
    let downloader = HttpDownloader::with_timeout(config.http_timeout())?;
    let engine = TransferEngine::new(resolver, downloader, game_dir.clone())
        .with_backup_on_replace(config.backup_on_replace)
        .with_hash_mismatch(config.hash_mismatch);
    let orchestrator = Orchestrator::from_config(engine, &config, &game_dir);

    let files = SharedFiles::in_dir(&game_dir);
    install_interrupt_handler(files.clone())?;

    let outcome = match session {
        SessionKind::Interactive => {
            let policy = DecisionPolicy::new(config.poll_interval())
                .with_timeout(config.decision_timeout(), config.timeout_decision);
            let launcher = ProcessHelperLauncher::current_exe(&game_dir)?;
            let coordinator = FileCoordinator::new(files.clone(), launcher, policy)
                .with_fallback(TerminalPrompt::stdio());
            supervise(coordinator, orchestrator, &config)
        }
        SessionKind::Headless => {
            let coordinator =
                TerminalCoordinator::new(TerminalPrompt::stdio(), config.timeout_decision);
            supervise(coordinator, orchestrator, &config)
        }
    };

    files.remove_all();
    report(outcome)
}

fn supervise<C: Coordinator, P: EntryProcessor>(
    coordinator: C,
    orchestrator: Orchestrator<P>,
    config: &ControllerConfig,
) -> SupervisorOutcome {
    Supervisor::new(coordinator, orchestrator)
        .with_require_consent(config.require_consent)
        .run()
}

/// Tell a live helper to close, then exit.
fn install_interrupt_handler(files: SharedFiles) -> Result<(), CliError> {
    ctrlc::set_handler(move || {
        warn!("Interrupted, closing helper");
        let message = ProgressMessage::new("Exiting", 100, "Interrupted").finished();
        if let Err(e) = files.write_progress(&message) {
            warn!(error = %e, "Failed to publish interrupt");
        }
        process::exit(EXIT_INTERRUPTED);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))
}

fn report(outcome: SupervisorOutcome) -> Result<(), CliError> {
    match outcome {
        SupervisorOutcome::Skipped => {
            println!("Nothing to download.");
            Ok(())
        }
        SupervisorOutcome::Completed(result) => {
            println!(
                "Downloaded {} file(s) ({} skipped).",
                result.success, result.skipped
            );
            Ok(())
        }
        SupervisorOutcome::ContinuedWithFailures(result) => {
            println!(
                "Continuing without {} failed download(s); {} succeeded, {} skipped.",
                result.failed, result.success, result.skipped
            );
            Ok(())
        }
        SupervisorOutcome::Exit { code } => Err(CliError::Exit(code)),
    }
}

//! Supervisor state machine.
//!
//! ```text
//! START
//!   -> [consent required] ask consent      accept -> continue, otherwise Exit(0)
//!   -> [!should_run]                       -> Skipped
//!   -> Initializing, attach display
//!   -> run orchestrator, publish each event
//!   -> [failures] ask continue/exit        exit -> Exit(1), continue -> ContinuedWithFailures
//!   -> Complete
//! ```
//!
//! The supervisor never exits the process itself; the caller maps the
//! returned [`SupervisorOutcome`] to an exit status.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::coordination::{Coordinator, ProgressMessage, ProtocolError, Question, Verdict};
use crate::orchestrator::{OrchestrationError, Orchestrator, RunResult};
use crate::transfer::EntryProcessor;

/// Exit status when the user chooses to exit after failures, or on fatal
/// errors.
pub const EXIT_FAILURE: i32 = 1;

/// Exit status when consent is declined.
pub const EXIT_DECLINED: i32 = 0;

/// Fatal supervisor errors.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),
}

/// How a supervised launch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// Nothing to do on this launch.
    Skipped,
    /// All entries succeeded or were skipped.
    Completed(RunResult),
    /// Some entries failed and the user chose to continue.
    ContinuedWithFailures(RunResult),
    /// The host should exit with this status.
    Exit { code: i32 },
}

impl SupervisorOutcome {
    /// Exit status the host should terminate with, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit { code } => Some(*code),
            _ => None,
        }
    }
}

/// Drives consent, the orchestrated run and the failure decision.
pub struct Supervisor<C: Coordinator, P: EntryProcessor> {
    coordinator: C,
    orchestrator: Orchestrator<P>,
    require_consent: bool,
}

impl<C: Coordinator, P: EntryProcessor> Supervisor<C, P> {
    pub fn new(coordinator: C, orchestrator: Orchestrator<P>) -> Self {
        Self {
            coordinator,
            orchestrator,
            require_consent: false,
        }
    }

    pub fn with_require_consent(mut self, value: bool) -> Self {
        self.require_consent = value;
        self
    }

    pub fn coordinator(&self) -> &C {
        &self.coordinator
    }

    /// Run one supervised launch.
    pub fn run(&mut self) -> SupervisorOutcome {
        match self.drive() {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Preloader failed");
                if let Err(publish_err) = self.coordinator.finish(ProgressMessage::error(e.to_string())) {
                    warn!(error = %publish_err, "Failed to publish error state");
                }
                SupervisorOutcome::Exit { code: EXIT_FAILURE }
            }
        }
    }

    fn drive(&mut self) -> Result<SupervisorOutcome, SupervisorError> {
        if self.require_consent {
            match self.coordinator.decide(Question::Consent)? {
                Verdict::Proceed => {
                    info!("Consent granted");
                    self.coordinator.publish(&ProgressMessage::new(
                        "Consent Granted",
                        0,
                        "Preparing downloads...",
                    ))?;
                }
                Verdict::Exit => {
                    info!("Consent declined");
                    self.coordinator.finish(ProgressMessage::new(
                        "Exiting",
                        0,
                        "Consent not granted. Exiting...",
                    ))?;
                    return Ok(SupervisorOutcome::Exit {
                        code: EXIT_DECLINED,
                    });
                }
            }
        }

        if !self.orchestrator.should_run() {
            info!("No downloads needed");
            if self.require_consent {
                self.coordinator
                    .finish(ProgressMessage::new("Complete", 100, "No downloads needed"))?;
            }
            return Ok(SupervisorOutcome::Skipped);
        }

        self.coordinator.publish(&ProgressMessage::new(
            "Initializing",
            0,
            "Starting download process...",
        ))?;
        self.coordinator.attach()?;

        let result = {
            let coordinator = &mut self.coordinator;
            self.orchestrator.run(&mut |event| {
                if let Err(e) = coordinator.publish(&ProgressMessage::from(event)) {
                    warn!(error = %e, "Failed to publish progress");
                }
            })?
        };

        if result.has_failures() {
            let question = Question::ContinueAfterFailures {
                failed: result.failed,
            };
            return match self.coordinator.decide(question)? {
                Verdict::Exit => {
                    self.coordinator
                        .finish(ProgressMessage::new("Exiting", 100, "Closing the game..."))?;
                    Ok(SupervisorOutcome::Exit { code: EXIT_FAILURE })
                }
                Verdict::Proceed => {
                    self.coordinator.finish(ProgressMessage::new(
                        "Continuing",
                        100,
                        format!(
                            "Continuing without {} failed download(s).",
                            result.failed
                        ),
                    ))?;
                    Ok(SupervisorOutcome::ContinuedWithFailures(result))
                }
            };
        }

        self.coordinator.finish(ProgressMessage::new(
            "Complete",
            100,
            format!(
                "Downloaded {} file(s) ({} skipped)",
                result.success, result.skipped
            ),
        ))?;
        Ok(SupervisorOutcome::Completed(result))
    }
}

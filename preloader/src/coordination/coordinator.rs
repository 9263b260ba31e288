//! How the supervisor shows progress and obtains decisions.
//!
//! [`FileCoordinator`] drives a helper process through the shared files.
//! [`TerminalCoordinator`] logs progress and asks on the terminal, and is
//! used when the session is headless.

use std::time::Duration;

use tracing::{info, warn};

use super::channel::SharedFiles;
use super::error::{ProtocolError, ProtocolResult};
use super::helper_process::{HelperHandle, HelperLauncher};
use super::message::{ProgressMessage, Question, Verdict};
use super::prompt::TerminalPrompt;
use super::wait::{DecisionWait, WaitOutcome};

/// Number of poll intervals a helper gets to exit after the terminal message.
const EXIT_GRACE_POLLS: u32 = 20;

/// Progress display and decision source used by the supervisor.
pub trait Coordinator {
    /// Make sure progress is being displayed.
    fn attach(&mut self) -> ProtocolResult<()>;

    /// Publish a progress update.
    fn publish(&mut self, message: &ProgressMessage) -> ProtocolResult<()>;

    /// Ask a question and block until it is answered.
    fn decide(&mut self, question: Question) -> ProtocolResult<Verdict>;

    /// Publish a terminal message and release the display.
    fn finish(&mut self, message: ProgressMessage) -> ProtocolResult<()>;
}

/// Shared answer for timeouts and blank terminal input.
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    pub wait: DecisionWait,
    pub default_verdict: Verdict,
}

impl DecisionPolicy {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            wait: DecisionWait::new(poll_interval),
            default_verdict: Verdict::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>, verdict: Verdict) -> Self {
        self.wait = self.wait.with_timeout(timeout);
        self.default_verdict = verdict;
        self
    }
}

/// Coordinator backed by a helper process and the shared files.
pub struct FileCoordinator<L: HelperLauncher> {
    files: SharedFiles,
    launcher: L,
    helper: Option<Box<dyn HelperHandle>>,
    policy: DecisionPolicy,
    fallback: Option<TerminalPrompt>,
    degraded: bool,
}

impl<L: HelperLauncher> FileCoordinator<L> {
    pub fn new(files: SharedFiles, launcher: L, policy: DecisionPolicy) -> Self {
        Self {
            files,
            launcher,
            helper: None,
            policy,
            fallback: None,
            degraded: false,
        }
    }

    /// Terminal prompt used when the helper cannot be started or dies.
    pub fn with_fallback(mut self, prompt: TerminalPrompt) -> Self {
        self.fallback = Some(prompt);
        self
    }

    pub fn files(&self) -> &SharedFiles {
        &self.files
    }

    /// Whether a helper is running right now.
    pub fn helper_alive(&mut self) -> bool {
        self.helper.as_mut().map(|h| h.is_alive()).unwrap_or(false)
    }

    /// Ask on the fallback terminal, or fail when there is none.
    fn ask_fallback(&mut self, question: Question, reason: &str) -> ProtocolResult<Verdict> {
        let default = self.policy.default_verdict;
        match self.fallback.as_mut() {
            Some(prompt) => {
                warn!(reason, "Asking on the terminal instead of the helper");
                let yes = prompt.ask_yes_no(&question.terminal_text(), default == Verdict::Proceed)?;
                Ok(if yes { Verdict::Proceed } else { Verdict::Exit })
            }
            None => Err(ProtocolError::NoDecisionSource(reason.to_string())),
        }
    }
}

impl<L: HelperLauncher> Coordinator for FileCoordinator<L> {
    fn attach(&mut self) -> ProtocolResult<()> {
        if self.degraded || self.helper_alive() {
            return Ok(());
        }

        match self.launcher.launch(&self.files) {
            Ok(handle) => {
                self.helper = Some(handle);
                Ok(())
            }
            Err(e) if self.fallback.is_some() => {
                warn!(error = %e, "Helper unavailable, continuing without it");
                self.degraded = true;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn publish(&mut self, message: &ProgressMessage) -> ProtocolResult<()> {
        self.files.write_progress(message)
    }

    fn decide(&mut self, question: Question) -> ProtocolResult<Verdict> {
        self.files.clear_decision()?;
        self.files.write_progress(&question.message())?;
        self.attach()?;

        if self.degraded {
            return self.ask_fallback(question, "helper could not be started");
        }

        let wait = self.policy.wait;
        let outcome = {
            let files = &self.files;
            let helper = &mut self.helper;
            wait.wait(files, || helper.as_mut().map(|h| h.is_alive()).unwrap_or(false))
        };

        match outcome {
            WaitOutcome::Decided(decision) => {
                let verdict = question.interpret(&decision.action);
                info!(action = %decision.action, ?verdict, "Decision received");
                Ok(verdict)
            }
            WaitOutcome::TimedOut => {
                let verdict = self.policy.default_verdict;
                warn!(?verdict, "No decision before timeout, using default");
                Ok(verdict)
            }
            WaitOutcome::SourceGone => {
                self.helper = None;
                self.degraded = true;
                self.ask_fallback(question, "helper exited without a decision")
                    .map_err(|e| match e {
                        ProtocolError::NoDecisionSource(_) => ProtocolError::HelperExited,
                        other => other,
                    })
            }
        }
    }

    fn finish(&mut self, message: ProgressMessage) -> ProtocolResult<()> {
        let result = self.files.write_progress(&message.finished());

        if let Some(mut helper) = self.helper.take() {
            helper.finish(self.policy.wait.poll_interval() * EXIT_GRACE_POLLS);
        }
        if let Err(e) = self.files.clear_decision() {
            warn!(error = %e, "Failed to remove decision file");
        }

        result
    }
}

/// Coordinator for headless sessions: progress goes to the log, questions
/// to a line prompt.
pub struct TerminalCoordinator {
    prompt: TerminalPrompt,
    default_verdict: Verdict,
}

impl TerminalCoordinator {
    pub fn new(prompt: TerminalPrompt, default_verdict: Verdict) -> Self {
        Self {
            prompt,
            default_verdict,
        }
    }
}

impl Coordinator for TerminalCoordinator {
    fn attach(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn publish(&mut self, message: &ProgressMessage) -> ProtocolResult<()> {
        info!(
            phase = %message.phase,
            progress = message.progress,
            "{}",
            message.message
        );
        Ok(())
    }

    fn decide(&mut self, question: Question) -> ProtocolResult<Verdict> {
        let yes = self.prompt.ask_yes_no(
            &question.terminal_text(),
            self.default_verdict == Verdict::Proceed,
        )?;
        Ok(if yes { Verdict::Proceed } else { Verdict::Exit })
    }

    fn finish(&mut self, message: ProgressMessage) -> ProtocolResult<()> {
        self.publish(&message.finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::helper_process::tests::RecordingLauncher;
    use crate::coordination::message::{DecisionMessage, PromptMode};
    use std::io::Cursor;
    use std::sync::atomic::Ordering;
    use std::thread;
    use tempfile::TempDir;

    fn policy() -> DecisionPolicy {
        DecisionPolicy::new(Duration::from_millis(5))
    }

    fn prompt(input: &str) -> TerminalPrompt {
        TerminalPrompt::new(
            Box::new(Cursor::new(input.as_bytes().to_vec())),
            Box::new(std::io::sink()),
        )
    }

    #[test]
    fn test_attach_never_launches_twice() {
        let temp = TempDir::new().unwrap();
        let launcher = RecordingLauncher::default();
        let mut coordinator =
            FileCoordinator::new(SharedFiles::in_dir(temp.path()), launcher.clone(), policy());

        coordinator.attach().unwrap();
        coordinator.attach().unwrap();

        assert_eq!(launcher.launches(), 1);
    }

    #[test]
    fn test_relaunches_after_helper_exit() {
        let temp = TempDir::new().unwrap();
        let launcher = RecordingLauncher::default();
        let mut coordinator =
            FileCoordinator::new(SharedFiles::in_dir(temp.path()), launcher.clone(), policy());

        coordinator.attach().unwrap();
        launcher.state.alive.store(false, Ordering::SeqCst);
        coordinator.attach().unwrap();

        assert_eq!(launcher.launches(), 2);
    }

    #[test]
    fn test_stale_decision_is_cleared_before_waiting() {
        let temp = TempDir::new().unwrap();
        let files = SharedFiles::in_dir(temp.path());
        files.write_decision(&DecisionMessage::new("accept")).unwrap();

        let launcher = RecordingLauncher::default();
        let mut coordinator = FileCoordinator::new(
            files.clone(),
            launcher,
            policy().with_timeout(Some(Duration::from_millis(40)), Verdict::Exit),
        );

        let verdict = coordinator.decide(Question::Consent).unwrap();

        assert_eq!(verdict, Verdict::Exit);
    }

    #[test]
    fn test_decide_writes_question_and_reads_answer() {
        let temp = TempDir::new().unwrap();
        let files = SharedFiles::in_dir(temp.path());
        let answerer = files.clone();

        let handle = thread::spawn(move || loop {
            if let Some(msg) = answerer.read_progress() {
                if msg.mode == PromptMode::Prompt {
                    answerer.write_decision(&DecisionMessage::new("EXIT")).unwrap();
                    return;
                }
            }
            thread::sleep(Duration::from_millis(2));
        });

        let mut coordinator =
            FileCoordinator::new(files, RecordingLauncher::default(), policy());
        let verdict = coordinator
            .decide(Question::ContinueAfterFailures { failed: 3 })
            .unwrap();
        handle.join().unwrap();

        assert_eq!(verdict, Verdict::Exit);
    }

    #[test]
    fn test_launch_failure_uses_fallback() {
        let temp = TempDir::new().unwrap();
        let mut coordinator = FileCoordinator::new(
            SharedFiles::in_dir(temp.path()),
            RecordingLauncher::failing(),
            policy(),
        )
        .with_fallback(prompt("n\n"));

        let verdict = coordinator.decide(Question::Consent).unwrap();

        assert_eq!(verdict, Verdict::Exit);
    }

    #[test]
    fn test_launch_failure_without_fallback_is_error() {
        let temp = TempDir::new().unwrap();
        let mut coordinator = FileCoordinator::new(
            SharedFiles::in_dir(temp.path()),
            RecordingLauncher::failing(),
            policy(),
        );

        let result = coordinator.decide(Question::Consent);

        assert!(matches!(result, Err(ProtocolError::HelperLaunch(_))));
    }

    #[test]
    fn test_helper_death_without_fallback_is_error() {
        let temp = TempDir::new().unwrap();
        let launcher = RecordingLauncher::default();
        let mut coordinator =
            FileCoordinator::new(SharedFiles::in_dir(temp.path()), launcher.clone(), policy());
        coordinator.attach().unwrap();
        launcher.state.alive.store(false, Ordering::SeqCst);

        // The dead helper is relaunched by attach, then dies again.
        let state = launcher.state.clone();
        let killer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            state.alive.store(false, Ordering::SeqCst);
        });
        let result = coordinator.decide(Question::Consent);
        killer.join().unwrap();

        assert!(matches!(result, Err(ProtocolError::HelperExited)));
    }

    #[test]
    fn test_finish_writes_done_and_releases_helper() {
        let temp = TempDir::new().unwrap();
        let files = SharedFiles::in_dir(temp.path());
        let launcher = RecordingLauncher::default();
        let mut coordinator = FileCoordinator::new(files.clone(), launcher.clone(), policy());

        coordinator.attach().unwrap();
        coordinator
            .finish(ProgressMessage::new("Complete", 100, "Downloaded 1 file(s) (0 skipped)"))
            .unwrap();

        let last = files.read_progress().unwrap();
        assert!(last.done);
        assert_eq!(last.phase, "Complete");
        assert!(!coordinator.helper_alive());
    }

    #[test]
    fn test_terminal_coordinator_default_on_blank() {
        let mut coordinator = TerminalCoordinator::new(prompt("\n"), Verdict::Proceed);
        assert_eq!(
            coordinator.decide(Question::Consent).unwrap(),
            Verdict::Proceed
        );

        let mut strict = TerminalCoordinator::new(prompt(""), Verdict::Exit);
        assert_eq!(
            strict
                .decide(Question::ContinueAfterFailures { failed: 1 })
                .unwrap(),
            Verdict::Exit
        );
    }
}

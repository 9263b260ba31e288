//! Helper side of the coordination protocol.
//!
//! A polling thread reads the progress file and sends decoded messages over
//! a channel. The UI thread only ever sees decoded [`ProgressMessage`]s: it
//! renders them, asks when a message carries a prompt mode, writes the
//! answer to the decision file and stops after the first `done` message.
//! A dismissed prompt stays pending and is asked again after one poll
//! interval unless a newer message replaced it.
//!
//! Rendering is supplied by the caller through [`HelperView`].

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::coordination::{Decision, DecisionMessage, ProgressMessage, PromptMode, SharedFiles};

/// A question shown to the user with its two buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub mode: PromptMode,
    pub title: String,
    pub message: String,
    /// Positive button first.
    pub choices: [(&'static str, Decision); 2],
}

impl Prompt {
    /// Prompt carried by a message, if any.
    pub fn from_message(message: &ProgressMessage) -> Option<Self> {
        if !message.wants_decision() {
            return None;
        }
        let choices = match message.mode {
            PromptMode::Consent => [("I Consent", Decision::Accept), ("Exit", Decision::Exit)],
            PromptMode::Prompt => [
                ("Continue Anyway", Decision::Continue),
                ("Exit Game", Decision::Exit),
            ],
            PromptMode::None => return None,
        };
        Some(Self {
            mode: message.mode,
            title: message.phase.clone(),
            message: message.message.clone(),
            choices,
        })
    }

    /// Answer used when the prompt cannot be shown at all: decline consent,
    /// keep going after failures.
    pub fn safe_decision(&self) -> Decision {
        match self.mode {
            PromptMode::Prompt => Decision::Continue,
            PromptMode::Consent | PromptMode::None => Decision::Exit,
        }
    }
}

/// Rendering surface of the helper.
pub trait HelperView {
    /// Show a progress snapshot.
    fn render(&mut self, message: &ProgressMessage);

    /// Ask the user. `None` means the prompt was dismissed without an answer.
    fn ask(&mut self, prompt: &Prompt) -> Option<Decision>;

    /// Tear the view down. Called exactly once.
    fn dispose(&mut self);
}

/// What the UI thread should do with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Render,
    Ask(Prompt),
    Stop,
}

/// UI-side state machine.
///
/// `done` is observed once and then every later message is ignored. A prompt
/// is asked once per distinct (mode, phase, message); repeated writes of the
/// same prompt only re-render.
#[derive(Debug, Default)]
pub struct HelperSession {
    answered: Option<(PromptMode, String, String)>,
    finished: bool,
}

impl HelperSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn observe(&mut self, message: &ProgressMessage) -> Step {
        if self.finished {
            return Step::Stop;
        }
        if message.done {
            self.finished = true;
            return Step::Stop;
        }

        match Prompt::from_message(message) {
            Some(prompt) => {
                let key = (prompt.mode, prompt.title.clone(), prompt.message.clone());
                if self.answered.as_ref() == Some(&key) {
                    Step::Render
                } else {
                    Step::Ask(prompt)
                }
            }
            None => {
                self.answered = None;
                Step::Render
            }
        }
    }

    /// Record that the current prompt has been answered.
    pub fn answered(&mut self, prompt: &Prompt) {
        self.answered = Some((prompt.mode, prompt.title.clone(), prompt.message.clone()));
    }
}

/// How the helper ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperExit {
    /// A terminal message was observed.
    Done,
    /// The poller stopped without a terminal message.
    Disconnected,
}

/// Spawn the thread that polls the progress file.
///
/// Only changed messages are sent. The thread ends after sending a `done`
/// message or when the receiver is dropped.
pub fn spawn_poller(
    files: SharedFiles,
    poll_interval: Duration,
) -> (Receiver<ProgressMessage>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || poll_progress(files, poll_interval, tx));
    (rx, handle)
}

fn poll_progress(files: SharedFiles, poll_interval: Duration, tx: Sender<ProgressMessage>) {
    let mut last: Option<ProgressMessage> = None;

    loop {
        if let Some(message) = files.read_progress() {
            if last.as_ref() != Some(&message) {
                let done = message.done;
                if tx.send(message.clone()).is_err() {
                    return;
                }
                if done {
                    debug!("Poller observed terminal message");
                    return;
                }
                last = Some(message);
            }
        }
        thread::sleep(poll_interval);
    }
}

/// Run the helper until a terminal message is observed.
pub fn run_helper<V: HelperView>(
    files: SharedFiles,
    poll_interval: Duration,
    view: &mut V,
) -> HelperExit {
    let (rx, poller) = spawn_poller(files.clone(), poll_interval);
    let exit = drive_view(&files, &rx, poll_interval, view);

    view.dispose();
    drop(rx);
    if poller.join().is_err() {
        warn!("Progress poller panicked");
    }
    exit
}

fn drive_view<V: HelperView>(
    files: &SharedFiles,
    rx: &Receiver<ProgressMessage>,
    poll_interval: Duration,
    view: &mut V,
) -> HelperExit {
    let mut session = HelperSession::new();
    let mut pending: Option<Prompt> = None;

    loop {
        let received = if pending.is_some() {
            match rx.recv_timeout(poll_interval) {
                Ok(message) => Some(message),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return HelperExit::Disconnected,
            }
        } else {
            match rx.recv() {
                Ok(message) => Some(message),
                Err(_) => return HelperExit::Disconnected,
            }
        };

        if let Some(first) = received {
            // Last write wins: skip to the newest queued message.
            let message = rx.try_iter().last().unwrap_or(first);
            pending = None;

            match session.observe(&message) {
                Step::Stop => {
                    view.render(&message);
                    info!(phase = %message.phase, "Supervisor finished");
                    return HelperExit::Done;
                }
                Step::Render => view.render(&message),
                Step::Ask(prompt) => {
                    view.render(&message);
                    pending = Some(prompt);
                }
            }
        }

        if let Some(prompt) = pending.take() {
            match view.ask(&prompt) {
                Some(decision) => {
                    session.answered(&prompt);
                    info!(action = decision.as_str(), "Writing decision");
                    if let Err(e) = files.write_decision(&DecisionMessage::new(decision.as_str())) {
                        warn!(error = %e, "Failed to write decision");
                    }
                }
                None => {
                    debug!("Prompt dismissed without an answer, asking again");
                    pending = Some(prompt);
                }
            }
        }
    }
}

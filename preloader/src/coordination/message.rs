//! Messages exchanged through the shared files.
//!
//! The supervisor writes [`ProgressMessage`]s and the helper answers with
//! [`DecisionMessage`]s. Both are small JSON objects replaced in full on
//! every write.

use serde::{Deserialize, Serialize};

/// Which button pair the helper should show, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Progress only.
    #[default]
    None,
    /// Accept or exit before any download.
    Consent,
    /// Continue or exit after failures.
    Prompt,
}

/// Snapshot of the supervisor's state, last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressMessage {
    pub phase: String,
    pub progress: u8,
    pub message: String,
    /// Terminal. The helper stops polling once it has seen this.
    pub done: bool,
    pub mode: PromptMode,
}

impl Default for ProgressMessage {
    fn default() -> Self {
        Self {
            phase: String::new(),
            progress: 0,
            message: String::new(),
            done: false,
            mode: PromptMode::None,
        }
    }
}

impl ProgressMessage {
    /// A plain progress update. Progress is clamped to 100.
    pub fn new(phase: impl Into<String>, progress: u8, message: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            progress: progress.min(100),
            message: message.into(),
            done: false,
            mode: PromptMode::None,
        }
    }

    /// Mark this message terminal.
    pub fn finished(mut self) -> Self {
        self.done = true;
        self.mode = PromptMode::None;
        self
    }

    /// Ask the helper to show a button pair.
    pub fn with_mode(mut self, mode: PromptMode) -> Self {
        self.mode = mode;
        self
    }

    /// Consent request shown before any download.
    pub fn consent_request() -> Self {
        Self::new(
            "Consent Needed",
            0,
            "This modpack will download files required by the author. Do you consent?",
        )
        .with_mode(PromptMode::Consent)
    }

    /// Failure prompt shown after a run with failures.
    pub fn failure_prompt(failed: usize) -> Self {
        Self::new(
            "Failed",
            100,
            format!(
                "{} download(s) failed. Continue without them or exit?",
                failed
            ),
        )
        .with_mode(PromptMode::Prompt)
    }

    /// Terminal error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", 0, message).finished()
    }

    /// Progress clamped to the valid range, for values read from disk.
    pub fn percent(&self) -> u8 {
        self.progress.min(100)
    }

    /// Whether the helper should ask the user something.
    pub fn wants_decision(&self) -> bool {
        !self.done && self.mode != PromptMode::None
    }
}

/// Decision written by the helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMessage {
    pub action: String,
}

impl DecisionMessage {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }

    /// Parsed action, if it is one of the known ones.
    pub fn decision(&self) -> Option<Decision> {
        Decision::parse(&self.action)
    }
}

/// Known decision actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Continue,
    Exit,
}

impl Decision {
    /// Case-insensitive parse.
    pub fn parse(action: &str) -> Option<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "accept" => Some(Self::Accept),
            "continue" => Some(Self::Continue),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }

    /// Wire form of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Continue => "continue",
            Self::Exit => "exit",
        }
    }
}

/// Outcome of a decision point, independent of how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Accept / continue.
    #[default]
    Proceed,
    /// Stop the host.
    Exit,
}

/// A decision point of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    /// Consent before any download.
    Consent,
    /// Continue after some entries failed.
    ContinueAfterFailures { failed: usize },
}

impl Question {
    /// Progress message that presents this question to the helper.
    pub fn message(&self) -> ProgressMessage {
        match self {
            Self::Consent => ProgressMessage::consent_request(),
            Self::ContinueAfterFailures { failed } => ProgressMessage::failure_prompt(*failed),
        }
    }

    /// Line shown by the terminal prompt.
    pub fn terminal_text(&self) -> String {
        match self {
            Self::Consent => {
                "This modpack will download files required by the author. Download them?"
                    .to_string()
            }
            Self::ContinueAfterFailures { failed } => {
                format!("{} download(s) failed. Continue without them?", failed)
            }
        }
    }

    /// Interpret a helper action for this question.
    ///
    /// Consent proceeds only on an explicit accept. A failure prompt exits
    /// only on an explicit exit.
    pub fn interpret(&self, action: &str) -> Verdict {
        match (self, Decision::parse(action)) {
            (Self::Consent, Some(Decision::Accept)) => Verdict::Proceed,
            (Self::Consent, _) => Verdict::Exit,
            (Self::ContinueAfterFailures { .. }, Some(Decision::Exit)) => Verdict::Exit,
            (Self::ContinueAfterFailures { .. }, _) => Verdict::Proceed,
        }
    }

    /// Action the helper writes for each button.
    pub fn actions(&self) -> (Decision, Decision) {
        match self {
            Self::Consent => (Decision::Accept, Decision::Exit),
            Self::ContinueAfterFailures { .. } => (Decision::Continue, Decision::Exit),
        }
    }
}

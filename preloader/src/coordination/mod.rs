//! Supervisor/helper coordination over two shared files.
//!
//! The supervisor owns the progress file and the helper owns the decision
//! file. Neither side holds a connection to the other: both poll, every write
//! replaces a whole file, and the supervisor deletes the decision file at the
//! start of each phase that waits for one so a stale answer cannot leak into
//! the next question.
//!
//! In headless sessions the helper is never launched and questions are asked
//! on the terminal instead.

mod channel;
mod coordinator;
mod environment;
mod error;
pub mod helper_process;
mod message;
mod prompt;
mod wait;

pub use channel::{write_replace, SharedFiles, DECISION_FILE, PROGRESS_FILE};
pub use coordinator::{Coordinator, DecisionPolicy, FileCoordinator, TerminalCoordinator};
pub use environment::{detect_session, EnvironmentProbe, SessionKind, SERVER_MARKERS};
pub use error::{ProtocolError, ProtocolResult};
pub use helper_process::{HelperHandle, HelperLauncher, ProcessHelperLauncher};
pub use message::{Decision, DecisionMessage, ProgressMessage, PromptMode, Question, Verdict};
pub use prompt::TerminalPrompt;
pub use wait::{DecisionWait, WaitOutcome};

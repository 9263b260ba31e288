//! Run sequencing.
//!
//! The orchestrator decides whether a run is needed, walks the enabled
//! entries in configured order, reports progress through a single sink and
//! tallies outcomes into a [`RunResult`].
//!
//! ```text
//! Idle → Initializing → (ResolvingEntry → TransferringEntry)* → Finalizing → Complete
//!                                                                         ↘ Error
//! ```

mod marker;

pub use marker::{Marker, MARKER_FILE};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::config::{ControllerConfig, DownloadEntry};
use crate::coordination::ProgressMessage;
use crate::transfer::{EntryProcessor, TransferOutcome, TransferStage};

/// Progress at the first entry. Work before it is initialization.
pub const PROGRESS_START: u8 = 5;

/// Progress after the last entry. Work after it is finalization.
pub const PROGRESS_END: u8 = 95;

/// Run-level failures. These end the loop early.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("failed to write marker {}: {source}", path.display())]
    Marker {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Counts of entry outcomes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunResult {
    pub fn total(&self) -> usize {
        self.success + self.failed + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    fn record(&mut self, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Success => self.success += 1,
            TransferOutcome::Failed => self.failed += 1,
            TransferOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Initializing,
    ResolvingEntry,
    TransferringEntry,
    Finalizing,
    Complete,
    Error,
}

impl RunPhase {
    /// Phase name shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Initializing => "Initializing",
            Self::ResolvingEntry => "Resolving",
            Self::TransferringEntry => "Downloading",
            Self::Finalizing => "Finalizing",
            Self::Complete => "Complete",
            Self::Error => "Error",
        }
    }
}

/// One progress event of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: RunPhase,
    pub progress: u8,
    pub message: String,
}

impl From<&ProgressEvent> for ProgressMessage {
    fn from(event: &ProgressEvent) -> Self {
        ProgressMessage::new(event.phase.label(), event.progress, event.message.clone())
    }
}

/// State threaded through one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    phase: RunPhase,
    total: usize,
    index: usize,
    result: RunResult,
}

impl RunContext {
    pub fn new(total: usize) -> Self {
        Self {
            phase: RunPhase::Idle,
            total,
            index: 0,
            result: RunResult::default(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn result(&self) -> RunResult {
        self.result
    }

    /// Overall progress of the current entry, linear between the start and
    /// end offsets.
    pub fn progress(&self) -> u8 {
        if self.total == 0 {
            return PROGRESS_END;
        }
        let span = (PROGRESS_END - PROGRESS_START) as usize;
        let index = self.index.min(self.total);
        PROGRESS_START + (span * index / self.total) as u8
    }

    /// Event for the current phase and progress.
    pub fn event(&self, message: impl Into<String>) -> ProgressEvent {
        ProgressEvent {
            phase: self.phase,
            progress: self.progress(),
            message: message.into(),
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        self.phase = phase;
    }

    /// Fold the outcome of the current entry and move to the next one.
    pub fn complete_entry(&mut self, outcome: TransferOutcome) {
        self.result.record(outcome);
        self.index += 1;
    }
}

/// Which launches trigger a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    pub first_launch_only: bool,
    pub check_for_updates: bool,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            first_launch_only: true,
            check_for_updates: true,
        }
    }
}

/// Sequences entries through an [`EntryProcessor`].
pub struct Orchestrator<P: EntryProcessor> {
    processor: P,
    entries: Vec<DownloadEntry>,
    marker: Marker,
    policy: RunPolicy,
}

impl<P: EntryProcessor> Orchestrator<P> {
    pub fn new(processor: P, entries: Vec<DownloadEntry>, game_dir: &Path) -> Self {
        Self {
            processor,
            entries,
            marker: Marker::in_game_dir(game_dir),
            policy: RunPolicy::default(),
        }
    }

    /// Orchestrator for the entries and policy of a configuration.
    pub fn from_config(processor: P, config: &ControllerConfig, game_dir: &Path) -> Self {
        Self::new(processor, config.downloads.clone(), game_dir).with_policy(RunPolicy {
            first_launch_only: config.first_launch_only,
            check_for_updates: config.check_for_updates,
        })
    }

    pub fn with_policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    /// Whether this launch should run.
    pub fn should_run(&self) -> bool {
        if !self.marker.exists() {
            return true;
        }
        if self.policy.first_launch_only {
            return false;
        }
        self.policy.check_for_updates
    }

    /// Process every enabled entry in order.
    ///
    /// Entry failures are counted, not returned. The marker is written after
    /// the loop whatever the outcomes were.
    pub fn run(
        &self,
        sink: &mut dyn FnMut(&ProgressEvent),
    ) -> Result<RunResult, OrchestrationError> {
        let enabled: Vec<&DownloadEntry> = self.entries.iter().filter(|e| e.enabled).collect();
        let mut ctx = RunContext::new(enabled.len());

        ctx.enter(RunPhase::Initializing);
        info!(entries = enabled.len(), "Starting run");

        for entry in &enabled {
            let position = format!("[{}/{}] {}", ctx.index + 1, ctx.total, entry.name);
            ctx.enter(RunPhase::ResolvingEntry);
            sink(&ctx.event(&position));

            let outcome = {
                let ctx_ref = &mut ctx;
                let mut on_stage = |stage: TransferStage| {
                    ctx_ref.enter(match stage {
                        TransferStage::Resolving => RunPhase::ResolvingEntry,
                        TransferStage::Downloading => RunPhase::TransferringEntry,
                    });
                    sink(&ctx_ref.event(format!("{}: {}", stage.label(), entry.name)));
                };
                self.processor.process(entry, &mut on_stage)
            };

            ctx.complete_entry(outcome);
        }

        ctx.enter(RunPhase::Finalizing);
        sink(&ctx.event("Finishing up..."));

        if let Err(source) = self.marker.write() {
            ctx.enter(RunPhase::Error);
            let error = OrchestrationError::Marker {
                path: self.marker.path().to_path_buf(),
                source,
            };
            sink(&ctx.event(error.to_string()));
            return Err(error);
        }

        ctx.enter(RunPhase::Complete);
        let result = ctx.result();
        info!(
            success = result.success,
            failed = result.failed,
            skipped = result.skipped,
            "Run finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Processor returning scripted outcomes by entry name and recording calls.
    #[derive(Default)]
    pub struct ScriptedProcessor {
        outcomes: HashMap<String, TransferOutcome>,
        pub calls: RefCell<Vec<String>>,
    }

    impl ScriptedProcessor {
        fn with(mut self, name: &str, outcome: TransferOutcome) -> Self {
            self.outcomes.insert(name.to_string(), outcome);
            self
        }
    }

    impl EntryProcessor for ScriptedProcessor {
        fn process(
            &self,
            entry: &DownloadEntry,
            status: crate::transfer::StatusCallback<'_>,
        ) -> TransferOutcome {
            self.calls.borrow_mut().push(entry.name.clone());
            status(TransferStage::Resolving);
            status(TransferStage::Downloading);
            *self
                .outcomes
                .get(&entry.name)
                .unwrap_or(&TransferOutcome::Success)
        }
    }

    fn entry(name: &str) -> DownloadEntry {
        DownloadEntry::url(name, format!("https://x/{}", name), format!("mods/{}.jar", name))
    }

    #[test]
    fn test_should_run_policy() {
        let temp = TempDir::new().unwrap();
        let orch = |policy| {
            Orchestrator::new(ScriptedProcessor::default(), vec![], temp.path()).with_policy(policy)
        };
        let first_only = RunPolicy {
            first_launch_only: true,
            check_for_updates: true,
        };
        let updates = RunPolicy {
            first_launch_only: false,
            check_for_updates: true,
        };
        let neither = RunPolicy {
            first_launch_only: false,
            check_for_updates: false,
        };

        assert!(orch(first_only).should_run());

        Marker::in_game_dir(temp.path()).write().unwrap();
        assert!(!orch(first_only).should_run());
        assert!(orch(updates).should_run());
        assert!(!orch(neither).should_run());
    }

    #[test]
    fn test_empty_run_writes_marker() {
        let temp = TempDir::new().unwrap();
        let orch = Orchestrator::new(
            ScriptedProcessor::default(),
            vec![entry("off").with_enabled(false)],
            temp.path(),
        );

        let result = orch.run(&mut |_| {}).unwrap();

        assert_eq!(result, RunResult::default());
        assert!(orch.marker().exists());
        assert!(orch.processor.calls.borrow().is_empty());
    }

    #[test]
    fn test_order_preserved_and_disabled_skipped() {
        let temp = TempDir::new().unwrap();
        let processor = ScriptedProcessor::default()
            .with("b", TransferOutcome::Failed)
            .with("d", TransferOutcome::Skipped);
        let orch = Orchestrator::new(
            processor,
            vec![
                entry("a"),
                entry("b"),
                entry("c").with_enabled(false),
                entry("d"),
            ],
            temp.path(),
        );

        let result = orch.run(&mut |_| {}).unwrap();

        assert_eq!(*orch.processor.calls.borrow(), vec!["a", "b", "d"]);
        assert_eq!(
            result,
            RunResult {
                success: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert!(orch.marker().exists());
    }

    #[test]
    fn test_events_interpolate_progress() {
        let temp = TempDir::new().unwrap();
        let orch = Orchestrator::new(
            ScriptedProcessor::default(),
            vec![entry("a"), entry("b")],
            temp.path(),
        );
        let mut events = Vec::new();

        orch.run(&mut |e| events.push(e.clone())).unwrap();

        assert_eq!(events[0].phase, RunPhase::ResolvingEntry);
        assert_eq!(events[0].progress, PROGRESS_START);
        assert_eq!(events[0].message, "[1/2] a");
        assert_eq!(events[2].phase, RunPhase::TransferringEntry);
        assert_eq!(events[2].message, "Downloading: a");
        assert_eq!(events[3].progress, 50);
        assert_eq!(events[3].message, "[2/2] b");

        let last = events.last().unwrap();
        assert_eq!(last.phase, RunPhase::Finalizing);
        assert_eq!(last.progress, PROGRESS_END);
    }

    #[test]
    fn test_marker_failure_is_error_event() {
        let temp = TempDir::new().unwrap();
        // A file where the marker's parent directory should be.
        std::fs::write(temp.path().join("blocker"), "").unwrap();
        let orch = Orchestrator::new(ScriptedProcessor::default(), vec![entry("a")], temp.path())
            .with_marker(Marker::at(temp.path().join("blocker/preloader.marker")));
        let mut events = Vec::new();

        let result = orch.run(&mut |e| events.push(e.clone()));

        assert!(matches!(result, Err(OrchestrationError::Marker { .. })));
        assert_eq!(events.last().unwrap().phase, RunPhase::Error);
    }

    #[test]
    fn test_event_to_progress_message() {
        let event = ProgressEvent {
            phase: RunPhase::TransferringEntry,
            progress: 40,
            message: "Downloading: a".to_string(),
        };

        let msg = ProgressMessage::from(&event);

        assert_eq!(msg.phase, "Downloading");
        assert_eq!(msg.progress, 40);
        assert!(!msg.done);
    }
}

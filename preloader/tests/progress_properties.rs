//! Property tests for run progress and outcome counting.

use std::collections::HashMap;

use preloader::config::DownloadEntry;
use preloader::orchestrator::{Orchestrator, RunContext, PROGRESS_END, PROGRESS_START};
use preloader::transfer::{EntryProcessor, StatusCallback, TransferOutcome, TransferStage};
use proptest::prelude::*;
use tempfile::TempDir;

fn outcome_strategy() -> impl Strategy<Value = TransferOutcome> {
    prop_oneof![
        Just(TransferOutcome::Success),
        Just(TransferOutcome::Failed),
        Just(TransferOutcome::Skipped),
    ]
}

/// Processor answering by entry name.
struct OutcomeTable {
    outcomes: HashMap<String, TransferOutcome>,
}

impl EntryProcessor for OutcomeTable {
    fn process(&self, entry: &DownloadEntry, status: StatusCallback<'_>) -> TransferOutcome {
        status(TransferStage::Resolving);
        let outcome = self.outcomes[&entry.name];
        if outcome != TransferOutcome::Skipped {
            status(TransferStage::Downloading);
        }
        outcome
    }
}

proptest! {
    #[test]
    fn test_context_progress_is_monotonic_and_bounded(
        outcomes in prop::collection::vec(outcome_strategy(), 0..40)
    ) {
        let mut ctx = RunContext::new(outcomes.len());
        let mut last = ctx.progress();
        prop_assert!(last >= PROGRESS_START && last <= PROGRESS_END);

        for outcome in &outcomes {
            ctx.complete_entry(*outcome);
            let now = ctx.progress();
            prop_assert!(now >= last);
            prop_assert!(now <= PROGRESS_END);
            last = now;
        }

        let result = ctx.result();
        prop_assert_eq!(result.total(), outcomes.len());
        prop_assert_eq!(ctx.progress(), PROGRESS_END);
    }

    #[test]
    fn test_run_counts_partition_enabled_entries(
        plan in prop::collection::vec((outcome_strategy(), any::<bool>()), 0..20)
    ) {
        let temp = TempDir::new().unwrap();
        let mut outcomes = HashMap::new();
        let entries: Vec<DownloadEntry> = plan
            .iter()
            .enumerate()
            .map(|(i, (outcome, enabled))| {
                let name = format!("entry-{}", i);
                outcomes.insert(name.clone(), *outcome);
                DownloadEntry::url(name, format!("https://mods.test/{}.jar", i), format!("mods/{}.jar", i))
                    .with_enabled(*enabled)
            })
            .collect();
        let enabled = entries.iter().filter(|e| e.enabled).count();

        let processor = OutcomeTable { outcomes };
        let orchestrator = Orchestrator::new(processor, entries, temp.path());

        let mut progress = Vec::new();
        let result = orchestrator.run(&mut |event| progress.push(event.progress)).unwrap();

        let count = |wanted: TransferOutcome| {
            plan.iter().filter(|(o, enabled)| *enabled && *o == wanted).count()
        };
        prop_assert_eq!(result.success, count(TransferOutcome::Success));
        prop_assert_eq!(result.failed, count(TransferOutcome::Failed));
        prop_assert_eq!(result.skipped, count(TransferOutcome::Skipped));
        prop_assert_eq!(result.total(), enabled);

        prop_assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(progress.iter().all(|p| (PROGRESS_START..=PROGRESS_END).contains(p)));
        prop_assert_eq!(progress.last().copied(), Some(PROGRESS_END));
        prop_assert!(temp.path().join(preloader::orchestrator::MARKER_FILE).exists());
    }
}

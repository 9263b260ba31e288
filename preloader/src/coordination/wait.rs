//! Blocking decision waits.

use std::thread;
use std::time::{Duration, Instant};

use super::channel::SharedFiles;
use super::message::DecisionMessage;

/// How a decision wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A decision was read and consumed.
    Decided(DecisionMessage),
    /// The configured bound elapsed first.
    TimedOut,
    /// The decision source went away without answering.
    SourceGone,
}

/// Polls the decision file until a decision arrives.
#[derive(Debug, Clone, Copy)]
pub struct DecisionWait {
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl DecisionWait {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            timeout: None,
        }
    }

    /// Bound the wait.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Block until a decision is available, the bound elapses or `is_alive`
    /// reports the answering side gone.
    ///
    /// A decision written just before the answering side exited still wins.
    pub fn wait(&self, files: &SharedFiles, mut is_alive: impl FnMut() -> bool) -> WaitOutcome {
        let started = Instant::now();

        loop {
            if let Some(decision) = files.take_decision() {
                return WaitOutcome::Decided(decision);
            }

            if !is_alive() {
                return match files.take_decision() {
                    Some(decision) => WaitOutcome::Decided(decision),
                    None => WaitOutcome::SourceGone,
                };
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    return WaitOutcome::TimedOut;
                }
            }

            thread::sleep(self.poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_returns_existing_decision_immediately() {
        let temp = TempDir::new().unwrap();
        let files = SharedFiles::in_dir(temp.path());
        files.write_decision(&DecisionMessage::new("continue")).unwrap();

        let outcome = DecisionWait::new(Duration::from_millis(5)).wait(&files, || true);

        assert_eq!(outcome, WaitOutcome::Decided(DecisionMessage::new("continue")));
        assert!(files.read_decision().is_none());
    }

    #[test]
    fn test_times_out() {
        let temp = TempDir::new().unwrap();
        let files = SharedFiles::in_dir(temp.path());

        let started = Instant::now();
        let outcome = DecisionWait::new(Duration::from_millis(5))
            .with_timeout(Some(Duration::from_millis(50)))
            .wait(&files, || true);

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_source_gone() {
        let temp = TempDir::new().unwrap();
        let files = SharedFiles::in_dir(temp.path());

        let outcome = DecisionWait::new(Duration::from_millis(5)).wait(&files, || false);

        assert_eq!(outcome, WaitOutcome::SourceGone);
    }

    #[test]
    fn test_decision_from_other_thread() {
        let temp = TempDir::new().unwrap();
        let files = SharedFiles::in_dir(temp.path());
        let writer = files.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            writer.write_decision(&DecisionMessage::new("exit")).unwrap();
        });

        let outcome = DecisionWait::new(Duration::from_millis(5))
            .with_timeout(Some(Duration::from_secs(5)))
            .wait(&files, || true);
        handle.join().unwrap();

        assert_eq!(outcome, WaitOutcome::Decided(DecisionMessage::new("exit")));
    }
}

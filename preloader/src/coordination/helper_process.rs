//! Launching and supervising the helper process.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::channel::SharedFiles;
use super::error::{ProtocolError, ProtocolResult};

/// A running helper.
pub trait HelperHandle: Send {
    /// OS process id.
    fn id(&self) -> u32;

    /// Whether the helper is still running.
    fn is_alive(&mut self) -> bool;

    /// Give the helper up to `grace` to exit on its own, then kill it.
    fn finish(&mut self, grace: Duration);

    /// Kill the helper now.
    fn terminate(&mut self);
}

/// Starts helper processes.
pub trait HelperLauncher {
    fn launch(&self, files: &SharedFiles) -> ProtocolResult<Box<dyn HelperHandle>>;
}

/// Launches `<exe> helper <progress> <decision>` as a child process.
///
/// The child shares the terminal for its UI. Its stderr is forwarded into
/// this process's log.
#[derive(Debug, Clone)]
pub struct ProcessHelperLauncher {
    executable: PathBuf,
    working_dir: PathBuf,
}

impl ProcessHelperLauncher {
    pub fn new(executable: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Launcher for the currently running executable.
    pub fn current_exe(working_dir: &Path) -> ProtocolResult<Self> {
        let exe = std::env::current_exe().map_err(ProtocolError::HelperLaunch)?;
        Ok(Self::new(exe, working_dir))
    }
}

impl HelperLauncher for ProcessHelperLauncher {
    fn launch(&self, files: &SharedFiles) -> ProtocolResult<Box<dyn HelperHandle>> {
        let mut child = Command::new(&self.executable)
            .arg("helper")
            .arg(files.progress_path())
            .arg(files.decision_path())
            .current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ProtocolError::HelperLaunch)?;

        let log_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    debug!(target: "helper", "{}", line);
                }
            })
        });

        info!(pid = child.id(), "Helper launched");
        Ok(Box::new(ChildHelper { child, log_thread }))
    }
}

/// Helper backed by an OS child process.
pub struct ChildHelper {
    child: Child,
    log_thread: Option<JoinHandle<()>>,
}

impl ChildHelper {
    fn reap(&mut self) {
        if let Err(e) = self.child.wait() {
            warn!(pid = self.child.id(), error = %e, "Failed to reap helper");
        }
        if let Some(handle) = self.log_thread.take() {
            let _ = handle.join();
        }
    }
}

impl HelperHandle for ChildHelper {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn finish(&mut self, grace: Duration) {
        let deadline = Instant::now() + grace;
        while self.is_alive() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        if self.is_alive() {
            debug!(pid = self.id(), "Helper still running after grace period");
            self.terminate();
        } else {
            self.reap();
        }
    }

    fn terminate(&mut self) {
        if self.is_alive() {
            if let Err(e) = self.child.kill() {
                warn!(pid = self.id(), error = %e, "Failed to kill helper");
            }
        }
        self.reap();
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Shared view of a fake helper's state.
    #[derive(Clone, Default)]
    pub struct FakeHelperState {
        pub alive: Arc<AtomicBool>,
        pub launches: Arc<AtomicUsize>,
        pub terminated: Arc<AtomicBool>,
    }

    struct FakeHelper {
        state: FakeHelperState,
    }

    impl HelperHandle for FakeHelper {
        fn id(&self) -> u32 {
            4242
        }

        fn is_alive(&mut self) -> bool {
            self.state.alive.load(Ordering::SeqCst)
        }

        fn finish(&mut self, _grace: Duration) {
            self.state.alive.store(false, Ordering::SeqCst);
        }

        fn terminate(&mut self) {
            self.state.terminated.store(true, Ordering::SeqCst);
            self.state.alive.store(false, Ordering::SeqCst);
        }
    }

    /// Launcher that records launches instead of spawning processes.
    #[derive(Clone, Default)]
    pub struct RecordingLauncher {
        pub state: FakeHelperState,
        pub fail: bool,
    }

    impl RecordingLauncher {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn launches(&self) -> usize {
            self.state.launches.load(Ordering::SeqCst)
        }
    }

    impl HelperLauncher for RecordingLauncher {
        fn launch(&self, _files: &SharedFiles) -> ProtocolResult<Box<dyn HelperHandle>> {
            if self.fail {
                return Err(ProtocolError::HelperLaunch(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no helper binary",
                )));
            }
            self.state.launches.fetch_add(1, Ordering::SeqCst);
            self.state.alive.store(true, Ordering::SeqCst);
            Ok(Box::new(FakeHelper {
                state: self.state.clone(),
            }))
        }
    }

    #[test]
    fn test_missing_executable_fails_to_launch() {
        let temp = tempfile::TempDir::new().unwrap();
        let launcher =
            ProcessHelperLauncher::new(temp.path().join("no-such-binary"), temp.path());

        let result = launcher.launch(&SharedFiles::in_dir(temp.path()));

        assert!(matches!(result, Err(ProtocolError::HelperLaunch(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_child_helper_lifecycle() {
        let temp = tempfile::TempDir::new().unwrap();
        let launcher = ProcessHelperLauncher::new("/bin/sleep", temp.path());

        // `sleep helper <a> <b>` exits with an error right away.
        let mut handle = launcher.launch(&SharedFiles::in_dir(temp.path())).unwrap();
        handle.finish(Duration::from_secs(5));

        assert!(!handle.is_alive());
    }
}

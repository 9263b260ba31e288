//! Interactive vs headless session detection.
//!
//! All inputs are collected into an [`EnvironmentProbe`] first, then a single
//! pure function decides. Anything not clearly interactive is headless.

use std::path::Path;

/// Files whose presence in the game directory marks a dedicated server.
pub const SERVER_MARKERS: &[&str] = &["server.properties", "eula.txt"];

/// Facts about the environment the supervisor runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentProbe {
    /// `--headless` was given.
    pub force_headless: bool,
    /// `--interactive` was given.
    pub force_interactive: bool,
    /// A dedicated-server marker file exists.
    pub server_marker: bool,
    /// Standard input is a terminal.
    pub stdin_terminal: bool,
    /// Standard output is a terminal.
    pub stdout_terminal: bool,
}

impl EnvironmentProbe {
    /// Probe the filesystem for server markers. Terminal and flag fields are
    /// left for the caller.
    pub fn for_game_dir(game_dir: &Path) -> Self {
        Self {
            server_marker: SERVER_MARKERS.iter().any(|m| game_dir.join(m).exists()),
            ..Default::default()
        }
    }

    pub fn with_terminals(mut self, stdin: bool, stdout: bool) -> Self {
        self.stdin_terminal = stdin;
        self.stdout_terminal = stdout;
        self
    }

    pub fn with_overrides(mut self, headless: bool, interactive: bool) -> Self {
        self.force_headless = headless;
        self.force_interactive = interactive;
        self
    }
}

/// Kind of session the supervisor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// A user can see the helper and click its buttons.
    Interactive,
    /// Nobody is watching a window; use line prompts.
    Headless,
}

/// Decide the session kind.
///
/// Precedence: forced headless, forced interactive, server marker, then both
/// standard streams being terminals.
pub fn detect_session(probe: &EnvironmentProbe) -> SessionKind {
    if probe.force_headless {
        return SessionKind::Headless;
    }
    if probe.force_interactive {
        return SessionKind::Interactive;
    }
    if probe.server_marker {
        return SessionKind::Headless;
    }
    if probe.stdin_terminal && probe.stdout_terminal {
        return SessionKind::Interactive;
    }
    SessionKind::Headless
}

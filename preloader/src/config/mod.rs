//! Controller configuration.
//!
//! The configuration lives at `config/preloader.json` under the game
//! directory. Every field has a default so partial files load cleanly, and a
//! missing file is replaced by a default configuration containing disabled
//! example entries.

mod entry;

pub use entry::{DownloadEntry, EntrySource, ModrinthSource};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::coordination::{write_replace, Verdict};
use crate::transfer::HashMismatchPolicy;

/// Config file location relative to the game directory.
pub const CONFIG_FILE: &str = "config/preloader.json";

/// Default poll interval for both sides of the file protocol.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(serde_json::Error),
}

/// Path of the config file for a game directory.
pub fn config_file_path(game_dir: &Path) -> PathBuf {
    game_dir.join(CONFIG_FILE)
}

/// Full controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Ordered download list. Order is the only sequencing control.
    pub downloads: Vec<DownloadEntry>,

    /// Skip every launch after the first one.
    #[serde(rename = "download_on_first_launch_only")]
    pub first_launch_only: bool,

    /// Re-verify entries on later launches.
    pub check_for_updates: bool,

    /// Copy replaced files into a backup directory first.
    #[serde(rename = "backup_replaced_files")]
    pub backup_on_replace: bool,

    /// Ask for explicit consent before any transfer.
    #[serde(rename = "require_consent_before_downloads")]
    pub require_consent: bool,

    /// Optional Modrinth token; raises rate limits.
    pub modrinth_api_key: String,

    /// CurseForge API key.
    pub curseforge_api_key: String,

    /// What to do when a downloaded file does not match its expected digest.
    pub hash_mismatch: HashMismatchPolicy,

    /// Poll interval for the progress and decision files.
    pub poll_interval_ms: u64,

    /// Bound on decision waits. `None` waits until a decision arrives.
    pub decision_timeout_ms: Option<u64>,

    /// Decision applied when a bounded wait expires.
    pub timeout_decision: Verdict,

    /// HTTP timeout for API calls and downloads.
    pub http_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            downloads: Vec::new(),
            first_launch_only: true,
            check_for_updates: true,
            backup_on_replace: true,
            require_consent: false,
            modrinth_api_key: String::new(),
            curseforge_api_key: String::new(),
            hash_mismatch: HashMismatchPolicy::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            decision_timeout_ms: None,
            timeout_decision: Verdict::default(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl ControllerConfig {
    /// Default configuration with disabled example entries, written on first use.
    pub fn with_examples() -> Self {
        let downloads = vec![
            DownloadEntry::url(
                "Example Mod (URL)",
                "https://example.com/mod.jar",
                "mods/example-mod.jar",
            )
            .with_enabled(false),
            DownloadEntry::modrinth(
                "Example Mod (Modrinth)",
                "project-slug-or-id",
                "version-id",
                "mods/example-modrinth.jar",
            )
            .with_enabled(false),
            DownloadEntry::curseforge(
                "Example Mod (CurseForge)",
                "project-id",
                "file-id",
                "mods/example-curseforge.jar",
            )
            .with_enabled(false),
            DownloadEntry::url(
                "Server Config",
                "https://example.com/server-config.toml",
                "config/serverconfig.toml",
            )
            .with_replace_if_exists(true)
            .with_enabled(false),
        ];

        Self {
            downloads,
            ..Default::default()
        }
    }

    /// Load the configuration for a game directory.
    ///
    /// A missing file is created from [`ControllerConfig::with_examples`].
    pub fn load(game_dir: &Path) -> ConfigResult<Self> {
        let path = config_file_path(game_dir);

        if !path.exists() {
            info!(path = %path.display(), "Config not found, writing default");
            let config = Self::with_examples();
            config.save(game_dir)?;
            return Ok(config);
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;

        info!(entries = config.downloads.len(), "Config loaded");
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save(&self, game_dir: &Path) -> ConfigResult<()> {
        let path = config_file_path(game_dir);
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        write_replace(&path, json.as_bytes()).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Entries that take part in a run, in configured order.
    pub fn enabled_downloads(&self) -> impl Iterator<Item = &DownloadEntry> {
        self.downloads.iter().filter(|e| e.enabled)
    }

    /// Poll interval as a duration, never zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Decision wait bound, if any.
    pub fn decision_timeout(&self) -> Option<Duration> {
        self.decision_timeout_ms.map(Duration::from_millis)
    }

    /// HTTP timeout as a duration.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Append a download entry.
    pub fn with_download(mut self, entry: DownloadEntry) -> Self {
        self.downloads.push(entry);
        self
    }

    /// Set the first-launch-only policy.
    pub fn with_first_launch_only(mut self, value: bool) -> Self {
        self.first_launch_only = value;
        self
    }

    /// Set the update-check policy.
    pub fn with_check_for_updates(mut self, value: bool) -> Self {
        self.check_for_updates = value;
        self
    }

    /// Enable or disable backups of replaced files.
    pub fn with_backup_on_replace(mut self, value: bool) -> Self {
        self.backup_on_replace = value;
        self
    }

    /// Require consent before downloading.
    pub fn with_require_consent(mut self, value: bool) -> Self {
        self.require_consent = value;
        self
    }

    /// Set the hash mismatch policy.
    pub fn with_hash_mismatch(mut self, policy: HashMismatchPolicy) -> Self {
        self.hash_mismatch = policy;
        self
    }

    /// Set the poll interval in milliseconds.
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Bound decision waits.
    pub fn with_decision_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.decision_timeout_ms = ms;
        self
    }

    /// Set the decision applied when a bounded wait expires.
    pub fn with_timeout_decision(mut self, decision: Verdict) -> Self {
        self.timeout_decision = decision;
        self
    }
}

//! Download entry model.
//!
//! On disk an entry is a flat JSON object with a `source_type` discriminator
//! (`url`, `modrinth` or `curseforge`, defaulting to `url`). In memory the
//! source is a sum type so each kind carries exactly the fields it resolves
//! with. Conversion between the two validates the entry.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One configured artifact to fetch and install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct DownloadEntry {
    /// Display name, used only for progress and logging.
    pub name: String,
    /// Where the artifact comes from.
    pub source: EntrySource,
    /// Destination path relative to the game directory.
    pub destination: PathBuf,
    /// Free-form version label kept for the config author.
    pub version_tag: Option<String>,
    /// Replace the destination when it already exists.
    pub replace_if_exists: bool,
    /// Disabled entries are never resolved, transferred or counted.
    pub enabled: bool,
}

/// Source of a download entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// Direct URL with optional expected digests.
    Url {
        url: String,
        sha1: Option<String>,
        sha512: Option<String>,
    },
    /// Modrinth registry.
    Modrinth(ModrinthSource),
    /// CurseForge registry.
    CurseForge { project_id: String, file_id: String },
}

/// How a Modrinth entry identifies its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModrinthSource {
    /// A pinned version id.
    Version {
        project_id: Option<String>,
        version_id: String,
    },
    /// The newest version of a project for a game version and loader.
    Latest {
        project_id: String,
        game_version: String,
        loader: String,
    },
}

impl EntrySource {
    /// Short name of the source kind, as written in `source_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url { .. } => "url",
            Self::Modrinth(_) => "modrinth",
            Self::CurseForge { .. } => "curseforge",
        }
    }
}

impl DownloadEntry {
    /// Create an enabled direct-URL entry.
    pub fn url(
        name: impl Into<String>,
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            name,
            EntrySource::Url {
                url: url.into(),
                sha1: None,
                sha512: None,
            },
            destination,
        )
    }

    /// Create an enabled Modrinth entry pinned to a version.
    pub fn modrinth(
        name: impl Into<String>,
        project_id: impl Into<String>,
        version_id: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            name,
            EntrySource::Modrinth(ModrinthSource::Version {
                project_id: Some(project_id.into()),
                version_id: version_id.into(),
            }),
            destination,
        )
    }

    /// Create an enabled CurseForge entry.
    pub fn curseforge(
        name: impl Into<String>,
        project_id: impl Into<String>,
        file_id: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            name,
            EntrySource::CurseForge {
                project_id: project_id.into(),
                file_id: file_id.into(),
            },
            destination,
        )
    }

    fn new(name: impl Into<String>, source: EntrySource, destination: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source,
            destination: destination.into(),
            version_tag: None,
            replace_if_exists: false,
            enabled: true,
        }
    }

    /// Set the expected SHA-1 digest of a URL entry. No effect on other kinds.
    pub fn with_sha1(mut self, digest: impl Into<String>) -> Self {
        if let EntrySource::Url { sha1, .. } = &mut self.source {
            *sha1 = Some(digest.into());
        }
        self
    }

    /// Set the expected SHA-512 digest of a URL entry. No effect on other kinds.
    pub fn with_sha512(mut self, digest: impl Into<String>) -> Self {
        if let EntrySource::Url { sha512, .. } = &mut self.source {
            *sha512 = Some(digest.into());
        }
        self
    }

    /// Allow replacing an existing destination.
    pub fn with_replace_if_exists(mut self, replace: bool) -> Self {
        self.replace_if_exists = replace;
        self
    }

    /// Enable or disable the entry.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Flat on-disk representation of an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawEntry {
    #[serde(default)]
    name: String,
    #[serde(default = "default_source_type")]
    source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    game_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    loader: Option<String>,
    #[serde(default)]
    destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha512: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_tag: Option<String>,
    #[serde(default)]
    replace_if_exists: bool,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_source_type() -> String {
    "url".to_string()
}

fn default_enabled() -> bool {
    true
}

/// Treat empty and whitespace-only strings as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RawEntry> for DownloadEntry {
    type Error = String;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let name = if raw.name.trim().is_empty() {
            "unnamed".to_string()
        } else {
            raw.name
        };

        if raw.destination.trim().is_empty() {
            return Err(format!("entry '{}' has no destination", name));
        }

        let required = |field: Option<String>, key: &str| {
            present(field).ok_or_else(|| {
                format!(
                    "{} entry '{}' is missing '{}'",
                    raw.source_type, name, key
                )
            })
        };

        let source = match raw.source_type.to_lowercase().as_str() {
            "url" => EntrySource::Url {
                url: required(raw.url.clone(), "url")?,
                sha1: present(raw.sha1.clone()),
                sha512: present(raw.sha512.clone()),
            },
            "modrinth" => {
                let project_id = present(raw.project_id.clone());
                match present(raw.version_id.clone()) {
                    Some(version_id) => EntrySource::Modrinth(ModrinthSource::Version {
                        project_id,
                        version_id,
                    }),
                    None => EntrySource::Modrinth(ModrinthSource::Latest {
                        project_id: required(raw.project_id.clone(), "project_id")?,
                        game_version: required(raw.game_version.clone(), "version_id' or 'game_version")?,
                        loader: required(raw.loader.clone(), "loader")?,
                    }),
                }
            }
            "curseforge" => EntrySource::CurseForge {
                project_id: required(raw.project_id.clone(), "project_id")?,
                file_id: required(raw.file_id.clone(), "file_id")?,
            },
            other => return Err(format!("entry '{}' has unknown source_type '{}'", name, other)),
        };

        Ok(Self {
            name,
            source,
            destination: PathBuf::from(raw.destination),
            version_tag: present(raw.version_tag),
            replace_if_exists: raw.replace_if_exists,
            enabled: raw.enabled,
        })
    }
}

impl From<DownloadEntry> for RawEntry {
    fn from(entry: DownloadEntry) -> Self {
        let mut raw = RawEntry {
            name: entry.name,
            source_type: entry.source.kind().to_string(),
            destination: entry.destination.to_string_lossy().into_owned(),
            version_tag: entry.version_tag,
            replace_if_exists: entry.replace_if_exists,
            enabled: entry.enabled,
            ..Default::default()
        };

        match entry.source {
            EntrySource::Url { url, sha1, sha512 } => {
                raw.url = Some(url);
                raw.sha1 = sha1;
                raw.sha512 = sha512;
            }
            EntrySource::Modrinth(ModrinthSource::Version {
                project_id,
                version_id,
            }) => {
                raw.project_id = project_id;
                raw.version_id = Some(version_id);
            }
            EntrySource::Modrinth(ModrinthSource::Latest {
                project_id,
                game_version,
                loader,
            }) => {
                raw.project_id = Some(project_id);
                raw.game_version = Some(game_version);
                raw.loader = Some(loader);
            }
            EntrySource::CurseForge {
                project_id,
                file_id,
            } => {
                raw.project_id = Some(project_id);
                raw.file_id = Some(file_id);
            }
        }

        raw
    }
}

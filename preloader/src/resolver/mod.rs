//! Entry resolution.
//!
//! Turns a [`DownloadEntry`] into a [`ResolvedTransfer`]: the final download
//! URL plus whatever the source knows about the file (expected digest,
//! filename, size). Direct URLs resolve without network access; Modrinth and
//! CurseForge entries query their registry APIs.
//!
//! Resolution errors are entry-level. The transfer engine counts the entry as
//! failed and the run continues.

pub mod curseforge;
pub mod http;
pub mod modrinth;

pub use http::{HttpClient, ReqwestClient};

use thiserror::Error;

use crate::config::{ControllerConfig, DownloadEntry, EntrySource};
use crate::transfer::ExpectedHash;

/// Errors that can occur while resolving an entry.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    #[error("failed to create HTTP client: {0}")]
    ClientInit(String),

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{provider} rejected the request (HTTP {status}); {hint}")]
    Unauthorized {
        provider: &'static str,
        status: u16,
        hint: &'static str,
    },

    #[error("malformed {provider} response: {reason}")]
    Malformed {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} response is missing '{field}'")]
    MissingField {
        provider: &'static str,
        field: &'static str,
    },

    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}

/// A concrete transfer produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransfer {
    /// Final download URL.
    pub url: String,
    /// Digest the downloaded file should have, if the source publishes one.
    pub expected_hash: Option<ExpectedHash>,
    /// Filename reported by the registry.
    pub filename: Option<String>,
    /// Size in bytes reported by the registry.
    pub size: Option<u64>,
}

/// Resolves entries to transfers.
pub trait SourceResolver {
    fn resolve(&self, entry: &DownloadEntry) -> Result<ResolvedTransfer, ResolutionError>;
}

/// Resolver dispatching on the entry's source kind.
pub struct EntryResolver<C: HttpClient> {
    client: C,
    modrinth_base_url: String,
    curseforge_base_url: String,
    modrinth_api_key: String,
    curseforge_api_key: String,
}

impl<C: HttpClient> EntryResolver<C> {
    /// Create a resolver against the public registry APIs with no keys.
    pub fn new(client: C) -> Self {
        Self {
            client,
            modrinth_base_url: modrinth::DEFAULT_BASE_URL.to_string(),
            curseforge_base_url: curseforge::DEFAULT_BASE_URL.to_string(),
            modrinth_api_key: String::new(),
            curseforge_api_key: String::new(),
        }
    }

    /// Create a resolver using the API keys from a configuration.
    pub fn from_config(client: C, config: &ControllerConfig) -> Self {
        Self::new(client)
            .with_modrinth_api_key(config.modrinth_api_key.clone())
            .with_curseforge_api_key(config.curseforge_api_key.clone())
    }

    /// Set the Modrinth API key.
    pub fn with_modrinth_api_key(mut self, key: impl Into<String>) -> Self {
        self.modrinth_api_key = key.into();
        self
    }

    /// Set the CurseForge API key.
    pub fn with_curseforge_api_key(mut self, key: impl Into<String>) -> Self {
        self.curseforge_api_key = key.into();
        self
    }

    /// Override the Modrinth API base URL.
    pub fn with_modrinth_base_url(mut self, url: impl Into<String>) -> Self {
        self.modrinth_base_url = trim_base(url.into());
        self
    }

    /// Override the CurseForge API base URL.
    pub fn with_curseforge_base_url(mut self, url: impl Into<String>) -> Self {
        self.curseforge_base_url = trim_base(url.into());
        self
    }
}

impl<C: HttpClient> SourceResolver for EntryResolver<C> {
    fn resolve(&self, entry: &DownloadEntry) -> Result<ResolvedTransfer, ResolutionError> {
        match &entry.source {
            EntrySource::Url { url, sha1, sha512 } => resolve_url(url, sha1, sha512),
            EntrySource::Modrinth(source) => modrinth::resolve(
                &self.client,
                &self.modrinth_base_url,
                &self.modrinth_api_key,
                source,
            ),
            EntrySource::CurseForge {
                project_id,
                file_id,
            } => curseforge::resolve(
                &self.client,
                &self.curseforge_base_url,
                &self.curseforge_api_key,
                project_id,
                file_id,
            ),
        }
    }
}

/// Resolve a direct URL. SHA-1 is used when given, SHA-512 otherwise.
pub fn resolve_url(
    url: &str,
    sha1: &Option<String>,
    sha512: &Option<String>,
) -> Result<ResolvedTransfer, ResolutionError> {
    if url.trim().is_empty() {
        return Err(ResolutionError::InvalidEntry("empty URL".to_string()));
    }

    let expected_hash = match (sha1, sha512) {
        (Some(h), _) if !h.trim().is_empty() => Some(ExpectedHash::sha1(h.trim())),
        (_, Some(h)) if !h.trim().is_empty() => Some(ExpectedHash::sha512(h.trim())),
        _ => None,
    };

    let filename = url
        .split('?')
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    Ok(ResolvedTransfer {
        url: url.to_string(),
        expected_hash,
        filename,
        size: None,
    })
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Turn 401/403 into an authorization error carrying a hint.
pub(crate) fn map_status(
    error: ResolutionError,
    provider: &'static str,
    hint: &'static str,
) -> ResolutionError {
    match error {
        ResolutionError::Status { status, .. } if status == 401 || status == 403 => {
            ResolutionError::Unauthorized {
                provider,
                status,
                hint,
            }
        }
        other => other,
    }
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    body: &[u8],
) -> Result<T, ResolutionError> {
    serde_json::from_slice(body).map_err(|e| ResolutionError::Malformed {
        provider,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::http::tests::MockHttpClient;
    use crate::transfer::HashAlgorithm;

    #[test]
    fn test_url_entry_copied_verbatim_without_network() {
        let client = MockHttpClient::new();
        let resolver = EntryResolver::new(client);
        let entry = DownloadEntry::url("A", "https://example.com/files/a.jar?x=1", "mods/a.jar");

        let resolved = resolver.resolve(&entry).unwrap();

        assert_eq!(resolved.url, "https://example.com/files/a.jar?x=1");
        assert_eq!(resolved.filename.as_deref(), Some("a.jar"));
        assert_eq!(resolved.expected_hash, None);
        assert_eq!(resolver.client.request_count(), 0);
    }

    #[test]
    fn test_url_entry_prefers_sha1() {
        let entry = DownloadEntry::url("A", "https://x/a.jar", "a.jar")
            .with_sha512("long")
            .with_sha1("short");
        let resolver = EntryResolver::new(MockHttpClient::new());

        let hash = resolver.resolve(&entry).unwrap().expected_hash.unwrap();

        assert_eq!(hash.algorithm, HashAlgorithm::Sha1);
        assert_eq!(hash.hex, "short");
    }

    #[test]
    fn test_url_entry_falls_back_to_sha512() {
        let entry = DownloadEntry::url("A", "https://x/a.jar", "a.jar").with_sha512("long");
        let resolver = EntryResolver::new(MockHttpClient::new());

        let hash = resolver.resolve(&entry).unwrap().expected_hash.unwrap();

        assert_eq!(hash.algorithm, HashAlgorithm::Sha512);
    }

    #[test]
    fn test_dispatches_to_configured_bases() {
        let client = MockHttpClient::new()
            .with_json(
                "http://mr.local/version/v1",
                r#"{"files":[{"url":"https://cdn/m.jar","primary":true}]}"#,
            )
            .with_json(
                "http://cf.local/mods/1/files/2",
                r#"{"data":{"downloadUrl":"https://edge/c.jar"}}"#,
            );
        let resolver = EntryResolver::new(client)
            .with_modrinth_base_url("http://mr.local/")
            .with_curseforge_base_url("http://cf.local");

        let m = resolver
            .resolve(&DownloadEntry::modrinth("M", "p", "v1", "m.jar"))
            .unwrap();
        let c = resolver
            .resolve(&DownloadEntry::curseforge("C", "1", "2", "c.jar"))
            .unwrap();

        assert_eq!(m.url, "https://cdn/m.jar");
        assert_eq!(c.url, "https://edge/c.jar");
    }

    #[test]
    fn test_from_config_uses_keys() {
        let config = ControllerConfig {
            curseforge_api_key: "cf-key".to_string(),
            ..Default::default()
        };
        let client = MockHttpClient::new().with_status("https://api.curseforge.com/v1/mods/1/files/2", 403);
        let resolver = EntryResolver::from_config(client, &config);

        let result = resolver.resolve(&DownloadEntry::curseforge("C", "1", "2", "c.jar"));

        assert!(matches!(result, Err(ResolutionError::Unauthorized { status: 403, .. })));
        assert_eq!(
            resolver.client.last_request().unwrap().headers,
            vec![("x-api-key".to_string(), "cf-key".to_string())]
        );
    }

    #[test]
    fn test_other_statuses_pass_through() {
        let mapped = map_status(
            ResolutionError::Status {
                url: "u".to_string(),
                status: 500,
            },
            "Modrinth",
            "hint",
        );
        assert!(matches!(mapped, ResolutionError::Status { status: 500, .. }));
    }
}

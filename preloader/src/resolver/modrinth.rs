//! Modrinth registry lookups.
//!
//! A pinned entry fetches `/version/{id}`. An entry without a version id asks
//! `/project/{id}/version` filtered by game version and loader and takes the
//! newest result.

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use super::http::HttpClient;
use super::{map_status, parse_json, ResolutionError, ResolvedTransfer};
use crate::config::ModrinthSource;
use crate::transfer::ExpectedHash;

pub(crate) const PROVIDER: &str = "Modrinth";

/// Default Modrinth API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.modrinth.com/v2";

#[derive(Debug, Deserialize)]
struct Version {
    #[serde(default)]
    files: Vec<VersionFile>,
}

#[derive(Debug, Deserialize)]
struct VersionFile {
    url: Option<String>,
    filename: Option<String>,
    #[serde(default)]
    primary: bool,
    size: Option<u64>,
    #[serde(default)]
    hashes: FileHashes,
}

#[derive(Debug, Default, Deserialize)]
struct FileHashes {
    sha1: Option<String>,
    sha512: Option<String>,
}

/// Resolve a Modrinth source to a transfer.
pub(crate) fn resolve<C: HttpClient>(
    client: &C,
    base_url: &str,
    api_key: &str,
    source: &ModrinthSource,
) -> Result<ResolvedTransfer, ResolutionError> {
    let version = match source {
        ModrinthSource::Version { version_id, .. } => {
            let url = format!("{}/version/{}", base_url, version_id);
            fetch::<C, Version>(client, &url, api_key)?
        }
        ModrinthSource::Latest {
            project_id,
            game_version,
            loader,
        } => {
            let url = latest_versions_url(base_url, project_id, game_version, loader)?;
            let versions: Vec<Version> = fetch(client, url.as_str(), api_key)?;
            versions
                .into_iter()
                .next()
                .ok_or(ResolutionError::MissingField {
                    provider: PROVIDER,
                    field: "versions",
                })?
        }
    };

    select_file(version)
}

fn fetch<C: HttpClient, T: serde::de::DeserializeOwned>(
    client: &C,
    url: &str,
    api_key: &str,
) -> Result<T, ResolutionError> {
    debug!(url = %url, "Querying Modrinth");

    let headers: Vec<(&str, &str)> = if api_key.trim().is_empty() {
        Vec::new()
    } else {
        vec![("Authorization", api_key)]
    };

    let body = client
        .get(url, &headers)
        .map_err(|e| map_status(e, PROVIDER, "set modrinth_api_key in the config"))?;
    parse_json(PROVIDER, &body)
}

fn latest_versions_url(
    base_url: &str,
    project_id: &str,
    game_version: &str,
    loader: &str,
) -> Result<Url, ResolutionError> {
    let game_versions = format!("[\"{}\"]", game_version);
    let loaders = format!("[\"{}\"]", loader);
    Url::parse_with_params(
        &format!("{}/project/{}/version", base_url, project_id),
        &[
            ("game_versions", game_versions.as_str()),
            ("loaders", loaders.as_str()),
        ],
    )
    .map_err(|e| ResolutionError::InvalidEntry(format!("bad Modrinth project URL: {}", e)))
}

/// Pick the primary file, falling back to the first one.
fn select_file(version: Version) -> Result<ResolvedTransfer, ResolutionError> {
    let mut files = version.files;
    let index = files.iter().position(|f| f.primary).unwrap_or(0);
    if files.is_empty() {
        return Err(ResolutionError::MissingField {
            provider: PROVIDER,
            field: "files",
        });
    }
    let file = files.swap_remove(index);

    let url = file
        .url
        .filter(|u| !u.is_empty())
        .ok_or(ResolutionError::MissingField {
            provider: PROVIDER,
            field: "files[].url",
        })?;

    let expected_hash = match (file.hashes.sha512, file.hashes.sha1) {
        (Some(sha512), _) if !sha512.is_empty() => Some(ExpectedHash::sha512(sha512)),
        (_, Some(sha1)) if !sha1.is_empty() => Some(ExpectedHash::sha1(sha1)),
        _ => None,
    };

    Ok(ResolvedTransfer {
        url,
        expected_hash,
        filename: file.filename,
        size: file.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::http::tests::MockHttpClient;
    use crate::transfer::HashAlgorithm;

    const BASE: &str = "https://api.test/v2";

    fn pinned(version_id: &str) -> ModrinthSource {
        ModrinthSource::Version {
            project_id: Some("sodium".to_string()),
            version_id: version_id.to_string(),
        }
    }

    #[test]
    fn test_primary_file_with_sha512_preferred() {
        let client = MockHttpClient::new().with_json(
            "https://api.test/v2/version/abc",
            r#"{"files":[
                {"url":"https://cdn/extra.jar","filename":"extra.jar","primary":false,"hashes":{"sha1":"11"}},
                {"url":"https://cdn/main.jar","filename":"main.jar","primary":true,"size":42,
                 "hashes":{"sha1":"aa","sha512":"bb"}}
            ]}"#,
        );

        let resolved = resolve(&client, BASE, "", &pinned("abc")).unwrap();

        assert_eq!(resolved.url, "https://cdn/main.jar");
        assert_eq!(resolved.filename.as_deref(), Some("main.jar"));
        assert_eq!(resolved.size, Some(42));
        let hash = resolved.expected_hash.unwrap();
        assert_eq!(hash.algorithm, HashAlgorithm::Sha512);
        assert_eq!(hash.hex, "bb");
    }

    #[test]
    fn test_first_file_when_none_primary() {
        let client = MockHttpClient::new().with_json(
            "https://api.test/v2/version/abc",
            r#"{"files":[{"url":"https://cdn/a.jar","hashes":{"sha1":"aa"}},{"url":"https://cdn/b.jar"}]}"#,
        );

        let resolved = resolve(&client, BASE, "", &pinned("abc")).unwrap();

        assert_eq!(resolved.url, "https://cdn/a.jar");
        assert_eq!(resolved.expected_hash, Some(ExpectedHash::sha1("aa")));
    }

    #[test]
    fn test_empty_files_is_missing_field() {
        let client =
            MockHttpClient::new().with_json("https://api.test/v2/version/abc", r#"{"files":[]}"#);

        let result = resolve(&client, BASE, "", &pinned("abc"));

        assert!(matches!(
            result,
            Err(ResolutionError::MissingField { field: "files", .. })
        ));
    }

    #[test]
    fn test_key_sent_only_when_present() {
        let client = MockHttpClient::new().with_json(
            "https://api.test/v2/version/abc",
            r#"{"files":[{"url":"https://cdn/a.jar"}]}"#,
        );

        resolve(&client, BASE, "", &pinned("abc")).unwrap();
        assert!(client.last_request().unwrap().headers.is_empty());

        resolve(&client, BASE, "token", &pinned("abc")).unwrap();
        assert_eq!(
            client.last_request().unwrap().headers,
            vec![("Authorization".to_string(), "token".to_string())]
        );
    }

    #[test]
    fn test_latest_lookup_takes_first_version() {
        let url = latest_versions_url(BASE, "sodium", "1.21.1", "neoforge").unwrap();
        let client = MockHttpClient::new().with_json(
            url.as_str(),
            r#"[{"files":[{"url":"https://cdn/new.jar","primary":true}]},
                {"files":[{"url":"https://cdn/old.jar","primary":true}]}]"#,
        );
        let source = ModrinthSource::Latest {
            project_id: "sodium".to_string(),
            game_version: "1.21.1".to_string(),
            loader: "neoforge".to_string(),
        };

        let resolved = resolve(&client, BASE, "", &source).unwrap();

        assert_eq!(resolved.url, "https://cdn/new.jar");
        assert!(url.as_str().contains("game_versions="));
        assert!(url.as_str().contains("loaders="));
    }

    #[test]
    fn test_latest_lookup_without_versions() {
        let url = latest_versions_url(BASE, "sodium", "1.21.1", "neoforge").unwrap();
        let client = MockHttpClient::new().with_json(url.as_str(), "[]");
        let source = ModrinthSource::Latest {
            project_id: "sodium".to_string(),
            game_version: "1.21.1".to_string(),
            loader: "neoforge".to_string(),
        };

        let result = resolve(&client, BASE, "", &source);

        assert!(matches!(
            result,
            Err(ResolutionError::MissingField { field: "versions", .. })
        ));
    }

    #[test]
    fn test_malformed_response() {
        let client = MockHttpClient::new().with_json("https://api.test/v2/version/abc", "<html>");

        let result = resolve(&client, BASE, "", &pinned("abc"));

        assert!(matches!(result, Err(ResolutionError::Malformed { .. })));
    }
}

//! CurseForge registry lookups.

use serde::Deserialize;
use tracing::debug;

use super::http::HttpClient;
use super::{map_status, parse_json, ResolutionError, ResolvedTransfer};
use crate::transfer::ExpectedHash;

pub(crate) const PROVIDER: &str = "CurseForge";

/// Default CurseForge API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.curseforge.com/v1";

/// Hash algorithm code CurseForge uses for SHA-1. Other codes are ignored.
const ALGO_SHA1: u32 = 1;

#[derive(Debug, Deserialize)]
struct FileResponse {
    data: FileData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    download_url: Option<String>,
    file_name: Option<String>,
    file_length: Option<u64>,
    #[serde(default)]
    hashes: Vec<FileHash>,
}

#[derive(Debug, Deserialize)]
struct FileHash {
    value: String,
    algo: u32,
}

/// Resolve a CurseForge `(project, file)` pair to a transfer.
///
/// The key is sent as given, even when empty. A missing or wrong key only
/// surfaces when the API rejects the request.
pub(crate) fn resolve<C: HttpClient>(
    client: &C,
    base_url: &str,
    api_key: &str,
    project_id: &str,
    file_id: &str,
) -> Result<ResolvedTransfer, ResolutionError> {
    let url = format!("{}/mods/{}/files/{}", base_url, project_id, file_id);
    debug!(url = %url, "Querying CurseForge");

    let body = client
        .get(&url, &[("x-api-key", api_key)])
        .map_err(|e| map_status(e, PROVIDER, "set curseforge_api_key in the config"))?;
    let response: FileResponse = parse_json(PROVIDER, &body)?;
    let data = response.data;

    // Mods whose authors disabled third-party distribution have no URL.
    let url = data
        .download_url
        .filter(|u| !u.is_empty())
        .ok_or(ResolutionError::MissingField {
            provider: PROVIDER,
            field: "downloadUrl",
        })?;

    let expected_hash = data
        .hashes
        .into_iter()
        .find(|h| h.algo == ALGO_SHA1 && !h.value.is_empty())
        .map(|h| ExpectedHash::sha1(h.value));

    Ok(ResolvedTransfer {
        url,
        expected_hash,
        filename: data.file_name,
        size: data.file_length,
    })
}

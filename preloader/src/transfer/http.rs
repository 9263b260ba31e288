//! HTTP file downloader.
//!
//! Streams the response body into a temporary file next to the destination
//! and renames it into place once complete, so an interrupted transfer never
//! leaves a truncated file behind.

use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use tracing::debug;

use super::error::{TransferError, TransferResult};
use super::traits::Downloader;
use crate::config::DEFAULT_HTTP_TIMEOUT_SECS;

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// HTTP-based file downloader.
#[derive(Debug)]
pub struct HttpDownloader {
    client: Client,
    pub(crate) timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader with the default timeout.
    pub fn new() -> TransferResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Create a downloader with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> TransferResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| TransferError::ClientInit(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    fn send(&self, url: &str) -> TransferResult<reqwest::blocking::Response> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                TransferError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                TransferError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// Stream the response body into `staging`.
    fn stream_body(
        &self,
        url: &str,
        mut response: reqwest::blocking::Response,
        staging: &mut NamedTempFile,
    ) -> TransferResult<u64> {
        let staging_path = staging.path().to_path_buf();
        let mut writer = BufWriter::new(staging.as_file_mut());
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;

        loop {
            let bytes_read =
                response
                    .read(&mut buffer)
                    .map_err(|e| TransferError::DownloadFailed {
                        url: url.to_string(),
                        reason: format!("Read error: {}", e),
                    })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| TransferError::WriteFailed {
                    path: staging_path.clone(),
                    source: e,
                })?;

            downloaded += bytes_read as u64;
        }

        writer.flush().map_err(|e| TransferError::WriteFailed {
            path: staging_path,
            source: e,
        })?;

        Ok(downloaded)
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> TransferResult<u64> {
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| TransferError::CreateDirFailed {
            path: parent.clone(),
            source: e,
        })?;

        let response = self.send(url)?;

        let mut staging =
            NamedTempFile::new_in(&parent).map_err(|e| TransferError::WriteFailed {
                path: parent.clone(),
                source: e,
            })?;
        let downloaded = self.stream_body(url, response, &mut staging)?;

        staging
            .persist(dest)
            .map_err(|e| TransferError::WriteFailed {
                path: dest.to_path_buf(),
                source: e.error,
            })?;

        debug!(url = %url, bytes = downloaded, dest = %dest.display(), "Download complete");
        Ok(downloaded)
    }
}

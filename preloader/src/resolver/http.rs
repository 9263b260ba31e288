//! HTTP client abstraction for registry lookups.

use std::time::Duration;

use super::ResolutionError;

/// Trait for HTTP client operations.
///
/// This abstraction allows registry responses to be injected in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request with extra headers.
    ///
    /// Non-success statuses are reported as [`ResolutionError::Status`] so
    /// callers can tell authorization failures apart from transport errors.
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, ResolutionError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with a 30 second timeout.
    pub fn new() -> Result<Self, ResolutionError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ResolutionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| ResolutionError::ClientInit(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Request timeout, covering connect and body.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, ResolutionError> {
        let mut request = self.client.get(url).header("Accept", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().map_err(|e| ResolutionError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ResolutionError::Transport {
                url: url.to_string(),
                reason: format!("failed to read response: {}", e),
            })
    }
}

//! Retrieval of remote inventories.
//!
//! Fetching is a blocking call bounded by a caller-supplied timeout.  There
//! are no retries; a timeout is reported as [`FetchError::Timeout`].

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Timed out after {timeout:?} fetching {url}")]
    Timeout { url: String, timeout: Duration },
    #[error("HTTP status {status} fetching {url}")]
    Status { url: String, status: u16 },
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },
    #[error("URL fetching is not available in this build")]
    Unsupported,
}

/// Anything that can turn a URL into raw bytes.
pub trait UrlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F> UrlFetcher for F
where
    F: Fn(&str) -> Result<Vec<u8>, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self(url)
    }
}

/// Blocking HTTP(S) fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    pub timeout:    Duration,
    pub user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout:    DEFAULT_FETCH_TIMEOUT,
            user_agent: concat!("objinv/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpFetcher {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout, ..Self::default() }
    }
}

#[cfg(feature = "http")]
impl UrlFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let network = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout { url: url.to_string(), timeout: self.timeout }
            } else {
                FetchError::Network { url: url.to_string(), message: e.to_string() }
            }
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(network)?;

        tracing::debug!(%url, timeout = ?self.timeout, "fetching inventory");
        let resp = client.get(url).send().map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }
        let body = resp.bytes().map_err(network)?;
        Ok(body.to_vec())
    }
}

#[cfg(not(feature = "http"))]
impl UrlFetcher for HttpFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Unsupported)
    }
}

//! Single-URL fetching.
//!
//! [`Fetcher`] is the seam between the worker loop and the network. The
//! production [`HttpFetcher`] streams the response body straight into
//! `{download_dir}/{YYYYMMDD-HHMMSS}-{basename}`. There is no partial-write
//! protection: a transfer that fails mid-stream can leave a truncated file
//! behind, and the caller records only the error.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::config::DownloadConfig;
use crate::error::{Error, FetchError, Result};

/// Timestamp prefix format, second resolution (UTC)
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Abstraction over fetching one URL to local storage, enabling testability.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the local path it was written to
    async fn fetch(&self, url: &str) -> std::result::Result<PathBuf, FetchError>;
}

/// Production [`Fetcher`] backed by a reqwest client with a fixed timeout.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    download_dir: PathBuf,
    default_name: String,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from the download configuration
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            download_dir: config.download_dir.clone(),
            default_name: config.default_file_name.clone(),
            timeout: config.fetch_timeout,
        })
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<PathBuf, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status().to_string(),
            });
        }

        let path = self
            .download_dir
            .join(destination_name(url, &self.default_name, Utc::now()));
        let write_error = |e: std::io::Error| FetchError::Write {
            path: path.clone(),
            reason: e.to_string(),
        };

        let mut file = tokio::fs::File::create(&path).await.map_err(write_error)?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transport_error(url, e))?
        {
            file.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_error)?;

        tracing::debug!(url, path = %path.display(), bytes = written, "Fetched file");
        Ok(path)
    }
}

/// Local file name for `url` fetched at `now`.
///
/// Uses the final path segment of the URL, falling back to `default_name` when
/// that segment is empty or a bare separator. Two URLs with the same basename
/// fetched within the same second map to the same name, and the later write wins.
pub fn destination_name(url: &str, default_name: &str, now: DateTime<Utc>) -> String {
    let base = final_segment(url)
        .filter(|s| !s.is_empty() && s != "/" && s != ".")
        .unwrap_or_else(|| default_name.to_string());
    format!("{}-{}", now.format(TIMESTAMP_FORMAT), base)
}

fn final_segment(url: &str) -> Option<String> {
    match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        // Not an absolute URL: take whatever follows the last separator
        Err(_) => url.rsplit('/').next().map(str::to_string),
    }
}

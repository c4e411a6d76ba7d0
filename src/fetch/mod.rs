//! Reference dataset downloads.
//!
//! The dataset publisher serves every table as a file under one base URL and
//! throttles aggressive clients by answering with a small HTML page instead
//! of the table. Downloads are retried a bounded number of times; a throttle
//! page or HTTP 429 waits the rate-limit delay and counts as an attempt.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::DatasetConfig;

const HTML_MARKER: &[u8] = b"<!DOCTYPE html>";

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited fetching {target}")]
    RateLimited { target: String },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Failed to fetch {file} after {attempts} attempts: {last}")]
    RetriesExhausted {
        file: String,
        attempts: u32,
        last: Box<FetchError>,
    },

    #[error("No such file: {0}")]
    NotFound(String),
}

/// Something that can produce the raw bytes of a dataset file.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// Fetch one file by name, e.g. "Factions.csv".
    async fn fetch(&self, file: &str) -> Result<Vec<u8>, FetchError>;
}

/// Bounded retry with fixed back-off.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub rate_limit_delay: Duration,
    /// Bodies smaller than this that contain an HTML doctype are throttle pages
    pub min_file_size: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay: Duration::from_secs(3),
            rate_limit_delay: Duration::from_secs(5),
            min_file_size: 2048,
        }
    }
}

impl RetryPolicy {
    /// Run `attempt` until it yields a real body or retries run out.
    pub async fn run<F, Fut>(&self, file: &str, mut attempt: F) -> Result<Vec<u8>, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, FetchError>>,
    {
        let attempts = self.max_retries.max(1);
        let mut last = None;

        for n in 1..=attempts {
            let delay = match attempt().await {
                Ok(body) if looks_rate_limited(&body, self.min_file_size) => {
                    warn!(file, attempt = n, "Rate limit page received, backing off");
                    last = Some(FetchError::RateLimited {
                        target: file.to_string(),
                    });
                    self.rate_limit_delay
                }
                Ok(body) => {
                    debug!(file, bytes = body.len(), attempt = n, "Fetched");
                    return Ok(body);
                }
                Err(e @ FetchError::RateLimited { .. }) => {
                    warn!(file, attempt = n, "HTTP 429, backing off");
                    last = Some(e);
                    self.rate_limit_delay
                }
                Err(e @ FetchError::NotFound(_)) => return Err(e),
                Err(e) => {
                    warn!(file, attempt = n, error = %e, "Fetch attempt failed");
                    last = Some(e);
                    self.retry_delay
                }
            };
            if n < attempts && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Err(FetchError::RetriesExhausted {
            file: file.to_string(),
            attempts,
            last: Box::new(last.unwrap_or_else(|| FetchError::NotFound(file.to_string()))),
        })
    }
}

/// A small body carrying an HTML doctype is a throttle page, not a table.
pub fn looks_rate_limited(body: &[u8], min_file_size: usize) -> bool {
    body.len() < min_file_size && body.windows(HTML_MARKER.len()).any(|w| w == HTML_MARKER)
}

/// Configuration for the HTTP source.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl FetcherConfig {
    pub fn from_dataset(config: &DatasetConfig) -> Result<Self, FetchError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            timeout: config.timeout(),
            user_agent: format!("stratascribe/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                retry_delay: config.retry_delay(),
                rate_limit_delay: config.rate_limit_delay(),
                min_file_size: config.min_file_size,
            },
        })
    }
}

/// Dataset source backed by the publisher's HTTP server.
pub struct HttpSource {
    client: Client,
    config: FetcherConfig,
}

impl HttpSource {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("stratascribe")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    fn url_for(&self, file: &str) -> Result<Url, FetchError> {
        self.config
            .base_url
            .join(file)
            .map_err(|e| FetchError::InvalidUrl(format!("{file}: {e}")))
    }

    async fn fetch_once(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                target: url.to_string(),
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, file: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(file)?;
        info!("Fetching {}", url);
        self.config
            .retry
            .run(file, || self.fetch_once(&url))
            .await
    }
}

/// In-memory source for testing.
#[cfg(test)]
pub struct MockSource {
    files: std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
    requests: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockSource {
    pub fn new() -> Self {
        Self {
            files: std::sync::Mutex::new(std::collections::HashMap::new()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_file(self, name: &str, body: impl Into<Vec<u8>>) -> Self {
        self.set_file(name, body);
        self
    }

    pub fn set_file(&self, name: &str, body: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), body.into());
    }

    pub fn remove_file(&self, name: &str) {
        self.files.lock().unwrap().remove(name);
    }

    /// Files requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[cfg(test)]
#[async_trait]
impl DatasetSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self, file: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(file.to_string());
        self.files
            .lock()
            .unwrap()
            .get(file)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(file.to_string()))
    }
}

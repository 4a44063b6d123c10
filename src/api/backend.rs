use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::types::QueryResponse;

/// Errors that can occur while talking to the analysis backend.
///
/// The UI collapses all of these into one generic notice; the variants exist
/// so the log says what actually went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Client could not be built (bad TLS setup, invalid base URL).
    Config(String),
    /// Connection refused, DNS failure, reset mid-body.
    Network(String),
    /// The request exceeded the configured timeout.
    Timeout,
    /// Backend answered with a non-success status.
    Api { status: u16, message: String },
    /// Body was not the expected JSON shape.
    Parse(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "config error: {msg}"),
            BackendError::Network(msg) => write!(f, "network error: {msg}"),
            BackendError::Timeout => write!(f, "request timed out"),
            BackendError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            BackendError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::Parse(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Base address that relative asset paths are resolved against.
    fn base_url(&self) -> &str;

    /// Ask one question. Exactly one HTTP request per call.
    async fn query(&self, question: &str) -> Result<QueryResponse, BackendError>;

    /// Fetch raw bytes of an already-resolved asset URL (chart images).
    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, BackendError>;
}

/// Resolve a server-relative asset path against the backend base address.
///
/// Absolute `http(s)://` URLs pass through unchanged.
pub fn resolve_asset_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// reqwest-backed client for the analysis service.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("HTTP backend at {} (timeout {:?})", base_url, timeout);
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn query(&self, question: &str) -> Result<QueryResponse, BackendError> {
        info!("Query request: {} chars", question.len());

        let response = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[("question", question)])
            .send()
            .await?;

        debug!("Query response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Backend API error: {} - {}", status, err_body);
            return Err(BackendError::Api {
                status,
                message: err_body,
            });
        }

        let body = response.text().await?;
        let parsed: QueryResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))?;

        info!(
            "Query complete: table={}, {} result bytes, image={}, analysis={}",
            parsed.table_output_verified,
            parsed.execution_result.len(),
            parsed.image_url().is_some(),
            parsed.analysis().is_some()
        );
        Ok(parsed)
    }

    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        debug!("Fetching asset {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!("Asset fetch failed: {} - {}", status, url);
            return Err(BackendError::Api {
                status,
                message: format!("failed to fetch {url}"),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

//! Outbound HTTP used by agents that query third-party services
//!
//! Agents depend on the [`HttpClient`] trait rather than on reqwest directly,
//! so tests can point them at a mock server or a canned client.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Default timeout for outbound requests
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

/// Errors from outbound HTTP requests
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },

    #[error("Request to {url} returned status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Minimal GET-only client used by agents
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch `url` and return the body as text
    async fn get(&self, url: &Url) -> Result<String, HttpError>;
}

/// reqwest-backed [`HttpClient`]
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("switchboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &Url) -> Result<String, HttpError> {
        debug!(host = url.host_str().unwrap_or(""), path = url.path(), "HTTP GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| HttpError::RequestFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| HttpError::RequestFailed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

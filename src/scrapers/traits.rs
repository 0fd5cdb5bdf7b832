use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Why a single page could not be downloaded
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body read failure
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::HttpStatus { .. } => "http_status",
        }
    }
}

/// Source of listing page markup
/// The pipeline only talks to this, so tests can script page responses
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page and return its HTML body
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;

    /// Name of the fetcher, used in logs
    fn source_name(&self) -> &'static str;
}

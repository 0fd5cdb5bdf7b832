use crate::scrapers::traits::{FetchError, PageFetcher};
use crate::scrapers::types::ScraperConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Plain HTTP fetcher with a fixed pause before every request
pub struct HttpFetcher {
    client: Client,
    request_delay: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with custom settings
    pub fn with_config(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            request_delay: config.request_delay,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status: {}", url, status);
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("failed to read response body: {}", e),
        })?;

        debug!("Downloaded {} bytes of HTML", html.len());

        Ok(html)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

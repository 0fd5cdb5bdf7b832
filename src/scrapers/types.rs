use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Desktop browser User-Agent sent with every page request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upper bound on pages per category run
pub const MAX_PAGES: u32 = 200;

/// HTTP and pacing settings shared by every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Pause before each request, keeps the origin server load bounded
    pub request_delay: Duration,
    pub max_pages: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            request_delay: Duration::from_secs(1),
            max_pages: MAX_PAGES,
        }
    }
}

/// What one category run should scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Category label stamped on every row
    pub category: String,
    /// Listing URL without the page parameter
    pub base_url: String,
    pub page_count: u32,
    /// Normalize and deduplicate once all pages are in
    pub clean: bool,
}

impl ScrapeRequest {
    pub fn new(category: impl Into<String>, base_url: impl Into<String>, page_count: u32) -> Self {
        Self {
            category: category.into(),
            base_url: base_url.into(),
            page_count,
            clean: true,
        }
    }

    pub fn raw(mut self) -> Self {
        self.clean = false;
        self
    }
}

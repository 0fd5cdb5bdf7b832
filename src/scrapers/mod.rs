pub mod coinafrique;
pub mod fetcher;
pub mod traits;
pub mod types;

pub use coinafrique::ListingExtractor;
pub use fetcher::HttpFetcher;
pub use types::{ScrapeRequest, ScraperConfig};

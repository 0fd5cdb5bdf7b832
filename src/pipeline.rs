//! Page-by-page scrape of one category
//!
//! Fetches pages `1..=N` strictly in order, extracts the cards of each page,
//! and normalizes the whole batch once at the end. A failing page is logged
//! and recorded; it never stops the run.

use crate::models::Dataset;
use crate::normalize::normalize;
use crate::progress::{LogProgress, Progress};
use crate::scrapers::coinafrique::ListingExtractor;
use crate::scrapers::traits::{FetchError, PageFetcher};
use crate::scrapers::types::{ScrapeRequest, MAX_PAGES};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Conditions that stop a run before the first request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("page count {count} outside 1..={max}")]
    PageCountOutOfRange { count: u32, max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorKind {
    Network,
    HttpStatus,
}

impl fmt::Display for PageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageErrorKind::Network => "network",
            PageErrorKind::HttpStatus => "http status",
        };
        f.write_str(name)
    }
}

/// A recoverable failure tied to one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageError {
    pub page: u32,
    pub kind: PageErrorKind,
    pub message: String,
}

impl PageError {
    fn from_fetch(page: u32, err: &FetchError) -> Self {
        let kind = match err {
            FetchError::Network { .. } => PageErrorKind::Network,
            FetchError::HttpStatus { .. } => PageErrorKind::HttpStatus,
        };
        Self {
            page,
            kind,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} ({}): {}", self.page, self.kind, self.message)
    }
}

/// Everything a category run produced
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub category: String,
    pub dataset: Dataset,
    pub errors: Vec<PageError>,
    pub pages_attempted: u32,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// URL of page `page` under `base`: `{base}?page={page}`.
pub fn page_url(base: &Url, page: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("page", &page.to_string());
    url
}

fn parse_base_url(raw: &str) -> Result<Url, PipelineError> {
    let invalid = |reason: String| PipelineError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a hierarchical URL".to_string()));
    }
    Ok(url)
}

/// Drives fetcher and extractor across the pages of a category
pub struct Pipeline<F> {
    fetcher: F,
    extractor: ListingExtractor,
    max_pages: u32,
}

impl<F: PageFetcher> Pipeline<F> {
    pub fn new(fetcher: F, extractor: ListingExtractor) -> Self {
        Self {
            fetcher,
            extractor,
            max_pages: MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Scrape one category.
    ///
    /// Only an unusable base URL or page count is an error; page failures end
    /// up in [`ScrapeOutcome::errors`].
    pub async fn run(
        &self,
        request: &ScrapeRequest,
        progress: &mut dyn Progress,
        cancel: &CancellationToken,
    ) -> Result<ScrapeOutcome, PipelineError> {
        let base = parse_base_url(&request.base_url)?;
        if request.page_count == 0 || request.page_count > self.max_pages {
            return Err(PipelineError::PageCountOutOfRange {
                count: request.page_count,
                max: self.max_pages,
            });
        }

        let started_at = Utc::now();
        let total = request.page_count;
        let mut accumulator = Vec::new();
        let mut errors = Vec::new();
        let mut pages_attempted = 0;
        let mut cancelled = false;

        info!(
            "Starting {} scrape of '{}' ({} pages)",
            self.fetcher.source_name(),
            request.category,
            total
        );
        progress.begin(total);

        for page in 1..=total {
            if cancel.is_cancelled() {
                warn!("Scrape of '{}' cancelled before page {}", request.category, page);
                progress.log(&format!("cancelled before page {}", page));
                cancelled = true;
                break;
            }

            pages_attempted += 1;
            progress.log(&format!("Scraping page {}/{} - {}", page, total, request.category));
            let url = page_url(&base, page);

            match self.fetcher.fetch(&url).await {
                Ok(html) => {
                    let extraction = self.extractor.extract(&html, &request.category);
                    if !extraction.missing_fields.is_empty() {
                        debug!(
                            "page {}: {} fields fell back to placeholders",
                            page,
                            extraction.missing_fields.len()
                        );
                    }
                    info!("page {}: {} listings", page, extraction.listings.len());
                    accumulator.extend(extraction.listings);
                }
                Err(e) => {
                    warn!("Error while scraping page {} ({}): {}", page, e.kind(), e);
                    let error = PageError::from_fetch(page, &e);
                    progress.log(&error.to_string());
                    errors.push(error);
                }
            }

            progress.page_done(page, total);
        }

        progress.finish();

        let dataset = if request.clean && !accumulator.is_empty() {
            Dataset::Cleaned(normalize(&accumulator))
        } else {
            Dataset::Raw(accumulator)
        };

        info!(
            "Scraped {} rows for '{}' ({} errors)",
            dataset.len(),
            request.category,
            errors.len()
        );

        Ok(ScrapeOutcome {
            category: request.category.clone(),
            dataset,
            errors,
            pages_attempted,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Scrape several categories at once, one task per category.
/// Each task keeps its own sequential, throttled page loop.
/// Results come back in request order.
pub async fn run_categories<F>(
    pipeline: Arc<Pipeline<F>>,
    requests: Vec<ScrapeRequest>,
    cancel: CancellationToken,
) -> Vec<Result<ScrapeOutcome>>
where
    F: PageFetcher + 'static,
{
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let pipeline = Arc::clone(&pipeline);
            let cancel = cancel.clone();
            let category = request.category.clone();
            let handle = tokio::spawn(async move {
                let mut progress = LogProgress::new(request.category.clone());
                pipeline.run(&request, &mut progress, &cancel).await
            });
            (category, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (category, handle) in handles {
        let result = handle
            .await
            .with_context(|| format!("Scrape task for '{}' failed", category))
            .and_then(|run| run.with_context(|| format!("Cannot scrape '{}'", category)));
        results.push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BASE: &str = "https://sn.coinafrique.com/categorie/vetements-homme";

    fn card(description: &str, price: &str, location: &str) -> String {
        format!(
            r#"<div class="ad__card">
                <img class="ad__card-img" src="{description}.jpg">
                <p class="ad__card-description">{description}</p>
                <p class="ad__card-price">{price}</p>
                <p class="ad__card-location"><span>{location}</span></p>
            </div>"#
        )
    }

    fn page_html(cards: &[String]) -> String {
        format!("<html><body>{}</body></html>", cards.concat())
    }

    /// Serves canned responses keyed by page number
    #[derive(Default)]
    struct ScriptedFetcher {
        pages: HashMap<u32, Result<String, u16>>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn page(mut self, page: u32, html: String) -> Self {
            self.pages.insert(page, Ok(html));
            self
        }

        fn status(mut self, page: u32, status: u16) -> Self {
            self.pages.insert(page, Err(status));
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            let page: u32 = url
                .query_pairs()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0);
            match self.pages.get(&page) {
                Some(Ok(html)) => Ok(html.clone()),
                Some(Err(status)) => Err(FetchError::HttpStatus {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(FetchError::Network {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
            }
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        begun: Option<u32>,
        done: Vec<(u32, u32)>,
        finished: bool,
    }

    impl Progress for RecordingProgress {
        fn begin(&mut self, total: u32) {
            self.begun = Some(total);
        }

        fn page_done(&mut self, page: u32, total: u32) {
            self.done.push((page, total));
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    fn pipeline(fetcher: ScriptedFetcher) -> Pipeline<ScriptedFetcher> {
        Pipeline::new(fetcher, ListingExtractor::new().unwrap())
    }

    fn cleaned(outcome: &ScrapeOutcome) -> &[crate::models::NormalizedListing] {
        match &outcome.dataset {
            Dataset::Cleaned(rows) => rows,
            Dataset::Raw(_) => panic!("expected cleaned dataset"),
        }
    }

    #[test]
    fn page_url_appends_page_parameter() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(page_url(&base, 3).as_str(), format!("{BASE}?page=3"));
    }

    #[tokio::test]
    async fn failed_page_does_not_stop_later_pages() {
        let fetcher = ScriptedFetcher::default()
            .page(1, page_html(&[card("chemise", "1 000 CFA", "Dakar")]))
            .status(2, 404)
            .page(3, page_html(&[card("pantalon", "2 000 CFA", "Thiès")]));
        let pipeline = pipeline(fetcher);
        let request = ScrapeRequest::new("Vêtements Homme", BASE, 3);

        let outcome = pipeline
            .run(&request, &mut NullProgress, &CancellationToken::new())
            .await
            .unwrap();

        let rows = cleaned(&outcome);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description.as_deref(), Some("Chemise"));
        assert_eq!(rows[1].description.as_deref(), Some("Pantalon"));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].page, 2);
        assert_eq!(outcome.errors[0].kind, PageErrorKind::HttpStatus);
        assert!(outcome.errors[0].message.contains("404"));
        assert_eq!(outcome.pages_attempted, 3);
        assert_eq!(pipeline.fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn network_failure_is_recorded_and_skipped() {
        let fetcher = ScriptedFetcher::default()
            .page(2, page_html(&[card("robe", "3 000", "Dakar")]));
        let pipeline = pipeline(fetcher);
        let request = ScrapeRequest::new("Vêtements Enfants", BASE, 2);

        let outcome = pipeline
            .run(&request, &mut NullProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.errors[0].page, 1);
        assert_eq!(outcome.errors[0].kind, PageErrorKind::Network);
    }

    #[tokio::test]
    async fn pages_are_requested_in_order() {
        let fetcher = ScriptedFetcher::default()
            .page(1, page_html(&[]))
            .page(2, page_html(&[]))
            .page(3, page_html(&[]));
        let pipeline = pipeline(fetcher);
        let request = ScrapeRequest::new("Chaussures Homme", BASE, 3);
        let mut progress = RecordingProgress::default();

        pipeline
            .run(&request, &mut progress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            pipeline.fetcher.requested(),
            vec![
                format!("{BASE}?page=1"),
                format!("{BASE}?page=2"),
                format!("{BASE}?page=3"),
            ]
        );
        assert_eq!(progress.begun, Some(3));
        assert_eq!(progress.done, vec![(1, 3), (2, 3), (3, 3)]);
        assert!(progress.finished);
    }

    #[tokio::test]
    async fn duplicates_across_pages_collapse() {
        let same = card("basket nike", "25 000 CFA", "dakar");
        let fetcher = ScriptedFetcher::default()
            .page(1, page_html(&[same.clone()]))
            .page(2, page_html(&[same, card("sandale", "4 000 CFA", "mbour")]));
        let pipeline = pipeline(fetcher);
        let request = ScrapeRequest::new("Chaussures Homme", BASE, 2);

        let outcome = pipeline
            .run(&request, &mut NullProgress, &CancellationToken::new())
            .await
            .unwrap();

        let rows = cleaned(&outcome);
        assert_eq!(rows.len(), 2);
        let nike: Vec<_> = rows
            .iter()
            .filter(|r| r.description.as_deref() == Some("Basket Nike"))
            .collect();
        assert_eq!(nike.len(), 1);
        assert_eq!(nike[0].price_numeric, Some(25000));
    }

    #[tokio::test]
    async fn raw_mode_keeps_duplicates_and_text() {
        let same = card("basket nike", "25 000 CFA", "dakar");
        let fetcher = ScriptedFetcher::default().page(1, page_html(&[same.clone(), same]));
        let pipeline = pipeline(fetcher);
        let request = ScrapeRequest::new("Chaussures Homme", BASE, 1).raw();

        let outcome = pipeline
            .run(&request, &mut NullProgress, &CancellationToken::new())
            .await
            .unwrap();

        match outcome.dataset {
            Dataset::Raw(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].description.as_deref(), Some("basket nike"));
            }
            Dataset::Cleaned(_) => panic!("raw run must not normalize"),
        }
    }

    #[tokio::test]
    async fn nothing_collected_gives_empty_raw_dataset() {
        let fetcher = ScriptedFetcher::default().status(1, 500);
        let pipeline = pipeline(fetcher);
        let request = ScrapeRequest::new("Vêtements Homme", BASE, 1);

        let outcome = pipeline
            .run(&request, &mut NullProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.dataset.is_empty());
        assert!(!outcome.dataset.is_cleaned());
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn bare_cards_become_placeholder_rows() {
        let bare = r#"<div class="ad__card"></div>"#.to_string();
        let fetcher = ScriptedFetcher::default()
            .page(1, page_html(&[bare, card("chemise", "1 000", "Dakar")]));
        let pipeline = pipeline(fetcher);
        let request = ScrapeRequest::new("Vêtements Homme", BASE, 1).raw();

        let outcome = pipeline
            .run(&request, &mut NullProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.errors.is_empty());
        match outcome.dataset {
            Dataset::Raw(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].price_or_sentinel(), "Prix non spécifié");
                assert_eq!(rows[0].description, None);
            }
            Dataset::Cleaned(_) => panic!("raw run must not normalize"),
        }
    }

    #[tokio::test]
    async fn invalid_base_url_fails_before_fetching() {
        let pipeline = pipeline(ScriptedFetcher::default());

        for base in ["not a url", "mailto:ads@example.com", "ftp://example.com/ads"] {
            let request = ScrapeRequest::new("Vêtements Homme", base, 3);
            let err = pipeline
                .run(&request, &mut NullProgress, &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::InvalidBaseUrl { .. }), "{base}");
        }
        assert!(pipeline.fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn page_count_is_bounded() {
        let pipeline = pipeline(ScriptedFetcher::default());

        for count in [0, MAX_PAGES + 1] {
            let request = ScrapeRequest::new("Vêtements Homme", BASE, count);
            let err = pipeline
                .run(&request, &mut NullProgress, &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(
                err,
                PipelineError::PageCountOutOfRange { count, max: MAX_PAGES }
            );
        }
    }

    #[tokio::test]
    async fn cancelled_run_stops_between_pages() {
        let fetcher = ScriptedFetcher::default().page(1, page_html(&[card("a", "1", "b")]));
        let pipeline = pipeline(fetcher);
        let request = ScrapeRequest::new("Vêtements Homme", BASE, 5);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = pipeline
            .run(&request, &mut NullProgress, &cancel)
            .await
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.pages_attempted, 0);
        assert!(outcome.dataset.is_empty());
        assert!(pipeline.fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn categories_run_independently() {
        let fetcher = ScriptedFetcher::default()
            .page(1, page_html(&[card("chemise", "1 000", "Dakar")]));
        let pipeline = Arc::new(pipeline(fetcher));
        let requests = vec![
            ScrapeRequest::new("Vêtements Homme", BASE, 1),
            ScrapeRequest::new("Chaussures Homme", "bad url", 1),
            ScrapeRequest::new("Vêtements Enfants", BASE, 1),
        ];

        let results = run_categories(pipeline, requests, CancellationToken::new()).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().category, "Vêtements Homme");
        assert!(results[1].is_err());
        let third = results[2].as_ref().unwrap();
        assert_eq!(third.category, "Vêtements Enfants");
        match &third.dataset {
            Dataset::Cleaned(rows) => assert_eq!(rows[0].category, "Vêtements Enfants"),
            Dataset::Raw(_) => panic!("expected cleaned dataset"),
        }
    }
}

mod config;
mod models;
mod normalize;
mod pipeline;
mod progress;
mod scrapers;
mod stats;
mod store;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use config::{resolve_requests, slugify, Category};
use models::Dataset;
use pipeline::{run_categories, Pipeline, ScrapeOutcome};
use scrapers::{HttpFetcher, ListingExtractor, ScrapeRequest, ScraperConfig};
use stats::Summary;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Scrape CoinAfrique category pages into a cleaned CSV dataset
#[derive(Debug, Parser)]
#[command(name = "listing-scout", version)]
struct Args {
    /// Category name or slug; repeat for several, omit for all categories
    #[arg(short, long)]
    category: Vec<String>,

    /// Pages to scrape per category (1-200)
    #[arg(short, long, default_value_t = 3)]
    pages: u32,

    /// Keep the scraped text as-is: no normalization, no deduplication
    #[arg(long)]
    raw: bool,

    /// Scrape this listing URL instead of a catalog category (needs exactly one --category label)
    #[arg(long)]
    base_url: Option<String>,

    /// Pause before each request, in milliseconds
    #[arg(long, env = "LISTING_SCOUT_DELAY_MS", default_value_t = 1000)]
    delay_ms: u64,

    /// Request timeout, in seconds
    #[arg(long, env = "LISTING_SCOUT_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Directory for the CSV (and JSON) output
    #[arg(short, long, default_value = "data")]
    output_dir: PathBuf,

    /// Also write a JSON copy of each dataset
    #[arg(long)]
    json: bool,

    /// Summarize a previously saved CSV instead of scraping
    #[arg(long)]
    load: Option<PathBuf>,
}

impl Args {
    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            request_delay: Duration::from_millis(self.delay_ms),
            ..ScraperConfig::default()
        }
    }

    fn requests(&self) -> Result<Vec<ScrapeRequest>> {
        let clean = !self.raw;
        match &self.base_url {
            Some(url) => {
                let [label] = self.category.as_slice() else {
                    bail!("--base-url needs exactly one --category label");
                };
                let request = ScrapeRequest::new(label.as_str(), url.as_str(), self.pages);
                Ok(vec![if clean { request } else { request.raw() }])
            }
            None => resolve_requests(&self.category, self.pages, clean),
        }
    }
}

fn output_slug(category: &str) -> String {
    Category::find(category)
        .map(|c| c.slug.to_string())
        .unwrap_or_else(|| slugify(category))
}

fn print_summary(title: &str, dataset: &Dataset) {
    let summary = Summary::from_dataset(dataset);
    println!();
    println!("📈 {}", title);
    println!(
        "   Dimensions: {} lignes et {} colonnes",
        dataset.len(),
        dataset.column_count()
    );
    for line in summary.to_string().lines() {
        println!("   {}", line);
    }
}

fn load(args: &Args, path: &Path) -> Result<()> {
    let import = store::load_csv(path)?;
    for column in &import.schema_gaps {
        warn!("Column '{}' missing, filled with defaults", column);
    }

    let dataset = if args.raw || import.listings.is_empty() {
        Dataset::Raw(import.listings)
    } else {
        Dataset::Cleaned(normalize::normalize(&import.listings))
    };

    print_summary(&path.display().to_string(), &dataset);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if let Some(path) = &args.load {
        return load(&args, path);
    }

    info!("🛍️ Listing Scout - CoinAfrique Scraper");
    info!("=====================================");

    let requests = args.requests()?;
    let config = args.scraper_config();
    let fetcher = HttpFetcher::with_config(&config)?;
    let extractor = ListingExtractor::new()?;
    let pipeline = Arc::new(Pipeline::new(fetcher, extractor).with_max_pages(config.max_pages));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current page");
            on_signal.cancel();
        }
    });

    let results = run_categories(pipeline, requests, cancel).await;
    let failures = report(results, &args.output_dir, args.json, Utc::now()).await;

    if failures > 0 {
        bail!(
            "{} categor{} could not be scraped or saved",
            failures,
            if failures == 1 { "y" } else { "ies" }
        );
    }

    Ok(())
}

/// Write the CSV (and optionally JSON) for one outcome, returning the CSV path
async fn save_outcome(
    outcome: &ScrapeOutcome,
    output_dir: &Path,
    json: bool,
    at: DateTime<Utc>,
) -> Result<PathBuf> {
    let slug = output_slug(&outcome.category);
    let file_name = store::default_file_name(&slug, outcome.dataset.is_cleaned(), at);
    let csv_path = output_dir.join(&file_name);
    store::save_csv(&outcome.dataset, &csv_path).await?;

    if json {
        store::save_json(&outcome.dataset, &csv_path.with_extension("json")).await?;
    }

    Ok(csv_path)
}

/// Log, save and summarize every category result. Returns how many
/// categories failed to scrape or to save; one failure never stops the rest.
async fn report(
    results: Vec<Result<ScrapeOutcome>>,
    output_dir: &Path,
    json: bool,
    at: DateTime<Utc>,
) -> usize {
    let mut failures = 0;

    for result in results {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("🔴 {:#}", e);
                failures += 1;
                continue;
            }
        };

        for error in &outcome.errors {
            warn!("🔴 {}: {}", outcome.category, error);
        }

        if outcome.dataset.is_empty() {
            warn!("🟠 No data collected for {}", outcome.category);
            continue;
        }

        let verb = if outcome.dataset.is_cleaned() { "récupérés et nettoyés" } else { "récupérés" };
        info!("🟢 {} articles {} ({})", outcome.dataset.len(), verb, outcome.category);

        if let Err(e) = save_outcome(&outcome, output_dir, json, at).await {
            warn!("🔴 Could not save {}: {:#}", outcome.category, e);
            failures += 1;
        }

        print_summary(&outcome.category, &outcome.dataset);
        if outcome.cancelled {
            println!("   (interrompu après {} page(s))", outcome.pages_attempted);
        }
    }

    failures
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::extract::ListingExtractor;
use crate::fetch::Fetcher;
use crate::images::ImageFetcher;
use crate::models::{ImageOutcome, ListingRecord, ListingStub, RunSummary};
use crate::search::parse_search_results;
use crate::storage::Storage;

const LISTINGS_DIR: &str = "listings";
const DEBUG_DIR: &str = "debug";

/// Runs one search → listings → summary pass.
pub struct Scraper {
    fetcher: Arc<dyn Fetcher>,
    storage: Arc<dyn Storage>,
    extractor: ListingExtractor,
    config: ScraperConfig,
}

impl Scraper {
    pub fn new(fetcher: Arc<dyn Fetcher>, storage: Arc<dyn Storage>, config: ScraperConfig) -> Self {
        let images = ImageFetcher::new(fetcher.clone(), storage.clone());
        Self {
            fetcher,
            storage,
            extractor: ListingExtractor::new(images),
            config,
        }
    }

    fn listings_root(&self) -> PathBuf {
        self.config.output_dir.join(LISTINGS_DIR)
    }

    /// Fetch the search page and stub list. A failure here aborts the run.
    pub async fn search(&self, search_url: &str) -> Result<Vec<ListingStub>> {
        Url::parse(search_url)
            .map_err(|e| ScrapeError::Parse(format!("invalid search url {}: {}", search_url, e)))?;

        tracing::info!(search_url, "fetching search results");
        self.config.search_delay.pause().await;

        let html = self.fetcher.fetch_html(search_url).await?;

        let debug_dir = self.config.output_dir.join(DEBUG_DIR);
        self.storage.ensure_dir(&debug_dir).await?;
        self.storage
            .write_bytes(&debug_dir.join("search_page.html"), html.as_bytes())
            .await?;

        let stubs = parse_search_results(&html, search_url);
        tracing::info!("found {} listings", stubs.len());
        Ok(stubs)
    }

    /// Fetch, extract, and persist one listing.
    pub async fn scrape_listing(&self, stub: &ListingStub) -> Result<ListingRecord> {
        tracing::info!(post_id = %stub.post_id, title = %stub.title, "processing listing");

        let html = self.fetcher.fetch_html(&stub.url).await?;

        let listing_dir = self.listings_root().join(&stub.post_id);
        self.storage.ensure_dir(&listing_dir).await?;
        self.storage
            .write_bytes(&listing_dir.join("raw.html"), html.as_bytes())
            .await?;

        let record = self.extractor.extract(stub, &html, &listing_dir).await;

        self.storage
            .write_document(&listing_dir.join("metadata.json"), &serde_json::to_value(&record)?)
            .await?;

        log_images(&record);
        Ok(record)
    }

    /// Process up to `max_listings` listings sequentially and write the summary.
    pub async fn run(&self, search_url: &str, max_listings: usize) -> Result<RunSummary> {
        let stubs = self.search(search_url).await.map_err(|e| {
            tracing::error!(search_url, error = %e, "search fetch failed, aborting run");
            e
        })?;

        let total = stubs.len();
        let to_process = &stubs[..total.min(max_listings)];
        tracing::info!(
            "processing {} listings out of {} total results",
            to_process.len(),
            total
        );

        let mut listings = Vec::with_capacity(to_process.len());
        for (index, stub) in to_process.iter().enumerate() {
            match self.scrape_listing(stub).await {
                Ok(record) => listings.push(record),
                Err(e) => {
                    tracing::warn!(post_id = %stub.post_id, url = %stub.url, error = %e, "skipping listing")
                }
            }

            if index + 1 < to_process.len() {
                let waited = self.config.listing_delay.pause().await;
                if !waited.is_zero() {
                    tracing::info!("waited {:.1} seconds before next listing", waited.as_secs_f64());
                }
            }
        }

        let summary = RunSummary {
            search_url: search_url.to_string(),
            scraped_at: Utc::now(),
            total_listings: total,
            processed_listings: listings.len(),
            listings,
        };
        self.write_summary(&summary).await?;

        tracing::info!(
            "scraping completed, processed {} listings",
            summary.processed_listings
        );
        Ok(summary)
    }

    async fn write_summary(&self, summary: &RunSummary) -> Result<()> {
        let root = self.listings_root();
        self.storage.ensure_dir(&root).await?;
        self.storage
            .write_document(&summary_path(&root), &serde_json::to_value(summary)?)
            .await
    }
}

fn summary_path(listings_root: &Path) -> PathBuf {
    listings_root.join("summary.json")
}

fn log_images(record: &ListingRecord) {
    tracing::info!("downloaded {} images", record.images.len());
    for image in &record.images {
        match &image.outcome {
            ImageOutcome::Success { resolution, size_bytes } => tracing::info!(
                "  - {}: {}, {:.1}KB",
                image.filename,
                resolution.token(),
                *size_bytes as f64 / 1024.0
            ),
            ImageOutcome::Failure { .. } => {
                tracing::info!("  - {}: download failed", image.filename)
            }
        }
    }
}

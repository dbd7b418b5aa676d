use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScrapeError};
use crate::fetch::Fetcher;
use crate::models::{ImageOutcome, Resolution};
use crate::storage::Storage;

static RESOLUTION_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+x\d+c").unwrap());

/// Tiers attempted in order; the first success wins.
pub const RESOLUTION_TIERS: [Resolution; 2] = [Resolution::High, Resolution::Standard];

impl Resolution {
    pub fn token(self) -> &'static str {
        match self {
            Resolution::High => "1200x900c",
            Resolution::Standard => "600x450c",
        }
    }

    /// The reference with its first size token swapped for this tier's token.
    pub fn variant_of(self, reference: &str) -> String {
        RESOLUTION_TOKEN_RE
            .replace(reference, self.token())
            .into_owned()
    }
}

/// Downloads one image per call, falling back through [`RESOLUTION_TIERS`].
#[derive(Clone)]
pub struct ImageFetcher {
    fetcher: Arc<dyn Fetcher>,
    storage: Arc<dyn Storage>,
}

impl ImageFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher>, storage: Arc<dyn Storage>) -> Self {
        Self { fetcher, storage }
    }

    pub async fn fetch(&self, reference: &str, dest: &Path) -> ImageOutcome {
        let mut last_error = None;

        for tier in RESOLUTION_TIERS {
            let variant = tier.variant_of(reference);
            match self.acquire(&variant, dest).await {
                Ok(size_bytes) => {
                    return ImageOutcome::Success {
                        resolution: tier,
                        size_bytes,
                    }
                }
                Err(e) => {
                    tracing::debug!(url = %variant, ?tier, error = %e, "image tier failed");
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no resolution tier attempted".to_string());
        let failure = ScrapeError::ImageAcquisition(message);
        tracing::warn!(reference, "{}", failure);
        ImageOutcome::Failure {
            message: failure.to_string(),
        }
    }

    async fn acquire(&self, url: &str, dest: &Path) -> Result<u64> {
        let bytes = self.fetcher.fetch_bytes(url).await?;
        self.storage.write_bytes(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}

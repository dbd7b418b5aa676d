use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

use crate::error::{Result, ScrapeError};

pub const DEFAULT_PROXY_ENDPOINT: &str = "https://api.scrapfly.io/scrape";

/// Inclusive bounds of a randomized pause, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange { min_ms: 0, max_ms: 0 };

    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self> {
        if min_ms > max_ms {
            return Err(ScrapeError::Config(format!(
                "delay minimum {}ms exceeds maximum {}ms",
                min_ms, max_ms
            )));
        }
        Ok(Self { min_ms, max_ms })
    }

    pub fn sample(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Sleeps for a random duration within the range, returning what was slept.
    pub async fn pause(&self) -> Duration {
        let wait = self.sample();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        wait
    }
}

/// Rendering scrape proxy used for page fetches.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub endpoint: String,
    pub api_key: String,
    pub render_js: bool,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub output_dir: PathBuf,
    pub listing_delay: DelayRange,
    pub search_delay: DelayRange,
    pub timeout: Duration,
    pub insecure_ssl: bool,
    pub proxy: Option<ProxyConfig>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            listing_delay: DelayRange { min_ms: 3000, max_ms: 7000 },
            search_delay: DelayRange { min_ms: 2000, max_ms: 4000 },
            timeout: Duration::from_secs(60),
            insecure_ssl: false,
            proxy: None,
        }
    }
}

impl ScraperConfig {
    /// Configuration with no pauses, for deterministic runs.
    pub fn immediate(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            listing_delay: DelayRange::ZERO,
            search_delay: DelayRange::ZERO,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let listing_delay = DelayRange::new(
            parse_var("HARVESTER_MIN_DELAY_MS", defaults.listing_delay.min_ms)?,
            parse_var("HARVESTER_MAX_DELAY_MS", defaults.listing_delay.max_ms)?,
        )?;
        let search_delay = DelayRange::new(
            parse_var("HARVESTER_SEARCH_MIN_DELAY_MS", defaults.search_delay.min_ms)?,
            parse_var("HARVESTER_SEARCH_MAX_DELAY_MS", defaults.search_delay.max_ms)?,
        )?;

        let proxy = env::var("SCRAPFLY_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(|api_key| -> Result<ProxyConfig> {
                Ok(ProxyConfig {
                    endpoint: env::var("HARVESTER_PROXY_URL")
                        .unwrap_or_else(|_| DEFAULT_PROXY_ENDPOINT.to_string()),
                    api_key,
                    render_js: parse_var("HARVESTER_RENDER_JS", true)?,
                })
            })
            .transpose()?;

        Ok(Self {
            output_dir: env::var("HARVESTER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            listing_delay,
            search_delay,
            timeout: Duration::from_secs(parse_var(
                "HARVESTER_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            insecure_ssl: env::var("HARVESTER_INSECURE_SSL").as_deref() == Ok("1"),
            proxy,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ScrapeError::Config(format!("{} must be a valid value, got {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

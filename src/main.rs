use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use listing_harvester::{FsStorage, HttpFetcher, ScraperConfig, Scraper};

const DEFAULT_SEARCH_URL: &str = "https://sfbay.craigslist.org/search/sfc/apa";

#[derive(Parser)]
#[command(name = "listing-harvester")]
#[command(about = "Scrape a classifieds search page and its listings")]
#[command(version)]
struct Cli {
    /// Search results page to start from
    #[arg(default_value = DEFAULT_SEARCH_URL)]
    search_url: String,

    /// Maximum number of listings to process
    #[arg(short, long, default_value_t = 10)]
    max_listings: usize,

    /// Output directory (overrides HARVESTER_OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match ScraperConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let fetcher = match HttpFetcher::new(config.timeout, config.insecure_ssl, config.proxy.clone()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("starting multi-listing scraper");
    let scraper = Scraper::new(Arc::new(fetcher), Arc::new(FsStorage), config);

    match scraper.run(&cli.search_url, cli.max_listings).await {
        Ok(summary) => {
            tracing::info!("successfully processed {} listings", summary.processed_listings);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("error running scraper: {}", e);
            tracing::info!("successfully processed 0 listings");
            ExitCode::FAILURE
        }
    }
}

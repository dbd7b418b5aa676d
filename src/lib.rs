pub mod config;
mod dom;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod images;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod storage;

pub use config::{DelayRange, ScraperConfig};
pub use error::ScrapeError;
pub use fetch::{Fetcher, HttpFetcher};
pub use pipeline::Scraper;
pub use storage::{FsStorage, Storage};

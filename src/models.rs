use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a search-results page, before the listing page is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingStub {
    pub post_id: String,
    pub url: String,
    pub title: String,
    pub price: String,
    pub location: String,
    /// Hover text of the search entry, empty when absent.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geocode {
    pub latitude: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    High,
    Standard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImageOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        resolution: Resolution,
        size_bytes: u64,
    },
    Failure {
        message: String,
    },
}

impl ImageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImageOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub original_url: String,
    pub filename: String,
    pub local_path: String,
    pub outcome: ImageOutcome,
}

/// Fully extracted listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub post_id: String,
    pub url: String,
    pub title: String,
    pub price: String,
    pub location: String,
    /// The search entry's hover text, carried over from the stub.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snippet: String,
    pub description: String,
    pub attributes: BTreeMap<String, String>,
    pub geocode: Option<Geocode>,
    pub images: Vec<ImageResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub search_url: String,
    pub scraped_at: DateTime<Utc>,
    pub total_listings: usize,
    pub processed_listings: usize,
    pub listings: Vec<ListingRecord>,
}

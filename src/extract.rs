use std::collections::BTreeMap;
use std::path::Path;

use futures::future::join_all;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::dom::{collect_text, select_attr};
use crate::images::ImageFetcher;
use crate::models::{Geocode, ImageResult, ListingRecord, ListingStub};

// ── Constants ────────────────────────────────────────────────────────────────

const BOILERPLATE_MARKER: &str = "QR Code Link to This Post\n";
const SYNTHETIC_KEY_PREFIX: &str = "attribute";

// ── Lazy static selectors ────────────────────────────────────────────────────

static BODY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("#postingbody").unwrap());
static ATTR_GROUP_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".attrgroup").unwrap());
static ATTR_SPAN_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());
static LATITUDE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("[data-latitude]").unwrap());
static LONGITUDE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-longitude]").unwrap());
static MAP_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("#map").unwrap());
static GALLERY_IMG_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".gallery img[src]").unwrap());

// ── Parsed page ──────────────────────────────────────────────────────────────

/// Everything a listing page yields before any image is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub description: String,
    pub attributes: BTreeMap<String, String>,
    pub geocode: Option<Geocode>,
    pub image_refs: Vec<String>,
}

pub fn parse_listing_page(html: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    ListingPage {
        description: extract_description(&document),
        attributes: extract_attributes(&document),
        geocode: extract_geocode(root),
        image_refs: extract_image_refs(&document),
    }
}

fn extract_description(document: &Html) -> String {
    document
        .select(&BODY_SEL)
        .next()
        .map(|body| {
            collect_text(body)
                .trim()
                .replacen(BOILERPLATE_MARKER, "", 1)
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

fn extract_attributes(document: &Html) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for group in document.select(&ATTR_GROUP_SEL) {
        for (position, span) in group.select(&ATTR_SPAN_SEL).enumerate() {
            if let Some((key, value)) = parse_attribute(&collect_text(span), position) {
                // Later groups overwrite earlier keys.
                attributes.insert(key, value);
            }
        }
    }
    attributes
}

/// `"key: value"` splits at the first colon; unlabeled text gets a positional key.
pub fn parse_attribute(text: &str, position: usize) -> Option<(String, String)> {
    let text = text.trim();
    if let Some((key, value)) = text.split_once(':') {
        return Some((key.trim().to_string(), value.trim().to_string()));
    }
    if text.is_empty() {
        return None;
    }
    Some((format!("{}{}", SYNTHETIC_KEY_PREFIX, position), text.to_string()))
}

fn extract_geocode(root: scraper::ElementRef<'_>) -> Option<Geocode> {
    let latitude = select_attr(root, &LATITUDE_SEL, "data-latitude")?;
    Some(Geocode {
        latitude: latitude.to_string(),
        longitude: select_attr(root, &LONGITUDE_SEL, "data-longitude").map(str::to_string),
        address: select_attr(root, &MAP_SEL, "data-address").map(str::to_string),
    })
}

fn extract_image_refs(document: &Html) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for img in document.select(&GALLERY_IMG_SEL) {
        let src = img.value().attr("src").unwrap_or("").trim();
        if src.is_empty() || refs.iter().any(|r| r == src) {
            continue;
        }
        refs.push(src.to_string());
    }
    refs
}

pub fn image_filename(index: usize) -> String {
    format!("image_{}.jpg", index + 1)
}

// ── Extractor ────────────────────────────────────────────────────────────────

pub struct ListingExtractor {
    images: ImageFetcher,
}

impl ListingExtractor {
    pub fn new(images: ImageFetcher) -> Self {
        Self { images }
    }

    /// Build the full record for one listing, downloading its images into
    /// `listing_dir` concurrently.
    pub async fn extract(&self, stub: &ListingStub, html: &str, listing_dir: &Path) -> ListingRecord {
        let page = parse_listing_page(html);

        let downloads = page.image_refs.iter().enumerate().map(|(index, reference)| {
            let filename = image_filename(index);
            let local_path = listing_dir.join(&filename);
            async move {
                let outcome = self.images.fetch(reference, &local_path).await;
                ImageResult {
                    original_url: reference.clone(),
                    filename,
                    local_path: local_path.to_string_lossy().into_owned(),
                    outcome,
                }
            }
        });
        let images = join_all(downloads).await;

        ListingRecord {
            post_id: stub.post_id.clone(),
            url: stub.url.clone(),
            title: stub.title.clone(),
            price: stub.price.clone(),
            location: stub.location.clone(),
            snippet: stub.description.clone(),
            description: page.description,
            attributes: page.attributes,
            geocode: page.geocode,
            images,
        }
    }
}

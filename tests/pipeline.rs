use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use listing_harvester::error::Result;
use listing_harvester::models::{ImageOutcome, Resolution};
use listing_harvester::{Fetcher, FsStorage, ScrapeError, Scraper, ScraperConfig, Storage};

const SEARCH_URL: &str = "https://sfbay.craigslist.org/search/sfc/apa";

#[derive(Default)]
struct FakeFetcher {
    pages: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
    page_calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.images.insert(url.to_string(), bytes.to_vec());
        self
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.page_calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Fetch(format!("no page for {}", url)))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Fetch(format!("no image for {}", url)))
    }
}

#[derive(Default)]
struct MemoryStorage {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    documents: Mutex<HashMap<PathBuf, Value>>,
}

impl MemoryStorage {
    fn document(&self, path: &Path) -> Option<Value> {
        self.documents.lock().unwrap().get(path).cloned()
    }

    fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ensure_dir(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.files.lock().unwrap().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    async fn write_document(&self, path: &Path, document: &Value) -> Result<()> {
        self.documents
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), document.clone());
        Ok(())
    }
}

fn listing_url(id: u64) -> String {
    format!("https://sfbay.craigslist.org/sfc/apa/d/flat/{}.html", id)
}

fn search_page(ids: &[u64]) -> String {
    let entries: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li class="cl-static-search-result" title="listing {id}">
                     <a href="{url}"><div class="title">Flat {id}</div>
                     <div class="price">$2,{id}</div><div class="location">Mission</div></a>
                   </li>"#,
                id = id,
                url = listing_url(*id)
            )
        })
        .collect();
    format!("<html><body><ol>{}</ol></body></html>", entries)
}

fn listing_page(id: u64) -> String {
    format!(
        r#"<html><body>
             <div class="gallery">
               <img src="https://images.craigslist.org/{id}_a_50x50c.jpg">
               <img src="https://images.craigslist.org/{id}_b_50x50c.jpg">
             </div>
             <div id="map" data-latitude="37.76" data-longitude="-122.42"></div>
             <section id="postingbody">Flat number {id}</section>
             <div class="attrgroup"><span>Bedrooms: 2</span><span>furnished</span></div>
           </body></html>"#,
        id = id
    )
}

fn scraper(fetcher: Arc<FakeFetcher>, storage: Arc<MemoryStorage>) -> Scraper {
    Scraper::new(fetcher, storage, ScraperConfig::immediate("/out"))
}

#[tokio::test]
async fn processes_at_most_max_listings() {
    let mut fetcher = FakeFetcher::default().page(SEARCH_URL, &search_page(&[101, 102, 103, 104]));
    for id in [101, 102, 103, 104] {
        fetcher = fetcher.page(&listing_url(id), &listing_page(id));
    }
    let fetcher = Arc::new(fetcher);
    let storage = Arc::new(MemoryStorage::default());

    let summary = scraper(fetcher.clone(), storage.clone())
        .run(SEARCH_URL, 2)
        .await
        .unwrap();

    assert_eq!(summary.total_listings, 4);
    assert_eq!(summary.processed_listings, 2);
    let ids: Vec<_> = summary.listings.iter().map(|l| l.post_id.as_str()).collect();
    assert_eq!(ids, ["101", "102"]);

    // search page plus two listing pages, nothing more
    assert_eq!(fetcher.page_calls.lock().unwrap().len(), 3);

    let persisted = storage
        .document(Path::new("/out/listings/summary.json"))
        .expect("summary written");
    assert_eq!(persisted["processedListings"], 2);
    assert_eq!(persisted["listings"].as_array().unwrap().len(), 2);
    assert_eq!(persisted["searchUrl"], SEARCH_URL);
}

#[tokio::test]
async fn listing_fetch_failure_skips_only_that_listing() {
    let fetcher = FakeFetcher::default()
        .page(SEARCH_URL, &search_page(&[201, 202, 203]))
        .page(&listing_url(201), &listing_page(201))
        .page(&listing_url(203), &listing_page(203));
    let storage = Arc::new(MemoryStorage::default());

    let summary = scraper(Arc::new(fetcher), storage.clone())
        .run(SEARCH_URL, 10)
        .await
        .unwrap();

    assert_eq!(summary.total_listings, 3);
    assert_eq!(summary.processed_listings, 2);
    assert!(storage
        .document(Path::new("/out/listings/202/metadata.json"))
        .is_none());
    assert!(storage
        .document(Path::new("/out/listings/203/metadata.json"))
        .is_some());
}

#[tokio::test]
async fn search_failure_aborts_without_summary() {
    let storage = Arc::new(MemoryStorage::default());

    let err = scraper(Arc::new(FakeFetcher::default()), storage.clone())
        .run(SEARCH_URL, 5)
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Fetch(_)));
    assert!(storage
        .document(Path::new("/out/listings/summary.json"))
        .is_none());
}

#[tokio::test]
async fn records_every_image_with_its_outcome() {
    let fetcher = FakeFetcher::default()
        .page(SEARCH_URL, &search_page(&[301]))
        .page(&listing_url(301), &listing_page(301))
        .image("https://images.craigslist.org/301_a_1200x900c.jpg", b"high")
        .image("https://images.craigslist.org/301_b_600x450c.jpg", b"std");
    let storage = Arc::new(MemoryStorage::default());

    let summary = scraper(Arc::new(fetcher), storage.clone())
        .run(SEARCH_URL, 1)
        .await
        .unwrap();

    let record = &summary.listings[0];
    assert_eq!(record.description, "Flat number 301");
    assert_eq!(record.snippet, "listing 301");
    assert_eq!(record.attributes["Bedrooms"], "2");
    assert_eq!(record.attributes["attribute1"], "furnished");
    assert_eq!(record.geocode.as_ref().unwrap().latitude, "37.76");

    assert_eq!(record.images.len(), 2);
    assert_eq!(record.images[0].filename, "image_1.jpg");
    assert_eq!(
        record.images[0].outcome,
        ImageOutcome::Success { resolution: Resolution::High, size_bytes: 4 }
    );
    assert_eq!(record.images[1].filename, "image_2.jpg");
    assert_eq!(
        record.images[1].outcome,
        ImageOutcome::Success { resolution: Resolution::Standard, size_bytes: 3 }
    );
    assert_eq!(
        storage.file(Path::new("/out/listings/301/image_2.jpg")).as_deref(),
        Some(&b"std"[..])
    );
    assert!(storage.file(Path::new("/out/listings/301/raw.html")).is_some());
    assert!(storage.file(Path::new("/out/debug/search_page.html")).is_some());
}

#[tokio::test]
async fn failed_images_stay_in_the_record() {
    let fetcher = FakeFetcher::default()
        .page(SEARCH_URL, &search_page(&[401]))
        .page(&listing_url(401), &listing_page(401));
    let storage = Arc::new(MemoryStorage::default());

    let summary = scraper(Arc::new(fetcher), storage.clone())
        .run(SEARCH_URL, 1)
        .await
        .unwrap();

    let images = &summary.listings[0].images;
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|i| !i.outcome.is_success()));

    let metadata = storage
        .document(Path::new("/out/listings/401/metadata.json"))
        .unwrap();
    assert_eq!(metadata["images"][0]["outcome"]["status"], "failure");
}

#[tokio::test]
async fn writes_output_to_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = FakeFetcher::default()
        .page(SEARCH_URL, &search_page(&[501]))
        .page(&listing_url(501), &listing_page(501))
        .image("https://images.craigslist.org/501_a_1200x900c.jpg", b"jpeg");

    let scraper = Scraper::new(
        Arc::new(fetcher),
        Arc::new(FsStorage),
        ScraperConfig::immediate(tmp.path()),
    );
    scraper.run(SEARCH_URL, 1).await.unwrap();

    let listing_dir = tmp.path().join("listings").join("501");
    assert_eq!(std::fs::read(listing_dir.join("image_1.jpg")).unwrap(), b"jpeg");
    assert!(!listing_dir.join("image_2.jpg").exists());

    let metadata: Value =
        serde_json::from_slice(&std::fs::read(listing_dir.join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["postId"], "501");
    assert!(tmp.path().join("listings").join("summary.json").is_file());
}

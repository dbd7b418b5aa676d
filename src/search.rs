use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::dom::{select_attr, select_text};
use crate::models::ListingStub;

static ENTRY_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".cl-static-search-result").unwrap());
static LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".title").unwrap());
static PRICE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".price").unwrap());
static LOCATION_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".location").unwrap());

static POST_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)\.html$").unwrap());

/// Parse a search-results page into listing stubs, in document order.
///
/// Entries whose URL does not end in `/<digits>.html` are dropped; a page
/// with no recognizable entries yields an empty list.
pub fn parse_search_results(html: &str, base_url: &str) -> Vec<ListingStub> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let mut stubs = Vec::new();
    for (index, entry) in document.select(&ENTRY_SEL).enumerate() {
        let Some(href) = select_attr(entry, &LINK_SEL, "href") else {
            tracing::debug!(index, "search entry has no link, skipping");
            continue;
        };
        let url = resolve_url(base.as_ref(), href);

        let Some(post_id) = post_id_from_url(&url) else {
            tracing::debug!(index, %url, "search entry url has no post id, skipping");
            continue;
        };

        stubs.push(ListingStub {
            post_id,
            url,
            title: select_text(entry, &TITLE_SEL),
            price: select_text(entry, &PRICE_SEL),
            location: select_text(entry, &LOCATION_SEL),
            description: entry.value().attr("title").unwrap_or("").to_string(),
        });
    }
    stubs
}

/// Trailing numeric segment of a listing URL (`.../7712345678.html`).
pub fn post_id_from_url(url: &str) -> Option<String> {
    POST_ID_RE.captures(url).map(|cap| cap[1].to_string())
}

fn resolve_url(base: Option<&Url>, href: &str) -> String {
    let href = href.trim();
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

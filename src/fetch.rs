use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ProxyConfig;
use crate::error::{Result, ScrapeError};

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ── Fetch capability ─────────────────────────────────────────────────────────

/// Opaque source of pages and image bytes.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

// ── reqwest-backed fetcher ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    proxy: Option<ProxyConfig>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, insecure: bool, proxy: Option<ProxyConfig>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ScrapeError::Fetch(e.to_string()))?;

        Ok(Self { client, proxy })
    }

    async fn fetch_direct(&self, url: &str) -> Result<String> {
        let response = self.send(self.client.get(url)).await?;
        response
            .text()
            .await
            .map_err(|e| ScrapeError::Fetch(e.to_string()))
    }

    /// Routes the page through the rendering proxy and unwraps its envelope.
    async fn fetch_via_proxy(&self, proxy: &ProxyConfig, url: &str) -> Result<String> {
        let render_js = if proxy.render_js { "true" } else { "false" };
        let request = self.client.get(&proxy.endpoint).query(&[
            ("key", proxy.api_key.as_str()),
            ("url", url),
            ("render_js", render_js),
            ("asp", "true"),
        ]);

        let envelope: Value = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| ScrapeError::Fetch(e.to_string()))?;

        envelope
            .pointer("/result/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::Parse("proxy response has no result.content".to_string()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Fetch(format!("TimeoutError: {}", e))
            } else if e.is_connect() {
                ScrapeError::Fetch(format!("ConnectError: {}", e))
            } else {
                ScrapeError::Fetch(format!("RequestError: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Fetch(format!(
                "upstream returned {} for {}",
                status,
                response.url()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        match &self.proxy {
            Some(proxy) => self.fetch_via_proxy(proxy, url).await,
            None => self.fetch_direct(url).await,
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(self.client.get(url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

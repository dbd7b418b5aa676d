// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Transport or provider failure while fetching a page or image.
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// A document or envelope element that must exist is absent.
    #[error("parse failed: {0}")]
    Parse(String),
    /// Every resolution tier failed for one image.
    #[error("image acquisition failed: {0}")]
    ImageAcquisition(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

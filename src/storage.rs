use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Blob and document sink for scrape output.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Creates the directory (and parents) unless it already exists.
    async fn ensure_dir(&self, dir: &Path) -> Result<()>;

    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    async fn write_document(&self, path: &Path, document: &Value) -> Result<()>;
}

/// Storage backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

#[async_trait]
impl Storage for FsStorage {
    async fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if tokio::fs::try_exists(dir).await? {
            return Ok(());
        }
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn write_document(&self, path: &Path, document: &Value) -> Result<()> {
        let encoded = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(path, encoded).await?;
        Ok(())
    }
}

//! Where the runtime gets the encrypted blob from.

use std::future::Future;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};

/// Fetch collaborator: yields the blob bytes or a transport error.
///
/// Implementations are not retried by the orchestrator.
pub trait BlobSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Blob hosted on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BlobSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::Transport(Box::new(e)))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "fetched blob");
        Ok(bytes)
    }
}

/// Blob already held in memory, e.g. embedded in the binary.
#[derive(Debug, Clone)]
pub struct MemorySource {
    blob: Vec<u8>,
}

impl MemorySource {
    pub fn new(blob: Vec<u8>) -> Self {
        Self { blob }
    }
}

impl BlobSource for MemorySource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        Ok(self.blob.clone())
    }
}

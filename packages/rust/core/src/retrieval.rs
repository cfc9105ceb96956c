//! Internal nearest-neighbor retrieval seam.

use std::sync::Arc;

use analyst_llm::Embedder;
use analyst_shared::{AnalystError, Result, RetrievedChunk};
use analyst_storage::Storage;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// A similarity index over text chunks.
#[async_trait]
pub trait NearestNeighbors: Send + Sync {
    /// Return up to `k` chunks closest to `query`, best first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>>;
}

/// Embeds the query and scans the libSQL index.
///
/// Holds the storage read-only, so one retriever can serve concurrent runs.
#[derive(Clone)]
pub struct IndexRetriever {
    storage: Arc<Storage>,
    embedder: Arc<dyn Embedder>,
}

impl IndexRetriever {
    pub fn new(storage: Arc<Storage>, embedder: Arc<dyn Embedder>) -> Self {
        Self { storage, embedder }
    }
}

#[async_trait]
impl NearestNeighbors for IndexRetriever {
    #[instrument(skip_all, fields(k = k))]
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| AnalystError::Retrieval(format!("query embedding failed: {e}")))?;

        let chunks = self.storage.nearest(&embedding, k).await?;
        debug!(returned = chunks.len(), "index query complete");
        Ok(chunks)
    }
}

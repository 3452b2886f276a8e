//! Question → top-k chunks.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::document::SearchResult;
use crate::embedding::{EmbeddingProvider, with_deadline};
use crate::error::Result;
use crate::index::VectorIndex;

/// Embeds questions and searches a [`VectorIndex`] built with the same provider.
#[derive(Clone)]
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    top_k: usize,
    similarity_threshold: Option<f32>,
    embed_timeout: Option<Duration>,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
        top_k: usize,
    ) -> Self {
        Self { provider, index, top_k, similarity_threshold: None, embed_timeout: None }
    }

    /// Drop results scoring below `threshold`.
    pub fn with_similarity_threshold(mut self, threshold: Option<f32>) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Bound the question embedding call.
    pub fn with_embed_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Return the configured number of chunks most similar to `question`, best first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        self.retrieve_top(question, self.top_k).await
    }

    /// Like [`retrieve`](Retriever::retrieve) with an explicit `k`.
    ///
    /// An empty index returns an empty result without calling the
    /// embedding provider.
    pub async fn retrieve_top(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        if self.index.is_empty() {
            debug!("retrieval against empty index");
            return Ok(Vec::new());
        }

        let query_embedding =
            with_deadline(self.embed_timeout, "question embedding", self.provider.embed(question))
                .await
                .map_err(|e| {
                    error!(
                        provider = self.provider.name(),
                        error = %e,
                        "question embedding failed"
                    );
                    e
                })?;

        let mut results = self.index.search(&query_embedding, k)?;
        if let Some(threshold) = self.similarity_threshold {
            results.retain(|r| r.score >= threshold);
        }

        info!(result_count = results.len(), k, "retrieved context");
        Ok(results)
    }
}

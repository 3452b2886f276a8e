//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the build phase (chunk → embed → index)
//! and the per-question phase (embed → search → compose) by composing an
//! [`EmbeddingProvider`], a [`Chunker`], and a [`PromptComposer`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_rag::{RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .build()?;
//!
//! let index = Arc::new(pipeline.build_index(&document).await?);
//! let results = pipeline.retriever(index).retrieve("search query").await?;
//! let turns = pipeline.compose(&results, "search query");
//! ```

use std::sync::Arc;

use docchat_model::Turn;
use tracing::{error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::{EmbeddingProvider, with_deadline};
use crate::error::{RagError, Result};
use crate::extract::combine;
use crate::index::VectorIndex;
use crate::prompt::PromptComposer;
use crate::retriever::Retriever;

/// The RAG pipeline orchestrator.
///
/// Holds no per-session state; one pipeline can serve any number of
/// sessions. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    composer: PromptComposer,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// Split a document with the configured chunker.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.chunker.chunk(document)
    }

    /// Build an index for one document: chunk → embed → index.
    ///
    /// The whole build is bounded by `embed_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if any chunk fails to embed and
    /// [`RagError::Timeout`] if the deadline passes. No partial index is
    /// returned in either case.
    pub async fn build_index(&self, document: &Document) -> Result<VectorIndex> {
        let chunks = self.chunk(document);
        let chunk_count = chunks.len();
        info!(document.id = %document.id, chunk_count, "chunked document");

        let build = VectorIndex::build(
            self.embedding_provider.as_ref(),
            chunks,
            self.config.metric,
            self.config.embed_batch_size,
        );
        let index =
            with_deadline(self.config.embed_timeout, "index build", build).await.map_err(|e| {
                error!(document.id = %document.id, error = %e, "index build failed");
                e
            })?;

        info!(document.id = %document.id, records = index.len(), "indexed document");
        Ok(index)
    }

    /// Combine several documents into one session text and index it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if `documents` is empty, and
    /// otherwise the errors of [`build_index`](RagPipeline::build_index).
    pub async fn build_session_index(&self, documents: &[Document]) -> Result<VectorIndex> {
        if documents.is_empty() {
            return Err(RagError::PipelineError("no documents to index".to_string()));
        }
        self.build_index(&combine(documents)).await
    }

    /// A retriever over `index` using this pipeline's provider and settings.
    pub fn retriever(&self, index: Arc<VectorIndex>) -> Retriever {
        Retriever::new(self.embedding_provider.clone(), index, self.config.top_k)
            .with_similarity_threshold(self.config.similarity_threshold)
            .with_embed_timeout(self.config.embed_timeout)
    }

    /// Assemble the prompt turns for `question`.
    pub fn compose(&self, results: &[SearchResult], question: &str) -> Vec<Turn> {
        self.composer.compose_results(results, question)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config` and `embedding_provider` are required. The chunker defaults to a
/// [`RecursiveChunker`] and the composer to a [`PromptComposer`], both set
/// up from the config.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .chunker(Arc::new(FixedSizeChunker::new(500, 100)))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
    composer: Option<PromptComposer>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the prompt composer.
    pub fn composer(mut self, composer: PromptComposer) -> Self {
        self.composer = Some(composer);
        self
    }

    /// Build the [`RagPipeline`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing
    /// or the config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });
        let composer = self.composer.unwrap_or_else(|| {
            PromptComposer::new()
                .with_instruction(config.system_instruction.clone())
                .with_max_context_chars(config.max_context_chars)
        });

        Ok(RagPipeline { config, embedding_provider, chunker, composer })
    }
}

//! In-memory vector index with exact nearest-neighbour search.
//!
//! [`VectorIndex`] is built once per document set and then only queried; it
//! owns its chunks for the lifetime of the session. Search is a linear scan
//! over all records, which is plenty for the few thousand chunks a set of
//! uploaded documents produces.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// File name used by [`VectorIndex::save`] and [`VectorIndex::load`].
pub const INDEX_FILE_NAME: &str = "index.json";

const BACKEND: &str = "InMemory";

/// How query vectors are compared with stored vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity; scores lie in `[-1, 1]`.
    #[default]
    Cosine,
    /// L2 distance; the score is the negated distance so higher is still better.
    Euclidean,
}

impl DistanceMetric {
    /// Similarity score between two vectors of equal length. Higher is closer.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::Euclidean => -euclidean_distance(a, b),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// A chunk paired with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingRecord {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// An immutable collection of [`EmbeddingRecord`]s supporting top-k search.
///
/// All records share one dimensionality. There are no updates or deletes;
/// a new document set gets a new index.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{DistanceMetric, VectorIndex};
///
/// let index = VectorIndex::build(&provider, chunks, DistanceMetric::Cosine, 64).await?;
/// let results = index.search(&query_embedding, 4)?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VectorIndex {
    dimensions: usize,
    metric: DistanceMetric,
    records: Vec<EmbeddingRecord>,
}

impl VectorIndex {
    /// An index with no records.
    pub fn empty(metric: DistanceMetric) -> Self {
        Self { dimensions: 0, metric, records: Vec::new() }
    }

    /// Embed every chunk and index the results.
    ///
    /// Chunks are sent to the provider in batches of `batch_size`, in
    /// order. The build is all-or-nothing: if any batch fails, returns the
    /// wrong number of vectors, or returns a vector of a different
    /// dimensionality, no index is produced.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] on any embedding failure.
    pub async fn build(
        provider: &dyn EmbeddingProvider,
        chunks: Vec<Chunk>,
        metric: DistanceMetric,
        batch_size: usize,
    ) -> Result<Self> {
        if chunks.is_empty() {
            debug!("building empty index");
            return Ok(Self::empty(metric));
        }

        let batch_size = batch_size.max(1);
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

        for (batch_index, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = provider.embed_batch(&texts).await.map_err(|e| {
                error!(
                    provider = provider.name(),
                    batch_index,
                    error = %e,
                    "embedding batch failed"
                );
                match e {
                    RagError::EmbeddingError { .. } | RagError::Timeout(_) => e,
                    other => RagError::embedding(provider.name(), other.to_string()),
                }
            })?;

            if vectors.len() != batch.len() {
                error!(
                    batch_index,
                    expected = batch.len(),
                    got = vectors.len(),
                    "embedding count mismatch"
                );
                return Err(RagError::embedding(
                    provider.name(),
                    format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
                ));
            }
            embeddings.extend(vectors);
        }

        let records = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddingRecord { chunk, embedding })
            .collect();
        let index = Self::from_records(records, metric).map_err(|e| match e {
            RagError::VectorStoreError { message, .. } => {
                RagError::embedding(provider.name(), message)
            }
            other => other,
        })?;

        if index.dimensions != provider.dimensions() {
            warn!(
                provider = provider.name(),
                declared = provider.dimensions(),
                actual = index.dimensions,
                "provider dimensionality differs from returned vectors"
            );
        }
        info!(records = index.len(), dimensions = index.dimensions, "built vector index");
        Ok(index)
    }

    /// Assemble an index from pre-computed records.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if any record is empty or the
    /// records disagree on dimensionality.
    pub fn from_records(records: Vec<EmbeddingRecord>, metric: DistanceMetric) -> Result<Self> {
        let dimensions = records.first().map(|r| r.embedding.len()).unwrap_or(0);
        if !records.is_empty() && dimensions == 0 {
            return Err(vector_store_error("embeddings must not be empty"));
        }
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != dimensions) {
            return Err(vector_store_error(format!(
                "chunk '{}' has dimensionality {}, expected {dimensions}",
                bad.chunk.id,
                bad.embedding.len()
            )));
        }
        Ok(Self { dimensions, metric, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimensionality of the stored vectors; zero for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    /// Return the `top_k` records nearest to `embedding`, best first.
    ///
    /// Equal scores are ordered by ascending chunk index. An empty index
    /// returns an empty result for any query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the query's dimensionality
    /// differs from the index.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if self.records.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimensions {
            return Err(vector_store_error(format!(
                "query has dimensionality {}, index has {}",
                embedding.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<SearchResult> = self
            .records
            .iter()
            .map(|record| SearchResult {
                chunk: record.chunk.clone(),
                score: self.metric.score(&record.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Write the index to `dir/index.json`, creating `dir` if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .map_err(|e| vector_store_error(format!("failed to create {}: {e}", dir.display())))?;
        let path = dir.join(INDEX_FILE_NAME);
        let file = File::create(&path)
            .map_err(|e| vector_store_error(format!("failed to create {}: {e}", path.display())))?;
        serde_json::to_writer(BufWriter::new(file), self)
            .map_err(|e| vector_store_error(format!("failed to write {}: {e}", path.display())))?;
        info!(path = %path.display(), records = self.len(), "saved vector index");
        Ok(path)
    }

    /// Read an index written by [`save`](VectorIndex::save).
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE_NAME);
        let file = File::open(&path)
            .map_err(|e| vector_store_error(format!("failed to open {}: {e}", path.display())))?;
        let stored: VectorIndex = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| vector_store_error(format!("failed to parse {}: {e}", path.display())))?;
        let index = Self::from_records(stored.records, stored.metric)?;
        info!(path = %path.display(), records = index.len(), "loaded vector index");
        Ok(index)
    }
}

fn vector_store_error(message: impl Into<String>) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message: message.into() }
}

//! Test embedding providers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docchat_rag::{Chunk, EmbeddingProvider, RagError, Result};

pub const DIM: usize = 32;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Bag-of-words embeddings: every lowercase word is hashed into one of
/// `DIM` buckets and the counts are L2-normalised. Identical texts get
/// identical vectors; texts sharing words score higher.
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }

    /// Number of `embed` calls made so far (batch calls count per text).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(FNV_OFFSET, |acc, b| (acc ^ b as u64).wrapping_mul(FNV_PRIME));
        v[(hash % DIM as u64) as usize] += 1.0;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(keyword_vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Every text embeds to the same vector, so every score ties.
pub struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// Succeeds for the first `ok_batches` batch calls, then fails.
pub struct FailingEmbedder {
    ok_batches: usize,
    batches: AtomicUsize,
}

impl FailingEmbedder {
    pub fn after(ok_batches: usize) -> Self {
        Self { ok_batches, batches: AtomicUsize::new(0) }
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let n = self.batches.fetch_add(1, Ordering::SeqCst);
        if n >= self.ok_batches {
            return Err(RagError::embedding("failing", "rate limited"));
        }
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Returns one vector too few per batch.
pub struct ShortBatchEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortBatchEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|t| keyword_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Returns vectors whose length grows with every call.
pub struct DriftingEmbedder {
    calls: AtomicUsize,
}

impl DriftingEmbedder {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for DriftingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1.0; 2 + n])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Sleeps before answering; pair with a paused tokio clock.
pub struct SlowEmbedder {
    pub delay: Duration,
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(self.delay).await;
        Ok(keyword_vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "slow"
    }
}

pub fn chunk(index: usize, text: &str) -> Chunk {
    Chunk {
        id: format!("doc_{index}"),
        document_id: "doc".to_string(),
        index,
        text: text.to_string(),
        start: 0,
        end: text.len(),
        metadata: HashMap::new(),
    }
}

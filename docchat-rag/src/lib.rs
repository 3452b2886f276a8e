//! # docchat-rag
//!
//! Retrieval-augmented question answering over uploaded documents.
//!
//! ## Overview
//!
//! - [`extract`] / [`combine`] - turn PDF or text uploads into one session [`Document`]
//! - [`Chunker`] - [`RecursiveChunker`] and [`FixedSizeChunker`]
//! - [`EmbeddingProvider`] - text → vector; [`OpenAIEmbeddingProvider`] behind feature `openai`
//! - [`VectorIndex`] - exact top-k search, optionally persisted to disk
//! - [`Retriever`] - question → ranked chunks
//! - [`PromptComposer`] - system instruction plus context plus question
//! - [`RagPipeline`] - builds indexes and retrievers from a [`RagConfig`]
//! - [`ChatSession`] - asks questions and streams answers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docchat_rag::{ChatSession, RagConfig, RagPipeline, extract_file};
//!
//! let pipeline = Arc::new(
//!     RagPipeline::builder()
//!         .config(RagConfig::default())
//!         .embedding_provider(Arc::new(embedder))
//!         .build()?,
//! );
//! let documents = vec![extract_file("report.pdf".as_ref())?];
//! let session = ChatSession::start(pipeline, completion, &documents).await?;
//!
//! let mut answer = session.ask("What does the report conclude?").await?;
//! while let Some(partial) = answer.response.next().await {
//!     render(partial?);
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod session;

pub use chunking::{Chunker, DEFAULT_SEPARATORS, FixedSizeChunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, MediaType, SESSION_TAG, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::{combine, extract, extract_file};
pub use index::{DistanceMetric, EmbeddingRecord, INDEX_FILE_NAME, VectorIndex};
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use prompt::{DEFAULT_SYSTEM_INSTRUCTION, PromptComposer};
pub use retriever::Retriever;
pub use session::{Answer, ChatSession};

//! Error types for the `docchat-rag` crate.

use docchat_model::ModelError;
use thiserror::Error;

/// Errors that can occur while extracting, indexing, or answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// An uploaded document is unreadable, corrupt, or of an unsupported type.
    #[error("Document error ({source_name}): {message}")]
    DocumentError {
        /// The file name of the offending document.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index or its persisted form.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error, including a missing credential.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An embedding or indexing call exceeded its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// An error in the pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// A completion failure propagated from `docchat-model`.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl RagError {
    pub fn document(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentError { source_name: source_name.into(), message: message.into() }
    }

    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

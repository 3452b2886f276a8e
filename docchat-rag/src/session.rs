//! A question-answering session over one set of documents.

use std::sync::Arc;

use docchat_model::{CompletionClient, ResponseAccumulator};
use tracing::{error, info};
use uuid::Uuid;

use crate::document::{Document, SearchResult};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::pipeline::RagPipeline;
use crate::retriever::Retriever;

/// The answer to one question: the chunks it was grounded on and the
/// streaming response.
pub struct Answer {
    pub sources: Vec<SearchResult>,
    pub response: ResponseAccumulator,
}

/// Owns the index for one document set and answers questions against it.
///
/// Sessions share no mutable state; each upload gets its own session.
pub struct ChatSession {
    id: String,
    pipeline: Arc<RagPipeline>,
    retriever: Retriever,
    completion: Arc<dyn CompletionClient>,
}

impl ChatSession {
    /// Index `documents` and open a session over them.
    ///
    /// # Errors
    ///
    /// Propagates extraction-independent build failures
    /// ([`RagError::EmbeddingError`], [`RagError::Timeout`]).
    pub async fn start(
        pipeline: Arc<RagPipeline>,
        completion: Arc<dyn CompletionClient>,
        documents: &[Document],
    ) -> Result<Self> {
        let index = pipeline.build_session_index(documents).await?;
        Ok(Self::with_index(pipeline, completion, index))
    }

    /// Open a session over an index built earlier (or loaded from disk).
    pub fn with_index(
        pipeline: Arc<RagPipeline>,
        completion: Arc<dyn CompletionClient>,
        index: VectorIndex,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        let retriever = pipeline.retriever(Arc::new(index));
        info!(
            session.id = %id,
            records = retriever.index().len(),
            model = completion.name(),
            "session ready"
        );
        Self { id, pipeline, retriever, completion }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> &VectorIndex {
        self.retriever.index()
    }

    /// Retrieve context for `question`, compose the prompt, and start
    /// streaming the answer.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] for a blank question, retrieval
    /// errors, and [`RagError::Model`] if the completion cannot be started.
    /// Failures after streaming begins arrive through [`Answer::response`].
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::PipelineError("question must not be empty".to_string()));
        }

        let sources = self.retriever.retrieve(question).await?;
        let turns = self.pipeline.compose(&sources, question);

        let stream = self.completion.complete_stream(turns).await.map_err(|e| {
            error!(session.id = %self.id, error = %e, "failed to start completion");
            RagError::from(e)
        })?;

        info!(session.id = %self.id, sources = sources.len(), "answer streaming");
        Ok(Answer { sources, response: ResponseAccumulator::new(stream) })
    }
}

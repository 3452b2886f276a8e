//! Prompt assembly from retrieved context.

use docchat_model::Turn;
use tracing::debug;

use crate::document::SearchResult;

/// The instruction sent as the system turn unless configured otherwise.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant. Answer using only the provided context.";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Builds the turn sequence sent to the completion model.
///
/// The output is always two turns: the system instruction, then a user turn
/// holding the retrieved chunk texts (retrieval order, blank-line
/// separated), a blank line, and the question.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptComposer {
    instruction: String,
    max_context_chars: Option<usize>,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self { instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(), max_context_chars: None }
    }
}

impl PromptComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Limit the joined context to `max_chars` characters.
    ///
    /// Lowest-ranked chunks are dropped until the context fits; chunks are
    /// never cut.
    pub fn with_max_context_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_context_chars = max_chars;
        self
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Compose turns from chunk texts given best-first.
    pub fn compose(&self, context: &[&str], question: &str) -> Vec<Turn> {
        let kept = self.fit_context(context);
        if kept.len() < context.len() {
            debug!(dropped = context.len() - kept.len(), kept = kept.len(), "context over cap");
        }

        let user = if kept.is_empty() {
            question.to_string()
        } else {
            format!("{}{CONTEXT_SEPARATOR}{question}", kept.join(CONTEXT_SEPARATOR))
        };

        vec![Turn::system(self.instruction.clone()), Turn::user(user)]
    }

    /// Compose turns from search results given best-first.
    pub fn compose_results(&self, results: &[SearchResult], question: &str) -> Vec<Turn> {
        let context: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        self.compose(&context, question)
    }

    /// The longest best-first prefix of `context` whose joined length fits the cap.
    fn fit_context<'a>(&self, context: &[&'a str]) -> Vec<&'a str> {
        let Some(cap) = self.max_context_chars else {
            return context.to_vec();
        };

        let separator_len = CONTEXT_SEPARATOR.chars().count();
        let mut kept = context.to_vec();
        let mut total: usize = kept.iter().map(|t| t.chars().count()).sum::<usize>()
            + separator_len * kept.len().saturating_sub(1);

        while total > cap {
            let Some(dropped) = kept.pop() else { break };
            total -= dropped.chars().count();
            if !kept.is_empty() {
                total -= separator_len;
            }
        }
        kept
    }
}

//! Data types for documents, chunks, and search results.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Document id given to the combined text of a multi-document session.
pub const SESSION_TAG: &str = "session";

/// The declared type of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Pdf,
    PlainText,
}

impl MediaType {
    /// Infer the media type from a file extension (`pdf`, `txt`, `text`, `md`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(MediaType::Pdf),
            "txt" | "text" | "md" => Some(MediaType::PlainText),
            _ => None,
        }
    }

    /// Recognize a PDF by its `%PDF-` header.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        bytes.starts_with(b"%PDF-").then_some(MediaType::Pdf)
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::PlainText => "text/plain",
        }
    }
}

/// Extracted text of one upload, or of a whole session when combined.
///
/// Immutable once produced by [`extract`](crate::extract::extract).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Source file name, or [`SESSION_TAG`] for combined documents.
    pub id: String,
    pub media_type: MediaType,
    /// Page texts in page order. Plain-text documents have a single page.
    pub pages: Vec<String>,
    /// The full text that gets chunked.
    pub text: String,
    /// Key-value metadata associated with the document.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Build a document whose text is its pages concatenated in order.
    pub fn new(id: impl Into<String>, media_type: MediaType, pages: Vec<String>) -> Self {
        let text = pages.concat();
        Self { id: id.into(), media_type, pages, text, metadata: HashMap::new() }
    }

    /// A single-page plain-text document.
    pub fn from_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, MediaType::PlainText, vec![text.into()])
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The first `max_chars` characters, followed by `...` if the text is longer.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.text[..cut]),
            None => self.text.clone(),
        }
    }
}

/// A bounded slice of a [`Document`]'s text; the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{document_id}_{index}`.
    pub id: String,
    /// The ID of the parent [`Document`] (or the session tag).
    pub document_id: String,
    /// Position in the chunking sequence, starting at zero.
    pub index: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Byte offset of the chunk's first character in the parent text.
    pub start: usize,
    /// Byte offset one past the chunk's last character in the parent text.
    pub end: usize,
    /// Metadata inherited from the parent document plus `chunk_index`.
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Length of the chunk text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

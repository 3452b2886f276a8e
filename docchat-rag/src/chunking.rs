//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] - prefers natural boundaries (paragraph, line,
//!   sentence, word) and falls back to a hard character cut
//! - [`FixedSizeChunker`] - hard character cuts with exact overlap
//!
//! Sizes and overlaps are measured in characters, never bytes. Both
//! strategies are deterministic.

use std::collections::HashMap;
use std::ops::Range;

use crate::document::{Chunk, Document};

/// Boundary candidates in descending granularity. The empty separator means
/// "split between characters".
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// Each chunk takes at most `chunk_size` characters from its start and ends
/// after the last occurrence of the coarsest separator inside that window
/// (the separator stays with the chunk it ends). A window with no usable
/// separator is cut at `chunk_size` characters.
///
/// The next chunk starts `chunk_overlap` characters before the end of the
/// previous chunk's content, moved back to the nearest word start, or to the
/// nearest non-whitespace character when no word starts close by. Neighbours
/// therefore share at least `chunk_overlap` characters unless the text is
/// mostly whitespace around the cut. Chunk text is trimmed of surrounding
/// whitespace and whitespace-only chunks are dropped.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(500, 100);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with [`DEFAULT_SEPARATORS`].
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap` - characters shared by consecutive chunks, clamped
    ///   below `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the boundary candidates, finest last.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Split raw text, returning byte ranges of the chunks in order.
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let byte_at = |pos: usize| chars.get(pos).map_or(text.len(), |(offset, _)| *offset);

        let mut spans = Vec::new();
        let mut start = 0;
        // End of the previous window; every window must reach past it.
        let mut floor = 0;

        loop {
            start += chars[start..].iter().take_while(|(_, c)| c.is_whitespace()).count();
            if start >= chars.len() {
                break;
            }
            if chars.len() - start <= self.chunk_size {
                push_trimmed(text, byte_at(start)..text.len(), &mut spans);
                break;
            }

            let limit = start + self.chunk_size;
            let end = self.boundary(text, &chars, start, limit, floor).unwrap_or(limit);
            let content_end = trim_end(&chars, start, end);
            spans.push(byte_at(start)..byte_at(content_end));

            if chars[end..].iter().all(|(_, c)| c.is_whitespace()) {
                break;
            }
            start = self.next_start(&chars, start, end, content_end);
            floor = end;
        }
        spans
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_spans(text).into_iter().map(|span| text[span].to_string()).collect()
    }

    /// Preferred end (char position) of the window `[start, limit)`: just
    /// after the last occurrence of the coarsest separator that leaves more
    /// than `chunk_overlap` characters of content and reaches past `floor`.
    fn boundary(
        &self,
        text: &str,
        chars: &[(usize, char)],
        start: usize,
        limit: usize,
        floor: usize,
    ) -> Option<usize> {
        let from = chars[start].0;
        let to = chars[limit].0;
        let window = &text[from..to];

        for separator in &self.separators {
            if separator.is_empty() {
                return None;
            }
            let at_limit =
                separator.trim().is_empty() && text[to..].starts_with(separator.as_str());
            let candidate = if at_limit {
                Some(limit)
            } else {
                window
                    .rfind(separator.as_str())
                    .map(|pos| char_position(chars, from + pos + separator.len()))
            };
            if let Some(end) = candidate {
                if end > floor && trim_end(chars, start, end) > start + self.chunk_overlap {
                    return Some(end);
                }
            }
        }
        None
    }

    /// Char position where the chunk after `[start, end)` begins.
    fn next_start(
        &self,
        chars: &[(usize, char)],
        start: usize,
        end: usize,
        content_end: usize,
    ) -> usize {
        if self.chunk_overlap == 0 {
            return end;
        }
        let Some(target) = content_end.checked_sub(self.chunk_overlap).filter(|t| *t > start)
        else {
            return end;
        };

        // The next window must reach past `end`.
        let reach = (end + 1).saturating_sub(self.chunk_size);
        let target = target.max(reach);

        let lowest = (start + 1).max(reach).max(target.saturating_sub(self.chunk_overlap));
        if let Some(word) = (lowest..=target).rev().find(|&pos| is_word_start(chars, pos)) {
            return word;
        }

        let bottom = start.max(reach);
        let mut pos = target;
        while pos > bottom && chars[pos].1.is_whitespace() {
            pos -= 1;
        }
        pos
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(500, 100)
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        to_chunks(document, self.split_spans(&document.text))
    }
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Every chunk except possibly the last has exactly `chunk_size` characters,
/// and consecutive chunks share exactly `chunk_overlap` characters, so the
/// text can be rebuilt by dropping the overlap from every chunk after the first.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(500, 100);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// `chunk_size` is raised to at least 1 and `chunk_overlap` clamped below it.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        to_chunks(document, split_by_size(&document.text, self.chunk_size, self.chunk_overlap))
    }
}

fn to_chunks(document: &Document, spans: Vec<Range<usize>>) -> Vec<Chunk> {
    spans
        .into_iter()
        .enumerate()
        .map(|(index, span)| {
            let mut metadata: HashMap<String, String> = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), index.to_string());
            Chunk {
                id: format!("{}_{index}", document.id),
                document_id: document.id.clone(),
                index,
                text: document.text[span.clone()].to_string(),
                start: span.start,
                end: span.end,
                metadata,
            }
        })
        .collect()
}

/// Character-based cuts with overlap, as byte ranges into `text`.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<Range<usize>> {
    if text.is_empty() {
        return Vec::new();
    }

    let boundaries: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_count = boundaries.len() - 1;
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut spans = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        spans.push(boundaries[start]..boundaries[end]);
        if end == char_count {
            break;
        }
        start += step;
    }
    spans
}

/// Char position of a byte offset that lies on a char boundary.
fn char_position(chars: &[(usize, char)], byte: usize) -> usize {
    chars.partition_point(|(offset, _)| *offset < byte)
}

/// Move `end` back over trailing whitespace, never past `start`.
fn trim_end(chars: &[(usize, char)], start: usize, mut end: usize) -> usize {
    while end > start && chars[end - 1].1.is_whitespace() {
        end -= 1;
    }
    end
}

fn is_word_start(chars: &[(usize, char)], pos: usize) -> bool {
    pos > 0 && !chars[pos].1.is_whitespace() && chars[pos - 1].1.is_whitespace()
}

/// Push `span` with surrounding whitespace removed, skipping blank spans.
fn push_trimmed(text: &str, span: Range<usize>, out: &mut Vec<Range<usize>>) {
    let slice = &text[span.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return;
    }
    out.push((span.start + leading)..(span.end - trailing));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_stays_with_the_chunk_it_ends() {
        let chunks = RecursiveChunker::new(12, 0).split_text("one. two. three");
        assert_eq!(chunks, vec!["one. two.", "three"]);
    }

    #[test]
    fn whitespace_separator_right_after_window_is_used() {
        let spans = RecursiveChunker::new(9, 0).split_spans("alpha bet gamma");
        assert_eq!(spans, vec![0..9, 10..15]);
    }

    #[test]
    fn word_starts_and_trimming_work_on_char_positions() {
        let chars: Vec<(usize, char)> = "é b  ".char_indices().collect();
        assert!(is_word_start(&chars, 2));
        assert!(!is_word_start(&chars, 0));
        assert!(!is_word_start(&chars, 3));
        assert_eq!(trim_end(&chars, 0, chars.len()), 3);
        assert_eq!(char_position(&chars, 3), 2);
    }

    #[test]
    fn next_chunk_starts_at_a_word_inside_the_overlap() {
        let chunker = RecursiveChunker::new(14, 4);
        assert_eq!(
            chunker.split_text("one two three four five six"),
            vec!["one two three", "three four", "four five six"]
        );
    }

    #[test]
    fn hard_cut_stops_when_remainder_fits() {
        let spans = split_by_size(&"x".repeat(880), 500, 100);
        assert_eq!(spans, vec![0..500, 400..880]);
    }

    #[test]
    fn trimming_drops_blank_spans() {
        let mut out = Vec::new();
        push_trimmed("  \n ", 0..4, &mut out);
        push_trimmed(" ab ", 0..4, &mut out);
        assert_eq!(out, vec![1..3]);
    }

    #[test]
    fn constructor_clamps_invalid_parameters() {
        let chunker = RecursiveChunker::new(0, 5);
        assert_eq!(chunker.chunk_size, 1);
        assert_eq!(chunker.chunk_overlap, 0);
    }
}

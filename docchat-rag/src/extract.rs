//! Text extraction from uploaded documents.
//!
//! PDFs are parsed with `lopdf` and read page by page; plain text is decoded
//! as UTF-8. Several uploads are merged with [`combine`] so that the session
//! text stays traceable to its source files.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::document::{Document, MediaType, SESSION_TAG};
use crate::error::{RagError, Result};

/// Extract the text of one document from its raw bytes.
///
/// # Errors
///
/// Returns [`RagError::DocumentError`] if the bytes are not a readable PDF
/// or not valid UTF-8 text.
pub fn extract(name: &str, bytes: &[u8], media_type: MediaType) -> Result<Document> {
    let pages = match media_type {
        MediaType::Pdf => extract_pdf_pages(name, bytes)?,
        MediaType::PlainText => vec![decode_text(name, bytes)?],
    };

    let document = Document::new(name, media_type, pages)
        .with_metadata("source", name)
        .with_metadata("media_type", media_type.mime());
    info!(
        document.id = %document.id,
        pages = document.pages.len(),
        chars = document.char_len(),
        "extracted document"
    );
    Ok(document)
}

/// Read and extract a file from disk.
///
/// The media type comes from the file extension, falling back to sniffing
/// the PDF header. The document id is the file name.
pub fn extract_file(path: &Path) -> Result<Document> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path)
        .map_err(|e| RagError::document(&name, format!("failed to read file: {e}")))?;

    let media_type = MediaType::from_path(path)
        .or_else(|| MediaType::sniff(&bytes))
        .ok_or_else(|| RagError::document(&name, "unsupported file type (expected PDF or text)"))?;

    extract(&name, &bytes, media_type)
}

/// Merge several documents into one session document.
///
/// Each document becomes a `--- {id} ---` separator line followed by its
/// text; blocks are joined by a blank line. A single document is labelled
/// the same way. The combined document has one page per source block, so
/// its text is still its pages concatenated.
pub fn combine(documents: &[Document]) -> Document {
    let pages = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let gap = if i == 0 { "" } else { "\n\n" };
            format!("{gap}--- {} ---\n{}", doc.id, doc.text)
        })
        .collect();

    let sources = documents.iter().map(|d| d.id.as_str()).collect::<Vec<_>>().join(",");

    let mut combined = Document::new(SESSION_TAG, MediaType::PlainText, pages);
    combined.metadata.insert("sources".to_string(), sources);
    debug!(documents = documents.len(), chars = combined.char_len(), "combined documents");
    combined
}

fn decode_text(name: &str, bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| RagError::document(name, format!("not valid UTF-8 text: {e}")))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

fn extract_pdf_pages(name: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let pdf = lopdf::Document::load_mem(bytes)
        .map_err(|e| RagError::document(name, format!("failed to parse PDF: {e}")))?;

    if pdf.is_encrypted() {
        return Err(RagError::document(name, "encrypted PDFs are not supported"));
    }

    // get_pages is keyed by page number, so iteration is in page order.
    let mut pages = Vec::new();
    for page_number in pdf.get_pages().keys() {
        match pdf.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                warn!(
                    document.id = name,
                    page = page_number,
                    error = %e,
                    "page has no extractable text"
                );
                pages.push(String::new());
            }
        }
    }

    if pages.is_empty() {
        return Err(RagError::document(name, "PDF contains no pages"));
    }
    Ok(pages)
}

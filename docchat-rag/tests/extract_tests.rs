//! Document extraction and combination tests.

use docchat_rag::{MediaType, RagError, SESSION_TAG, combine, extract, extract_file};
use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};

/// A minimal PDF with one line of text per page.
fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for line in lines {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[test]
fn plain_text_becomes_one_page() {
    let doc = extract("notes.txt", "line one\nline two".as_bytes(), MediaType::PlainText).unwrap();
    assert_eq!(doc.id, "notes.txt");
    assert_eq!(doc.media_type, MediaType::PlainText);
    assert_eq!(doc.pages, vec!["line one\nline two".to_string()]);
    assert_eq!(doc.text, "line one\nline two");
}

#[test]
fn invalid_utf8_is_a_document_error() {
    let result = extract("bad.txt", &[0xff, 0xfe, 0x00, 0xc3], MediaType::PlainText);
    match result {
        Err(RagError::DocumentError { source_name, .. }) => assert_eq!(source_name, "bad.txt"),
        other => panic!("expected DocumentError, got {other:?}"),
    }
}

#[test]
fn corrupt_pdf_is_a_document_error() {
    let result = extract("broken.pdf", b"%PDF-1.4\nthis is not a pdf body", MediaType::Pdf);
    assert!(matches!(result, Err(RagError::DocumentError { .. })));
}

#[test]
fn pdf_text_is_read_page_by_page() {
    let bytes = pdf_with_pages(&["First page", "Second page"]);
    let doc = extract("report.pdf", &bytes, MediaType::Pdf).unwrap();

    assert_eq!(doc.pages.len(), 2);
    assert!(doc.pages[0].contains("First"));
    assert!(doc.pages[1].contains("Second"));
    assert_eq!(doc.text, doc.pages.concat());
    assert!(doc.text.find("First") < doc.text.find("Second"));
    assert_eq!(doc.metadata.get("media_type").map(String::as_str), Some("application/pdf"));
}

#[test]
fn extract_file_uses_extension_then_header() {
    let dir = tempfile::tempdir().unwrap();

    let text_path = dir.path().join("notes.md");
    std::fs::write(&text_path, "# Title\nbody").unwrap();
    let doc = extract_file(&text_path).unwrap();
    assert_eq!(doc.id, "notes.md");
    assert_eq!(doc.media_type, MediaType::PlainText);

    let pdf_path = dir.path().join("scan");
    std::fs::write(&pdf_path, pdf_with_pages(&["Sniffed"])).unwrap();
    let doc = extract_file(&pdf_path).unwrap();
    assert_eq!(doc.media_type, MediaType::Pdf);
    assert!(doc.text.contains("Sniffed"));
}

#[test]
fn unsupported_or_missing_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let sheet = dir.path().join("data.xlsx");
    std::fs::write(&sheet, b"PK\x03\x04").unwrap();
    assert!(matches!(extract_file(&sheet), Err(RagError::DocumentError { .. })));

    let missing = dir.path().join("missing.txt");
    assert!(matches!(extract_file(&missing), Err(RagError::DocumentError { .. })));
}

#[test]
fn combine_labels_each_source() {
    let a = extract("a.txt", b"alpha", MediaType::PlainText).unwrap();
    let b = extract("b.txt", b"beta", MediaType::PlainText).unwrap();

    let combined = combine(&[a, b]);
    assert_eq!(combined.id, SESSION_TAG);
    assert_eq!(combined.text, "--- a.txt ---\nalpha\n\n--- b.txt ---\nbeta");
    assert_eq!(combined.metadata.get("sources").map(String::as_str), Some("a.txt,b.txt"));
}

#[test]
fn combined_text_is_its_pages_concatenated() {
    let pdf = extract("report.pdf", &pdf_with_pages(&["Page one", "Page two"]), MediaType::Pdf)
        .unwrap();
    let notes = extract("notes.txt", b"plain notes", MediaType::PlainText).unwrap();

    let combined = combine(&[pdf, notes]);
    assert_eq!(combined.pages.len(), 2);
    assert_eq!(combined.text, combined.pages.concat());
    assert!(combined.pages[0].starts_with("--- report.pdf ---\n"));
    assert_eq!(combined.pages[1], "\n\n--- notes.txt ---\nplain notes");
}

#[test]
fn single_document_is_labelled_too() {
    let a = extract("only.txt", b"content", MediaType::PlainText).unwrap();
    assert_eq!(combine(&[a]).text, "--- only.txt ---\ncontent");
}

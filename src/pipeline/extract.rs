//! Document text extraction: PDF and DOCX bytes to plain text.
//!
//! PDF text comes from pdfium, one string per page in page order, joined
//! with a single newline. DOCX text comes from the paragraphs of
//! `word/document.xml` in document order, joined the same way. Extraction
//! only reads its input; the same bytes always produce the same text.
//!
//! pdfium is not async-safe, so PDF work runs inside `spawn_blocking`.

use crate::error::Resume2WebError;
use crate::pipeline::input::{DocumentKind, UploadedDocument};
use pdfium_render::prelude::*;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::{debug, info};

const DOCX_BODY_PART: &str = "word/document.xml";

/// Extract plain text from an uploaded document.
///
/// Rejects undeclared kinds with `UnsupportedFormat` before reading any bytes.
pub async fn extract_text(
    document: &UploadedDocument,
    password: Option<&str>,
) -> Result<String, Resume2WebError> {
    let kind = document.kind()?;
    check_magic(document, kind)?;

    let name = document.name.clone();
    let bytes = document.bytes.clone();
    let password = password.map(str::to_string);

    let text = tokio::task::spawn_blocking(move || match kind {
        DocumentKind::Pdf => extract_pdf_blocking(&name, &bytes, password.as_deref()),
        DocumentKind::Docx => extract_docx(&name, &bytes),
    })
    .await
    .map_err(|e| Resume2WebError::Internal(format!("Extraction task panicked: {}", e)))??;

    info!(
        "Extracted {} chars from {} ({:?})",
        text.chars().count(),
        document.name,
        kind
    );
    Ok(text)
}

/// Refuse bytes that clearly are not the declared kind.
fn check_magic(document: &UploadedDocument, kind: DocumentKind) -> Result<(), Resume2WebError> {
    let expected: &[u8] = match kind {
        DocumentKind::Pdf => b"%PDF",
        DocumentKind::Docx => b"PK",
    };
    if document.bytes.starts_with(expected) {
        return Ok(());
    }
    let head: Vec<u8> = document.bytes.iter().take(4).copied().collect();
    Err(Resume2WebError::CorruptDocument {
        name: document.name.clone(),
        detail: format!(
            "declared {} but content starts with {:?}",
            kind.content_type(),
            head
        ),
    })
}

// ── PDF ──────────────────────────────────────────────────────────────────

fn bind_pdfium() -> Result<Pdfium, Resume2WebError> {
    pdfium_auto::bind_pdfium_silent()
        .map_err(|e| Resume2WebError::PdfiumBindingFailed(e.to_string()))
}

/// Blocking implementation of PDF text extraction.
fn extract_pdf_blocking(
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<String, Resume2WebError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    Resume2WebError::WrongPassword {
                        name: name.to_string(),
                    }
                } else {
                    Resume2WebError::PasswordRequired {
                        name: name.to_string(),
                    }
                }
            } else {
                Resume2WebError::CorruptDocument {
                    name: name.to_string(),
                    detail: err_str,
                }
            }
        })?;

    let pages = document.pages();
    let mut page_texts = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| Resume2WebError::CorruptDocument {
            name: name.to_string(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        let content = text.all();
        debug!("Page {}: {} chars", idx + 1, content.len());
        page_texts.push(content);
    }

    Ok(page_texts.join("\n"))
}

// ── DOCX ─────────────────────────────────────────────────────────────────

/// Read paragraph text from a DOCX package.
pub fn extract_docx(name: &str, bytes: &[u8]) -> Result<String, Resume2WebError> {
    let corrupt = |detail: String| Resume2WebError::CorruptDocument {
        name: name.to_string(),
        detail,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(format!("not a zip package: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .map_err(|e| corrupt(format!("{DOCX_BODY_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(format!("{DOCX_BODY_PART}: {e}")))?;

    let paragraphs = docx_paragraphs(&xml).map_err(corrupt)?;
    debug!("{}: {} paragraphs", name, paragraphs.len());
    Ok(paragraphs.join("\n"))
}

/// Collect the text of every `<w:p>` in document order.
///
/// Runs (`<w:t>`) are concatenated; `<w:tab/>` becomes a tab and
/// `<w:br/>`/`<w:cr/>` a newline. Only run content counts: tab stops and
/// other elements under `<w:pPr>`/`<w:rPr>` are layout, not text.
/// Paragraphs nested in text boxes are emitted before the paragraph that
/// contains them.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut run_depth = 0usize;
    let mut props_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => run_depth += 1,
                b"pPr" | b"rPr" => props_depth += 1,
                b"t" => in_text = run_depth > 0 && props_depth == 0,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                _ if run_depth == 0 || props_depth > 0 => {}
                b"tab" => {
                    if let Some(current) = open.last_mut() {
                        current.push('\t');
                    }
                }
                b"br" | b"cr" => {
                    if let Some(current) = open.last_mut() {
                        current.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"pPr" | b"rPr" => props_depth = props_depth.saturating_sub(1),
                b"p" => {
                    if let Some(done) = open.pop() {
                        paragraphs.push(done);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCX_BODY_PART, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_joined_with_newline() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Software </w:t></w:r><w:r><w:t>Engineer</w:t></w:r></w:p>",
        );
        assert_eq!(
            extract_docx("cv.docx", &bytes).unwrap(),
            "Jane Doe\nSoftware Engineer"
        );
    }

    #[test]
    fn tabs_breaks_entities_and_empty_paragraphs() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t><w:br/><w:t>C &amp; D</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t>E</w:t></w:r></w:p>",
        );
        assert_eq!(extract_docx("cv.docx", &bytes).unwrap(), "A\tB\nC & D\n\nE");
    }

    #[test]
    fn tab_stop_definitions_are_not_text() {
        let bytes = docx_with_body(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"right\" w:pos=\"9360\"/></w:tabs></w:pPr>\
             <w:r><w:t>Acme Corp</w:t></w:r><w:r><w:tab/></w:r><w:r><w:t>2020</w:t></w:r></w:p>\
             <w:p><w:pPr><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Skills</w:t></w:r></w:p>",
        );
        assert_eq!(
            extract_docx("cv.docx", &bytes).unwrap(),
            "Acme Corp\t2020\nSkills"
        );
    }

    #[test]
    fn table_cells_are_read_in_order() {
        let bytes = docx_with_body(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Rust</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>Go</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        assert_eq!(extract_docx("cv.docx", &bytes).unwrap(), "Rust\nGo");
    }

    #[test]
    fn docx_extraction_is_idempotent() {
        let bytes = docx_with_body("<w:p><w:r><w:t>Same</w:t></w:r></w:p>");
        let first = extract_docx("cv.docx", &bytes).unwrap();
        let second = extract_docx("cv.docx", &bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn docx_without_body_is_corrupt() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        assert!(matches!(
            extract_docx("cv.docx", &bytes),
            Err(Resume2WebError::CorruptDocument { .. })
        ));
    }

    #[tokio::test]
    async fn png_never_reaches_extraction() {
        let doc = UploadedDocument::from_bytes("me.png", "image/png", b"\x89PNG".to_vec());
        assert!(matches!(
            extract_text(&doc, None).await,
            Err(Resume2WebError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn declared_pdf_with_wrong_bytes_is_corrupt() {
        let doc = UploadedDocument::from_bytes("cv.pdf", "application/pdf", b"hello".to_vec());
        assert!(matches!(
            extract_text(&doc, None).await,
            Err(Resume2WebError::CorruptDocument { .. })
        ));
    }

    #[tokio::test]
    async fn docx_through_async_entry_point() {
        let bytes = docx_with_body("<w:p><w:r><w:t>Jane</w:t></w:r></w:p>");
        let doc = UploadedDocument::from_bytes(
            "cv.docx",
            crate::pipeline::input::DOCX_CONTENT_TYPE,
            bytes,
        );
        assert_eq!(extract_text(&doc, None).await.unwrap(), "Jane");
    }
}

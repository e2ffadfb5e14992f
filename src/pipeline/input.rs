//! Input resolution: turn a path, URL, or byte buffer into an
//! [`UploadedDocument`] with a declared content type.
//!
//! The declared type decides everything downstream. Only PDF and DOCX are
//! accepted; any other type is rejected by [`UploadedDocument::kind`] before
//! extraction is attempted.

use crate::error::Resume2WebError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const OCTET_STREAM: &str = "application/octet-stream";

/// Document kinds the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Map a declared content type to a kind.
    ///
    /// Parameters (`; charset=...`) and letter case are ignored.
    pub fn from_content_type(content_type: &str) -> Result<Self, Resume2WebError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_CONTENT_TYPE => Ok(DocumentKind::Pdf),
            DOCX_CONTENT_TYPE => Ok(DocumentKind::Docx),
            _ => Err(Resume2WebError::UnsupportedFormat {
                content_type: content_type.to_string(),
            }),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_CONTENT_TYPE,
            DocumentKind::Docx => DOCX_CONTENT_TYPE,
        }
    }
}

/// An uploaded document: raw bytes plus the type it claims to be.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// File name or URL, for messages only.
    pub name: String,
    /// Declared content type, as given by the uploader.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// The accepted kind, or `UnsupportedFormat`.
    pub fn kind(&self) -> Result<DocumentKind, Resume2WebError> {
        DocumentKind::from_content_type(&self.content_type)
    }
}

/// Guess a declared content type from a file name's extension.
pub fn content_type_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => PDF_CONTENT_TYPE,
        Some("docx") => DOCX_CONTENT_TYPE,
        Some("doc") => "application/msword",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        _ => OCTET_STREAM,
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a document from a local path or an HTTP(S) URL.
///
/// `content_type` overrides the declared type; otherwise it comes from the
/// file extension (paths) or the `Content-Type` header (URLs).
pub async fn load_document(
    input: &str,
    content_type: Option<&str>,
    timeout_secs: u64,
) -> Result<UploadedDocument, Resume2WebError> {
    if is_url(input) {
        download_url(input, content_type, timeout_secs).await
    } else {
        read_local(input, content_type).await
    }
}

async fn read_local(
    path_str: &str,
    content_type: Option<&str>,
) -> Result<UploadedDocument, Resume2WebError> {
    let path = PathBuf::from(path_str);
    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Resume2WebError::FileNotFound { path: path.clone() },
        std::io::ErrorKind::PermissionDenied => Resume2WebError::PermissionDenied { path: path.clone() },
        _ => Resume2WebError::ReadFailed {
            path: path.clone(),
            source: e,
        },
    })?;

    let declared = content_type
        .map(str::to_string)
        .unwrap_or_else(|| content_type_for_name(path_str).to_string());
    debug!(
        "Read {} ({} bytes, declared {})",
        path.display(),
        bytes.len(),
        declared
    );

    Ok(UploadedDocument::from_bytes(path_str, declared, bytes))
}

async fn download_url(
    url: &str,
    content_type: Option<&str>,
    timeout_secs: u64,
) -> Result<UploadedDocument, Resume2WebError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Resume2WebError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Resume2WebError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Resume2WebError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Resume2WebError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let declared = match content_type {
        Some(ct) => ct.to_string(),
        None => declared_type_from_response(url, &response),
    };

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Resume2WebError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes ({})", bytes.len(), declared);
    Ok(UploadedDocument::from_bytes(url, declared, bytes.to_vec()))
}

/// Prefer the server's `Content-Type` unless it is the generic octet-stream.
fn declared_type_from_response(url: &str, response: &reqwest::Response) -> String {
    let header = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match header {
        Some(ct) if !ct.starts_with(OCTET_STREAM) => ct,
        _ => {
            let path = reqwest::Url::parse(url)
                .map(|u| u.path().to_string())
                .unwrap_or_default();
            content_type_for_name(&path).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/cv.pdf"));
        assert!(is_url("http://example.com/cv.docx"));
        assert!(!is_url("/tmp/cv.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn accepts_pdf_and_docx() {
        assert_eq!(
            DocumentKind::from_content_type("application/pdf").unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::from_content_type(DOCX_CONTENT_TYPE).unwrap(),
            DocumentKind::Docx
        );
        assert_eq!(
            DocumentKind::from_content_type("Application/PDF; name=cv.pdf").unwrap(),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn rejects_png_upload() {
        let doc = UploadedDocument::from_bytes("me.png", "image/png", vec![0x89, b'P', b'N', b'G']);
        match doc.kind() {
            Err(Resume2WebError::UnsupportedFormat { content_type }) => {
                assert_eq!(content_type, "image/png")
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(content_type_for_name("Resume.PDF"), PDF_CONTENT_TYPE);
        assert_eq!(content_type_for_name("cv.docx"), DOCX_CONTENT_TYPE);
        assert_eq!(content_type_for_name("cv.doc"), "application/msword");
        assert_eq!(content_type_for_name("photo.png"), "image/png");
        assert_eq!(content_type_for_name("noext"), OCTET_STREAM);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = load_document("/definitely/not/here.pdf", None, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Resume2WebError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn directory_is_a_read_failure_not_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path().to_str().unwrap(), None, 5)
            .await
            .unwrap_err();
        assert!(
            matches!(err, Resume2WebError::ReadFailed { .. }),
            "got {err:?}"
        );
        assert!(err.to_string().starts_with("Cannot read"));
    }

    #[tokio::test]
    async fn override_wins_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.bin");
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        let doc = load_document(path.to_str().unwrap(), Some(PDF_CONTENT_TYPE), 5)
            .await
            .unwrap();
        assert_eq!(doc.kind().unwrap(), DocumentKind::Pdf);
        assert_eq!(doc.bytes, b"%PDF-1.7");
    }
}

//! Error types for the resume2web library.
//!
//! Every public operation returns `Result<T, Resume2WebError>`. A failure
//! aborts only the current generation request; none of the variants is
//! meant to bring down the hosting process. Callers that run a loop (the
//! interactive CLI, a web handler) report the error and go back to
//! collecting input.
//!
//! The four kinds the pipeline itself produces are:
//!
//! * [`Resume2WebError::EmptyInput`]: nothing to send to the model.
//! * [`Resume2WebError::UnsupportedFormat`]: upload is neither PDF nor DOCX.
//! * [`Resume2WebError::RemoteGenerationFailure`]: the model call failed;
//!   never retried or classified further.
//! * [`Resume2WebError::MalformedOutput`]: one or more marker blocks are
//!   missing; the raw response is carried along for manual inspection.
//!
//! The rest describe the environment around those steps (files, network,
//! pdfium, provider setup, output directory).

use crate::pipeline::parse::BlockLabel;
use crate::prompts::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the resume2web library.
#[derive(Debug, Error)]
pub enum Resume2WebError {
    // ── Request errors ────────────────────────────────────────────────────
    /// No prompt text and no extractable document content.
    #[error("Nothing to generate from: the input is empty.\nUpload a resume or enter a prompt first.")]
    EmptyInput,

    /// The uploaded document's declared type is neither PDF nor DOCX.
    #[error("Unsupported file type '{content_type}'.\nPlease upload a PDF or DOCX file.")]
    UnsupportedFormat { content_type: String },

    /// The model call failed (network, auth, quota, bad request).
    #[error("Model call failed during {phase}: {message}")]
    RemoteGenerationFailure { phase: Phase, message: String },

    /// The model response lacks one or more of the expected marker blocks.
    ///
    /// `raw` is the unmodified response so the user can inspect it.
    #[error("Model response is missing the {} block(s); nothing was written.", join_labels(.missing))]
    MalformedOutput {
        missing: Vec<BlockLabel>,
        raw: String,
    },

    /// The specification phase returned no text.
    #[error("The model returned an empty specification for this resume.")]
    EmptySpecification,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but could not be read (a directory, an I/O fault).
    #[error("Cannot read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Document errors ───────────────────────────────────────────────────
    /// The document could not be parsed as its declared kind.
    #[error("Document '{name}' could not be read: {detail}")]
    CorruptDocument { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first use.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM setup ─────────────────────────────────────────────────────────
    /// The configured provider could not be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write one of the site files.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not build the website archive.
    #[error("Failed to package '{path}': {detail}")]
    ArchiveFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Resume2WebError {
    /// True when the user can fix the request and simply try again.
    ///
    /// Every variant aborts only the current request; this separates
    /// "change your input" from "fix your environment".
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Resume2WebError::EmptyInput
                | Resume2WebError::UnsupportedFormat { .. }
                | Resume2WebError::MalformedOutput { .. }
                | Resume2WebError::EmptySpecification
                | Resume2WebError::FileNotFound { .. }
                | Resume2WebError::ReadFailed { .. }
                | Resume2WebError::CorruptDocument { .. }
                | Resume2WebError::PasswordRequired { .. }
                | Resume2WebError::WrongPassword { .. }
        )
    }

    /// The raw model response, when the error carries one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Resume2WebError::MalformedOutput { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

fn join_labels(labels: &[BlockLabel]) -> String {
    labels
        .iter()
        .map(|l| l.marker())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_output_lists_missing_markers() {
        let e = Resume2WebError::MalformedOutput {
            missing: vec![BlockLabel::Css, BlockLabel::Js],
            raw: "--html--<p>hi</p>--html--".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("--css--"), "got: {msg}");
        assert!(msg.contains("--js--"), "got: {msg}");
        assert_eq!(e.raw_response(), Some("--html--<p>hi</p>--html--"));
    }

    #[test]
    fn unsupported_format_display() {
        let e = Resume2WebError::UnsupportedFormat {
            content_type: "image/png".into(),
        };
        assert!(e.to_string().contains("image/png"));
        assert!(e.to_string().contains("PDF or DOCX"));
    }

    #[test]
    fn remote_failure_names_phase() {
        let e = Resume2WebError::RemoteGenerationFailure {
            phase: Phase::ResumeToSpecification,
            message: "401 unauthorized".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("resume → specification"), "got: {msg}");
        assert!(msg.contains("401"));
    }

    #[test]
    fn recoverable_classification() {
        assert!(Resume2WebError::EmptyInput.is_recoverable());
        assert!(Resume2WebError::MalformedOutput {
            missing: vec![BlockLabel::Html],
            raw: String::new(),
        }
        .is_recoverable());
        assert!(!Resume2WebError::RemoteGenerationFailure {
            phase: Phase::Direct,
            message: "quota".into(),
        }
        .is_recoverable());
        assert!(!Resume2WebError::Internal("boom".into()).is_recoverable());
    }

    #[test]
    fn raw_response_absent_for_other_errors() {
        assert!(Resume2WebError::EmptyInput.raw_response().is_none());
    }
}

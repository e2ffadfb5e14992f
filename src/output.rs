//! Request-scoped data: the input payload, the generated site, and the
//! result handed back to callers.

use crate::error::Resume2WebError;
use crate::pipeline::package::PersistedSite;
use serde::{Deserialize, Serialize};

/// Non-empty text sent to the first model call of a request.
///
/// Built once, from the prompt box or from extracted document text, and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPayload(String);

impl InputPayload {
    /// Rejects empty and whitespace-only text with [`Resume2WebError::EmptyInput`].
    pub fn new(text: impl Into<String>) -> Result<Self, Resume2WebError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Resume2WebError::EmptyInput);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The three site artefacts. All fields are non-empty by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteBundle {
    html: String,
    css: String,
    js: String,
}

impl SiteBundle {
    /// `None` if any artefact is empty or whitespace-only.
    pub fn new(html: String, css: String, js: String) -> Option<Self> {
        if [&html, &css, &js].iter().any(|s| s.trim().is_empty()) {
            return None;
        }
        Some(Self { html, css, js })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn js(&self) -> &str {
        &self.js
    }
}

/// Timing and token usage for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Number of model calls made (1 or 2).
    pub model_calls: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Characters of extracted document text; 0 for prompt input.
    pub extracted_chars: usize,
    pub specification_duration_ms: u64,
    pub website_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything one successful request produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub bundle: SiteBundle,
    /// Two-phase flow only: the specification the site was generated from.
    pub specification: Option<String>,
    /// Unparsed text of the final model call.
    pub raw_response: String,
    /// Files written, when the request persisted its output.
    pub files: Option<PersistedSite>,
    pub stats: GenerationStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_payload_is_empty_input() {
        for text in ["", "   ", "\n\t \r\n"] {
            assert!(matches!(
                InputPayload::new(text),
                Err(Resume2WebError::EmptyInput)
            ));
        }
    }

    #[test]
    fn payload_keeps_original_text() {
        let p = InputPayload::new("  Jane Doe \n").unwrap();
        assert_eq!(p.as_str(), "  Jane Doe \n");
    }

    #[test]
    fn bundle_rejects_blank_artefacts() {
        assert!(SiteBundle::new("<p/>".into(), " ".into(), "x()".into()).is_none());
        let ok = SiteBundle::new("<p/>".into(), "p{}".into(), "x()".into()).unwrap();
        assert_eq!(ok.css(), "p{}");
    }

    #[test]
    fn output_serialises_to_json() {
        let out = GenerationOutput {
            bundle: SiteBundle::new("h".into(), "c".into(), "j".into()).unwrap(),
            specification: Some("spec".into()),
            raw_response: "raw".into(),
            files: None,
            stats: GenerationStats::default(),
        };
        let json = serde_json::to_string(&out).expect("serialise");
        assert!(json.contains("\"specification\":\"spec\""));
        let back: GenerationOutput = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back.bundle, out.bundle);
    }
}

//! Configuration types for website generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The config is read-only for the
//! duration of a request; per-request state lives in the orchestrator.

use crate::error::Resume2WebError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model when Gemini is selected without an explicit model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Configuration for one or more generation requests.
///
/// # Example
/// ```rust
/// use resume2web::{Flow, GenerationConfig};
///
/// let config = GenerationConfig::builder()
///     .flow(Flow::OnePhase)
///     .model("gemini-2.5-flash")
///     .output_dir("site")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Which pipeline to run. Default: [`Flow::TwoPhase`].
    pub flow: Flow,

    /// LLM model identifier, e.g. "gemini-2.5-flash-lite", "gpt-4.1-mini".
    /// If None, uses a per-provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Site generation is a creative task; a moderate temperature gives varied
    /// layouts without drifting from the marker format.
    pub temperature: f32,

    /// Maximum tokens per model call. Default: 8192.
    ///
    /// A full page of HTML plus stylesheet and script routinely passes 4 000
    /// tokens; a truncated response loses its closing markers and fails to parse.
    pub max_tokens: usize,

    /// Replaces the built-in resume → specification instruction.
    pub specification_prompt: Option<String>,

    /// Replaces the built-in website instruction of the active flow.
    ///
    /// Must ask for the same marker format or every response is malformed.
    pub website_prompt: Option<String>,

    /// Directory receiving `index.html`, `style.css`, `script.js`, `website.zip`. Default: `.`.
    pub output_dir: PathBuf,

    /// Strip stray Markdown fences and invisible characters from parsed blocks. Default: true.
    pub clean_blocks: bool,

    /// PDF user password for encrypted resumes.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Stage events, including the intermediate specification.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            flow: Flow::default(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.7,
            max_tokens: 8192,
            specification_prompt: None,
            website_prompt: None,
            output_dir: PathBuf::from("."),
            clean_blocks: true,
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("flow", &self.flow)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("specification_prompt", &self.specification_prompt.is_some())
            .field("website_prompt", &self.website_prompt.is_some())
            .field("output_dir", &self.output_dir)
            .field("clean_blocks", &self.clean_blocks)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn flow(mut self, flow: Flow) -> Self {
        self.config.flow = flow;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn specification_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.specification_prompt = Some(prompt.into());
        self
    }

    pub fn website_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.website_prompt = Some(prompt.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn clean_blocks(mut self, v: bool) -> Self {
        self.config.clean_blocks = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Resume2WebError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(Resume2WebError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(Resume2WebError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        for (name, prompt) in [
            ("specification prompt", &c.specification_prompt),
            ("website prompt", &c.website_prompt),
        ] {
            if prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(Resume2WebError::InvalidConfig(format!(
                    "{name} override is empty"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which generation pipeline to run.
///
/// | Flow | Model calls |
/// |------|-------------|
/// | `OnePhase` | input → site code |
/// | `TwoPhase` | resume → specification → site code (prompt input skips the first call) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flow {
    OnePhase,
    #[default]
    TwoPhase,
}

/// Default model for a named provider.
pub fn default_model_for(provider: &str) -> &'static str {
    match provider.to_ascii_lowercase().as_str() {
        "gemini" | "google" | "vertexai" => DEFAULT_GEMINI_MODEL,
        "anthropic" => "claude-sonnet-4-20250514",
        "ollama" => "llama3.2",
        "mistral" => "mistral-small-latest",
        _ => "gpt-4.1-mini",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = GenerationConfig::default();
        assert_eq!(c.flow, Flow::TwoPhase);
        assert_eq!(c.max_tokens, 8192);
        assert!(c.clean_blocks);
        assert_eq!(c.output_dir, PathBuf::from("."));
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = GenerationConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_tokens() {
        let err = GenerationConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, Resume2WebError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_blank_prompt_override() {
        let err = GenerationConfig::builder()
            .website_prompt("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("website prompt"));
    }

    #[test]
    fn debug_redacts_password() {
        let c = GenerationConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn provider_default_models() {
        assert_eq!(default_model_for("gemini"), DEFAULT_GEMINI_MODEL);
        assert_eq!(default_model_for("OpenAI"), "gpt-4.1-mini");
    }
}

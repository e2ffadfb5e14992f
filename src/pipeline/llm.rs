//! Model interaction: send a conversation, get text back.
//!
//! [`GenerationClient`] is the single seam between the pipeline and any
//! remote model. One call is one blocking round trip: no retries, no
//! timeout, no streaming. A failure is handed back as
//! [`Resume2WebError::RemoteGenerationFailure`] with the provider's message
//! untouched; timeout and cancellation belong to whoever hosts the
//! pipeline.

use crate::config::{default_model_for, GenerationConfig, DEFAULT_GEMINI_MODEL};
use crate::error::Resume2WebError;
use crate::prompts::{Conversation, Role};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, GeminiProvider, LLMProvider, ProviderFactory};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

/// Text returned by one model call, with usage figures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Anything that can turn a conversation into text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Human-readable backend name for logging.
    fn name(&self) -> &str;

    /// Perform exactly one model call.
    async fn generate(&self, conversation: &Conversation) -> Result<Generation, Resume2WebError>;
}

// ── Remote client ────────────────────────────────────────────────────────

/// [`GenerationClient`] backed by an `edgequake-llm` provider.
pub struct LlmClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        let label = match (&config.provider_name, &config.model) {
            (Some(p), Some(m)) => format!("{p}/{m}"),
            (Some(p), None) => p.clone(),
            (None, Some(m)) => m.clone(),
            (None, None) => "auto".to_string(),
        };
        Self {
            provider,
            label,
            options: build_options(config),
        }
    }

    /// Resolve the provider from `config` and the environment.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, Resume2WebError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl GenerationClient for LlmClient {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(&self, conversation: &Conversation) -> Result<Generation, Resume2WebError> {
        let start = Instant::now();
        let messages = to_chat_messages(conversation);

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| Resume2WebError::RemoteGenerationFailure {
                phase: conversation.phase,
                message: e.to_string(),
            })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "{}: {} input tokens, {} output tokens, {}ms",
            conversation.phase, response.prompt_tokens, response.completion_tokens, duration_ms
        );

        Ok(Generation {
            text: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
            duration_ms,
        })
    }
}

fn to_chat_messages(conversation: &Conversation) -> Vec<ChatMessage> {
    conversation
        .messages
        .iter()
        .map(|m| match m.role {
            Role::System => ChatMessage::system(m.content.as_str()),
            Role::User => ChatMessage::user(m.content.as_str()),
        })
        .collect()
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or the
///    provider's default model; the API key comes from that provider's
///    environment variable.
/// 3. **Environment pair** (`RESUME2WEB_PROVIDER` + `RESUME2WEB_MODEL`).
/// 4. **Gemini key present** (`GEMINI_API_KEY`, or the older `gemini`
///    entry some `.env` files carry): Gemini with `config.model` or
///    `gemini-2.5-flash-lite`.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// A missing key is not checked here beyond what the factory does; it
/// usually surfaces as an authentication failure on the first call.
pub fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, Resume2WebError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config
            .model
            .as_deref()
            .unwrap_or_else(|| default_model_for(name));
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("RESUME2WEB_PROVIDER"),
        std::env::var("RESUME2WEB_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let env = |name: &str| std::env::var(name).ok();
    if env("GEMINI_API_KEY").is_some_and(|k| !k.is_empty()) || gemini_key_alias(env).is_some() {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        return create_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Resume2WebError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Key from a `gemini=` entry, used only when `GEMINI_API_KEY` is unset.
fn gemini_key_alias(var: impl Fn(&str) -> Option<String>) -> Option<String> {
    let set = |name: &str| var(name).filter(|v| !v.trim().is_empty());
    if set("GEMINI_API_KEY").is_some() {
        return None;
    }
    set("gemini")
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Resume2WebError> {
    info!("Using provider '{}' with model '{}'", provider_name, model);
    if matches!(provider_name, "gemini" | "google") {
        if let Some(key) = gemini_key_alias(|name| std::env::var(name).ok()) {
            debug!("GEMINI_API_KEY unset, using the `gemini` entry");
            return Ok(Arc::new(GeminiProvider::new(key).with_model(model)));
        }
    }
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Resume2WebError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

// ── Scripted client ──────────────────────────────────────────────────────

/// Offline [`GenerationClient`] that replays queued responses in order and
/// records every conversation it receives.
///
/// Useful for tests and for re-running the parser over saved responses.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, String>>>,
    received: Mutex<Vec<Conversation>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn respond(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queue a failed call with the given provider message.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    fn push(self, item: Result<String, String>) -> Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(item);
        }
        self
    }

    /// Every conversation received so far, in call order.
    pub fn conversations(&self) -> Vec<Conversation> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, conversation: &Conversation) -> Result<Generation, Resume2WebError> {
        self.received
            .lock()
            .map_err(|_| Resume2WebError::Internal("scripted client lock poisoned".into()))?
            .push(conversation.clone());

        let next = self
            .responses
            .lock()
            .map_err(|_| Resume2WebError::Internal("scripted client lock poisoned".into()))?
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(Generation {
                input_tokens: conversation.messages.iter().map(|m| m.content.len()).sum(),
                output_tokens: text.len(),
                text,
                duration_ms: 0,
            }),
            Some(Err(message)) => Err(Resume2WebError::RemoteGenerationFailure {
                phase: conversation.phase,
                message,
            }),
            None => Err(Resume2WebError::RemoteGenerationFailure {
                phase: conversation.phase,
                message: "no scripted response left".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{build_conversation, Phase};

    #[test]
    fn build_options_defaults() {
        let config = GenerationConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn chat_messages_keep_order() {
        let conv = build_conversation(Phase::Direct, "hello", Some("sys"));
        assert_eq!(to_chat_messages(&conv).len(), 2);
    }

    #[test]
    fn gemini_alias_only_fills_a_missing_key() {
        fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
            move |name: &str| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| v.to_string())
            }
        }

        assert_eq!(
            gemini_key_alias(vars(&[("gemini", "legacy-key")])),
            Some("legacy-key".to_string())
        );
        assert_eq!(
            gemini_key_alias(vars(&[("gemini", "legacy-key"), ("GEMINI_API_KEY", "new-key")])),
            None
        );
        assert_eq!(gemini_key_alias(vars(&[("gemini", "  ")])), None);
        assert_eq!(gemini_key_alias(vars(&[])), None);
    }

    #[tokio::test]
    async fn scripted_client_replays_in_order() {
        let client = ScriptedClient::new().respond("one").fail("quota exceeded");
        let conv = build_conversation(Phase::ResumeToSpecification, "cv", None);

        let first = client.generate(&conv).await.unwrap();
        assert_eq!(first.text, "one");

        match client.generate(&conv).await {
            Err(Resume2WebError::RemoteGenerationFailure { phase, message }) => {
                assert_eq!(phase, Phase::ResumeToSpecification);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.conversations()[0].user_turn(), "cv");
    }

    #[tokio::test]
    async fn poisoned_queue_is_an_internal_error() {
        let client = ScriptedClient::new().respond("unused");
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = client.responses.lock().unwrap();
            panic!("poison the response queue");
        }));

        let conv = build_conversation(Phase::Direct, "x", None);
        assert!(matches!(
            client.generate(&conv).await,
            Err(Resume2WebError::Internal(_))
        ));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn scripted_client_runs_dry() {
        let client = ScriptedClient::new();
        let conv = build_conversation(Phase::Direct, "x", None);
        assert!(client.generate(&conv).await.is_err());
    }
}

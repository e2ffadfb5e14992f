//! Pipeline orchestrator: sequences extraction, model calls, parsing and
//! packaging for one generation request.
//!
//! ## States
//!
//! ```text
//! one-phase:  Collecting ─▶ Generating ─▶ Parsing ─▶ Persisting ─▶ Done
//! two-phase:  Collecting ─▶ Specifying ─▶ Generating ─▶ Parsing ─▶ Persisting ─▶ Done
//! ```
//!
//! `Specifying` runs only for document input. Prompt input in the two-phase
//! flow is itself the specification and goes straight to `Generating`.
//!
//! Every piece of per-request state (payload, specification, stats) lives in
//! a [`RequestContext`] created on entry and dropped on return. Two
//! concurrent requests share nothing but the output directory.

use crate::config::{Flow, GenerationConfig};
use crate::error::Resume2WebError;
use crate::output::{GenerationOutput, GenerationStats, InputPayload, SiteBundle};
use crate::pipeline::input::{self, UploadedDocument};
use crate::pipeline::llm::{Generation, GenerationClient, LlmClient};
use crate::pipeline::package::{self, PersistedSite};
use crate::pipeline::{extract, parse, postprocess};
use crate::progress::{GenerationProgressCallback, Stage};
use crate::prompts::{build_conversation, Phase};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the requester handed in.
#[derive(Debug, Clone)]
pub enum GenerationInput {
    /// Free-form prompt or pasted resume text.
    Prompt(String),
    /// Uploaded resume document.
    Document(UploadedDocument),
}

impl GenerationInput {
    pub fn prompt(text: impl Into<String>) -> Self {
        GenerationInput::Prompt(text.into())
    }

    pub fn document(document: UploadedDocument) -> Self {
        GenerationInput::Document(document)
    }

    /// Interpret a line of user input.
    ///
    /// URLs and paths of existing files are loaded as documents; anything
    /// else is prompt text.
    pub async fn resolve(
        line: &str,
        content_type: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, Resume2WebError> {
        let trimmed = line.trim();
        if input::is_url(trimmed) || (!trimmed.is_empty() && Path::new(trimmed).is_file()) {
            let document = input::load_document(trimmed, content_type, timeout_secs).await?;
            Ok(GenerationInput::Document(document))
        } else {
            Ok(GenerationInput::Prompt(line.to_string()))
        }
    }
}

/// Where the payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputSource {
    Prompt,
    Document,
}

/// State owned by one request, from `Collecting` to `Done`.
struct RequestContext<'a> {
    source: InputSource,
    payload: InputPayload,
    specification: Option<String>,
    stats: GenerationStats,
    started: Instant,
    config: &'a GenerationConfig,
}

impl RequestContext<'_> {
    fn notify(&self, f: impl FnOnce(&dyn GenerationProgressCallback)) {
        if let Some(ref cb) = self.config.progress_callback {
            f(cb.as_ref());
        }
    }

    fn enter(&self, stage: Stage) {
        debug!("Stage: {}", stage);
        self.notify(|cb| cb.on_stage(stage));
    }

    /// One model call, with stats and progress bookkeeping.
    async fn call(
        &mut self,
        client: &dyn GenerationClient,
        phase: Phase,
        body: &str,
        instruction: Option<&str>,
    ) -> Result<Generation, Resume2WebError> {
        let conversation = build_conversation(phase, body, instruction);
        debug!(
            "Calling {} for {} ({} chars of input)",
            client.name(),
            phase,
            body.chars().count()
        );

        let generation = client.generate(&conversation).await?;

        self.stats.model_calls += 1;
        self.stats.input_tokens += generation.input_tokens as u64;
        self.stats.output_tokens += generation.output_tokens as u64;
        match phase {
            Phase::ResumeToSpecification => self.stats.specification_duration_ms = generation.duration_ms,
            Phase::Direct | Phase::SpecificationToWebsite => {
                self.stats.website_duration_ms = generation.duration_ms
            }
        }
        let chars = generation.text.chars().count();
        self.notify(|cb| cb.on_model_response(phase, chars, generation.duration_ms));
        Ok(generation)
    }
}

/// Generate a website and write it to `config.output_dir`.
///
/// This is the primary entry point for the library. The model client is
/// resolved from `config` only after the input has been collected, so empty
/// input never touches credentials or the network.
///
/// # Errors
/// Any [`Resume2WebError`]; each aborts only this request and nothing
/// partial is written.
///
/// # Example
/// ```rust,no_run
/// use resume2web::{generate, GenerationConfig, GenerationInput};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GenerationConfig::builder().output_dir("site").build()?;
/// let output = generate(GenerationInput::prompt("A landing page for a bakery"), &config).await?;
/// println!("{}", output.bundle.html());
/// # Ok(())
/// # }
/// ```
pub async fn generate(
    input: GenerationInput,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Resume2WebError> {
    let ctx = collect(input, config).await?;
    let client = LlmClient::from_config(config)?;
    run(ctx, &client, true).await
}

/// Same flow as [`generate`], stopping after `Parsing`. Nothing is written.
pub async fn generate_bundle(
    input: GenerationInput,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Resume2WebError> {
    let ctx = collect(input, config).await?;
    let client = LlmClient::from_config(config)?;
    run(ctx, &client, false).await
}

/// Run the flow against a caller-supplied client.
///
/// `persist` selects whether the `Persisting` state writes the site files.
pub async fn generate_with_client(
    input: GenerationInput,
    client: &dyn GenerationClient,
    config: &GenerationConfig,
    persist: bool,
) -> Result<GenerationOutput, Resume2WebError> {
    let ctx = collect(input, config).await?;
    run(ctx, client, persist).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input: GenerationInput,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Resume2WebError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Resume2WebError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input, config))
}

// ── States ───────────────────────────────────────────────────────────────

/// `Collecting`: turn the input into a non-empty payload.
async fn collect(
    input: GenerationInput,
    config: &GenerationConfig,
) -> Result<RequestContext<'_>, Resume2WebError> {
    let started = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage(Stage::Collecting);
    }

    let mut stats = GenerationStats::default();
    let (source, payload) = match input {
        GenerationInput::Prompt(text) => {
            info!("Starting generation from prompt ({} chars)", text.chars().count());
            (InputSource::Prompt, InputPayload::new(text)?)
        }
        GenerationInput::Document(document) => {
            info!(
                "Starting generation from {} ({})",
                document.name, document.content_type
            );
            // Rejected types never reach extraction.
            document.kind()?;
            let text = extract::extract_text(&document, config.password.as_deref()).await?;
            stats.extracted_chars = text.chars().count();
            (InputSource::Document, InputPayload::new(text)?)
        }
    };

    Ok(RequestContext {
        source,
        payload,
        specification: None,
        stats,
        started,
        config,
    })
}

/// Everything after `Collecting`.
async fn run(
    mut ctx: RequestContext<'_>,
    client: &dyn GenerationClient,
    persist: bool,
) -> Result<GenerationOutput, Resume2WebError> {
    let config = ctx.config;

    // ── Specifying (two-phase only) ──────────────────────────────────────
    let phase = match config.flow {
        Flow::OnePhase => Phase::Direct,
        Flow::TwoPhase => {
            let specification = match ctx.source {
                InputSource::Document => {
                    ctx.enter(Stage::Specifying);
                    let body = ctx.payload.as_str().to_string();
                    let generation = ctx
                        .call(
                            client,
                            Phase::ResumeToSpecification,
                            &body,
                            config.specification_prompt.as_deref(),
                        )
                        .await?;
                    let specification = generation.text.trim().to_string();
                    if specification.is_empty() {
                        return Err(Resume2WebError::EmptySpecification);
                    }
                    info!("Specification ready ({} chars)", specification.chars().count());
                    ctx.notify(|cb| cb.on_specification(&specification));
                    specification
                }
                InputSource::Prompt => ctx.payload.as_str().to_string(),
            };
            ctx.specification = Some(specification);
            Phase::SpecificationToWebsite
        }
    };

    // ── Generating ───────────────────────────────────────────────────────
    ctx.enter(Stage::Generating);
    let body = match ctx.specification {
        Some(ref spec) => spec.clone(),
        None => ctx.payload.as_str().to_string(),
    };
    let generation = ctx
        .call(client, phase, &body, config.website_prompt.as_deref())
        .await?;

    // ── Parsing ──────────────────────────────────────────────────────────
    ctx.enter(Stage::Parsing);
    let bundle = parse_response(&generation.text, phase, config.clean_blocks)?;

    // ── Persisting ───────────────────────────────────────────────────────
    let files = if persist {
        ctx.enter(Stage::Persisting);
        let files = package::persist_bundle(&bundle, &config.output_dir).await?;
        ctx.notify(|cb| cb.on_persisted(&files));
        Some(files)
    } else {
        None
    };

    // ── Done ─────────────────────────────────────────────────────────────
    ctx.stats.total_duration_ms = ctx.started.elapsed().as_millis() as u64;
    ctx.enter(Stage::Done);
    info!(
        "Generation complete: {} model call(s), {} in / {} out tokens, {}ms",
        ctx.stats.model_calls,
        ctx.stats.input_tokens,
        ctx.stats.output_tokens,
        ctx.stats.total_duration_ms
    );

    Ok(finish(ctx, bundle, generation.text, files))
}

fn finish(
    ctx: RequestContext<'_>,
    bundle: SiteBundle,
    raw_response: String,
    files: Option<PersistedSite>,
) -> GenerationOutput {
    GenerationOutput {
        bundle,
        specification: ctx.specification,
        raw_response,
        files,
        stats: ctx.stats,
    }
}

/// Parse a site response into a bundle, or fail with `MalformedOutput`.
fn parse_response(
    raw: &str,
    phase: Phase,
    clean: bool,
) -> Result<SiteBundle, Resume2WebError> {
    let label = phase.script_label().ok_or_else(|| {
        Resume2WebError::Internal(format!("{phase} does not produce site code"))
    })?;

    let mut parsed = parse::parse_site(raw, label);
    if clean {
        parsed = parsed.map_found(postprocess::clean_block);
    }

    parsed.into_bundle().map_err(|missing| {
        warn!(
            "Malformed model output: missing {:?} ({} chars)",
            missing,
            raw.chars().count()
        );
        Resume2WebError::MalformedOutput {
            missing,
            raw: raw.to_string(),
        }
    })
}

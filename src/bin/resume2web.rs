//! CLI binary for resume2web.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, runs one request (or an interactive session of
//! requests) and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use resume2web::{
    generate, DocumentKind, Flow, GenerationConfig, GenerationInput, GenerationOutput,
    GenerationProgressCallback, PersistedSite, Phase, ProgressCallback, Resume2WebError, Stage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the current stage, one log
/// line per model call, and the specification printed in full as soon as it
/// arrives. One instance serves one request.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// `spinner = false` keeps the specification and per-call lines but
    /// hides the animated spinner.
    fn new(spinner: bool) -> Arc<Self> {
        if !spinner {
            return Arc::new(Self {
                bar: ProgressBar::hidden(),
            });
        }
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("resume2web");
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        match stage {
            Stage::Done => self.bar.finish_and_clear(),
            _ => self.bar.set_message(format!("{stage}…")),
        }
    }

    fn on_specification(&self, specification: &str) {
        // A hidden bar runs the closure directly.
        self.bar.suspend(|| {
            eprintln!("{} {}", cyan("◆"), bold("Site specification"));
            eprintln!("{}", dim(&"─".repeat(60)));
            eprintln!("{specification}");
            eprintln!("{}", dim(&"─".repeat(60)));
        });
    }

    fn on_model_response(&self, phase: Phase, chars: usize, duration_ms: u64) {
        self.bar.suspend(|| eprintln!(
            "  {} {:<26}  {:<12}  {}",
            green("✓"),
            phase.to_string(),
            dim(&format!("{chars:>6} chars")),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
        ));
    }

    fn on_persisted(&self, files: &PersistedSite) {
        self.bar
            .set_message(format!("wrote {}", files.archive.display()));
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        // Failed requests never reach `Done`.
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Two-phase: resume → specification → website (default)
  resume2web resume.pdf

  # One-phase: straight to site code
  resume2web --flow one-phase resume.docx -o site/

  # From a prompt instead of a document
  resume2web --prompt "Portfolio for a wedding photographer in Lisbon"

  # Resume hosted online
  resume2web https://example.com/cv.pdf

  # Interactive session: paste paths, URLs or prompts line by line
  resume2web --interactive

  # Machine-readable output
  resume2web --json resume.pdf > result.json

OUTPUT:
  index.html, style.css, script.js and website.zip are written to the output
  directory (default: current directory). Each request overwrites all four.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  gemini                  Older name for the Gemini key; read only when
                          GEMINI_API_KEY is unset
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  RESUME2WEB_PROVIDER     Override provider (gemini, openai, anthropic, ollama)
  RESUME2WEB_MODEL        Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download

  A .env file in the working directory is loaded before flags are parsed.
"#;

/// Generate a static website from a resume or a prompt.
#[derive(Parser, Debug)]
#[command(
    name = "resume2web",
    version,
    about = "Generate a static website (HTML/CSS/JS) from a resume or a prompt",
    long_about = "Generate a personal website from a resume (PDF or DOCX, local file or URL) \
or from a free-form prompt, using a hosted language model. The two-phase flow first writes a \
site specification from the resume, then builds the site from that specification.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Resume file path (PDF/DOCX) or HTTP/HTTPS URL.
    #[arg(conflicts_with_all = ["prompt", "interactive"])]
    input: Option<String>,

    /// Free-form prompt or pasted resume text instead of a document.
    #[arg(short, long, conflicts_with = "interactive")]
    prompt: Option<String>,

    /// Read inputs line by line until `quit`, `exit` or EOF.
    #[arg(short, long)]
    interactive: bool,

    /// Generation flow.
    #[arg(long, env = "RESUME2WEB_FLOW", value_enum, default_value = "two-phase")]
    flow: FlowArg,

    /// Declared content type of the document, overriding extension/header detection.
    #[arg(long)]
    content_type: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, mistral.
    #[arg(
        long,
        env = "RESUME2WEB_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Gemini (gemini-2.5-flash-lite) is used whenever GEMINI_API_KEY is present."
    )]
    provider: Option<String>,

    /// LLM model ID (e.g. gemini-2.5-flash-lite, gpt-4.1-mini).
    #[arg(long, env = "RESUME2WEB_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RESUME2WEB_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "RESUME2WEB_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// PDF user password for encrypted resumes.
    #[arg(long, env = "RESUME2WEB_PASSWORD")]
    password: Option<String>,

    /// Directory for index.html, style.css, script.js and website.zip.
    #[arg(short, long, env = "RESUME2WEB_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Text file replacing the built-in resume → specification instruction.
    #[arg(long, env = "RESUME2WEB_SPECIFICATION_PROMPT")]
    specification_prompt: Option<PathBuf>,

    /// Text file replacing the built-in website instruction.
    #[arg(long, env = "RESUME2WEB_WEBSITE_PROMPT")]
    website_prompt: Option<PathBuf>,

    /// Keep parsed blocks exactly as the model returned them.
    #[arg(long, env = "RESUME2WEB_NO_CLEAN")]
    no_clean: bool,

    /// Output structured JSON (GenerationOutput) on stdout.
    #[arg(long, env = "RESUME2WEB_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "RESUME2WEB_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RESUME2WEB_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RESUME2WEB_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RESUME2WEB_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FlowArg {
    OnePhase,
    TwoPhase,
}

impl From<FlowArg> for Flow {
    fn from(v: FlowArg) -> Self {
        match v {
            FlowArg::OnePhase => Flow::OnePhase,
            FlowArg::TwoPhase => Flow::TwoPhase,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so `env = ...` fallbacks see .env values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;

    if cli.interactive {
        return interactive(&cli, &config).await;
    }

    let input = match (&cli.prompt, &cli.input) {
        (Some(prompt), _) => GenerationInput::prompt(prompt.clone()),
        (None, Some(path)) => {
            let document = resume2web::load_document(
                path,
                cli.content_type.as_deref(),
                cli.download_timeout,
            )
            .await
            .context("Failed to load document")?;
            GenerationInput::document(document)
        }
        (None, None) => anyhow::bail!("Provide a resume file, a URL, --prompt, or --interactive"),
    };

    match run_request(&cli, &config, input).await {
        Ok(output) => print_output(&cli, &output),
        Err(e) => {
            report_error(&e);
            std::process::exit(1);
        }
    }
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(cli: &Cli) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .flow(cli.flow.into())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .output_dir(cli.output_dir.clone())
        .clean_blocks(!cli.no_clean)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(ref path) = cli.specification_prompt {
        builder = builder.specification_prompt(read_prompt_file(path).await?);
    }
    if let Some(ref path) = cli.website_prompt {
        builder = builder.website_prompt(read_prompt_file(path).await?);
    }

    builder.build().context("Invalid configuration")
}

async fn read_prompt_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read prompt from {:?}", path))
}

/// One request: make sure pdfium is present for PDFs, attach a fresh
/// spinner, then run the library flow.
async fn run_request(
    cli: &Cli,
    base: &GenerationConfig,
    input: GenerationInput,
) -> Result<GenerationOutput, Resume2WebError> {
    if let GenerationInput::Document(ref document) = input {
        if matches!(document.kind(), Ok(DocumentKind::Pdf)) {
            ensure_pdf_engine(cli.quiet)?;
        }
    }

    let mut config = base.clone();
    if !cli.quiet && !cli.json {
        config.progress_callback = Some(CliProgressCallback::new(!cli.no_progress) as ProgressCallback);
    }
    generate(input, &config).await
}

/// Download pdfium on first use (~30 MB), showing a byte progress bar.
///
/// Subsequent runs only check the cache path.
fn ensure_pdf_engine(quiet: bool) -> Result<(), Resume2WebError> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    let result = if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
    } else {
        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        dl_bar.set_prefix("PDF engine");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        // block_in_place keeps the borrowed progress closure valid without a
        // 'static bound.
        let result = tokio::task::block_in_place(|| {
            pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                if let Some(t) = total {
                    if bar.length().unwrap_or(0) != t {
                        bar.set_length(t);
                    }
                }
                bar.set_position(downloaded);
            }))
        });
        dl_bar.finish_and_clear();
        result
    };

    result
        .map(|_| ())
        .map_err(|e| Resume2WebError::PdfiumBindingFailed(e.to_string()))
}

/// The hosting loop: every failure aborts only the current request.
async fn interactive(cli: &Cli, config: &GenerationConfig) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stderr = tokio::io::stderr();

    eprintln!(
        "{} {}",
        cyan("◆"),
        bold("Enter a resume path or URL, or type a prompt. `quit` to exit.")
    );

    loop {
        stderr.write_all(b"> ").await.ok();
        stderr.flush().await.ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let trimmed = line.trim();
        if matches!(trimmed, "quit" | "exit") {
            break;
        }

        let input =
            match GenerationInput::resolve(&line, cli.content_type.as_deref(), cli.download_timeout)
                .await
            {
                Ok(input) => input,
                Err(e) => {
                    report_error(&e);
                    continue;
                }
            };

        match run_request(cli, config, input).await {
            Ok(output) => {
                if let Err(e) = print_output(cli, &output) {
                    eprintln!("{} {e:#}", red("✘"));
                }
            }
            Err(e) => report_error(&e),
        }
    }

    Ok(())
}

/// Print a request error; malformed output also dumps the raw response.
fn report_error(err: &Resume2WebError) {
    eprintln!("{} {}", red("✘"), err);
    if let Some(raw) = err.raw_response() {
        eprintln!("{}", dim(&"─".repeat(60)));
        eprintln!("{}", bold("Raw model response:"));
        eprintln!("{raw}");
        eprintln!("{}", dim(&"─".repeat(60)));
    }
    if err.is_recoverable() {
        eprintln!("{}", dim("Adjust the input and try again."));
    }
}

fn print_output(cli: &Cli, output: &GenerationOutput) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }

    if let Some(ref files) = output.files {
        eprintln!(
            "{}  website generated in {}ms  →  {}",
            green("✔"),
            output.stats.total_duration_ms,
            bold(&files.archive.display().to_string()),
        );
        for path in files.paths() {
            eprintln!("   {}", dim(&path.display().to_string()));
        }
    }
    eprintln!(
        "   {} model call(s)  {} tokens in  /  {} tokens out",
        output.stats.model_calls,
        dim(&output.stats.input_tokens.to_string()),
        dim(&output.stats.output_tokens.to_string()),
    );
    Ok(())
}

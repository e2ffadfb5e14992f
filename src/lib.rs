//! # resume2web
//!
//! Turn a resume (PDF, DOCX or pasted text) or a free-form prompt into a
//! static website (HTML, CSS, JavaScript) using a hosted language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! resume / prompt
//!  │
//!  ├─ 1. Collect   prompt text, or PDF/DOCX → plain text
//!  ├─ 2. Specify   two-phase only: resume → site specification (model call)
//!  ├─ 3. Generate  specification or prompt → marker-delimited code (model call)
//!  ├─ 4. Parse     --html-- / --css-- / --js-- blocks, all three required
//!  └─ 5. Persist   index.html, style.css, script.js + website.zip
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume2web::{generate, load_document, GenerationConfig, GenerationInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = GenerationConfig::builder().output_dir("site").build()?;
//!     let resume = load_document("resume.pdf", None, 120).await?;
//!     let output = generate(GenerationInput::document(resume), &config).await?;
//!     println!("{}", output.specification.unwrap_or_default());
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume2web` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! resume2web = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Flow, GenerationConfig, GenerationConfigBuilder};
pub use error::Resume2WebError;
pub use generate::{generate, generate_bundle, generate_sync, generate_with_client, GenerationInput};
pub use output::{GenerationOutput, GenerationStats, InputPayload, SiteBundle};
pub use pipeline::extract::extract_text;
pub use pipeline::input::{load_document, DocumentKind, UploadedDocument};
pub use pipeline::llm::{Generation, GenerationClient, LlmClient, ScriptedClient};
pub use pipeline::package::{archive_bytes, persist_bundle, PersistedSite};
pub use pipeline::parse::{extract_block, parse_site, Block, BlockLabel};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use prompts::{build_conversation, Conversation, Phase};

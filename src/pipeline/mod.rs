//! Pipeline stages for resume-to-website generation.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the orchestrator in [`crate::generate`] only wires
//! them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ parse ──▶ postprocess ──▶ package
//! (path/URL) (pdf/docx) (model)  (markers)  (cleanup)      (files + zip)
//! ```
//!
//! 1. [`input`]   — resolve a path, URL or byte buffer to an uploaded document
//!    with a declared content type
//! 2. [`extract`] — document bytes to plain text; pdfium runs in
//!    `spawn_blocking`
//! 3. [`llm`]     — one model call per conversation; the only stage with
//!    network I/O besides URL download
//! 4. [`parse`]   — find the marker-delimited html/css/script blocks
//! 5. [`postprocess`] — deterministic cleanup of found blocks
//! 6. [`package`] — write the three site files and `website.zip`

pub mod extract;
pub mod input;
pub mod llm;
pub mod package;
pub mod parse;
pub mod postprocess;

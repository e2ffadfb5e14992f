//! Progress-callback trait for per-request generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to follow a
//! request through its stages. The two-phase flow also uses it to show the
//! intermediate specification to the requester before site generation
//! starts.
//!
//! # Example
//!
//! ```rust
//! use resume2web::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage(&self, stage: Stage) {
//!         eprintln!("→ {stage}");
//!     }
//!     fn on_specification(&self, specification: &str) {
//!         eprintln!("{specification}");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::package::PersistedSite;
use crate::prompts::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// States of one generation request.
///
/// One-phase: `Collecting → Generating → Parsing → Persisting → Done`.
/// Two-phase adds `Specifying` after `Collecting` for document input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Collecting,
    Specifying,
    Generating,
    Parsing,
    Persisting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Collecting => "collecting input",
            Stage::Specifying => "writing site specification",
            Stage::Generating => "generating website code",
            Stage::Parsing => "parsing response",
            Stage::Persisting => "writing files",
            Stage::Done => "done",
        })
    }
}

/// Called by the orchestrator as a request moves through its stages.
///
/// All methods default to no-ops so implementors override only what they
/// need.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called on entry to each stage.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called with the specification text before `Generating` begins.
    ///
    /// Fires only when the specification came from a model call.
    fn on_specification(&self, specification: &str) {
        let _ = specification;
    }

    /// Called after each successful model call.
    ///
    /// # Arguments
    /// * `phase`       — which call returned
    /// * `chars`       — character count of the response
    /// * `duration_ms` — wall-clock time of the call
    fn on_model_response(&self, phase: Phase, chars: usize, duration_ms: u64) {
        let _ = (phase, chars, duration_ms);
    }

    /// Called once all four artefacts are on disk.
    fn on_persisted(&self, files: &PersistedSite) {
        let _ = files;
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<Stage>>,
        specs: Mutex<Vec<String>>,
    }

    impl GenerationProgressCallback for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_specification(&self, specification: &str) {
            self.specs.lock().unwrap().push(specification.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage(Stage::Collecting);
        cb.on_specification("spec");
        cb.on_model_response(Phase::Direct, 10, 5);
    }

    #[test]
    fn recorder_through_arc_dyn() {
        let rec = Arc::new(Recorder::default());
        let cb: ProgressCallback = rec.clone();
        cb.on_stage(Stage::Collecting);
        cb.on_stage(Stage::Specifying);
        cb.on_specification("Name: Jane Doe");
        assert_eq!(
            *rec.stages.lock().unwrap(),
            vec![Stage::Collecting, Stage::Specifying]
        );
        assert_eq!(rec.specs.lock().unwrap().len(), 1);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Persisting.to_string(), "writing files");
    }
}

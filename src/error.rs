// Pipeline error types
//
// Initialization and lifecycle failures are reported through these typed
// errors. Per-tick collaborator failures are deliberately NOT represented
// here: they are logged and the tick is skipped, since a single bad sample
// must not halt the visual experience.

use std::fmt;

/// Errors surfaced by the pipeline driver lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The spectral source reported itself uninitialized during `initialize()`.
    AnalyzerNotReady,

    /// The visualization consumer reported itself uninitialized during
    /// `initialize()`.
    VisualizerNotReady,

    /// `start()` was called before a successful `initialize()`.
    NotInitialized,
}

impl PipelineError {
    pub fn message(&self) -> &'static str {
        match self {
            PipelineError::AnalyzerNotReady => {
                "Spectral source not initialized. Pipeline remains idle."
            }
            PipelineError::VisualizerNotReady => {
                "Visualization consumer not initialized. Pipeline remains idle."
            }
            PipelineError::NotInitialized => {
                "Pipeline not initialized. Call initialize() before start()."
            }
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineError::{:?}: {}", self, self.message())
    }
}

impl std::error::Error for PipelineError {}

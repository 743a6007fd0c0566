// src/error.rs
use thiserror::Error;

/// Failure modes inside the recognition pipeline.
///
/// None of these escape `process_frame`; they are folded into sentinel
/// predictions or all-zero features where they occur.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no hand detected in frame")]
    NoHandDetected,

    #[error("malformed hand observation: expected 21 landmarks, got {count}")]
    MalformedObservation { count: usize },

    #[error("classifier '{classifier}' failed: {reason}")]
    ClassifierFailure {
        classifier: &'static str,
        reason: String,
    },

    #[error("degenerate hand geometry (zero-size bounding box)")]
    DegenerateGeometry,
}

impl PipelineError {
    pub fn classifier(classifier: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ClassifierFailure {
            classifier,
            reason: err.to_string(),
        }
    }
}

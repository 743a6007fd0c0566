// src/prediction.rs
use serde::{Deserialize, Serialize};

use crate::labels;

/// Which classifier produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Single-frame hand shape.
    Static,
    /// Motion over a buffered window.
    Dynamic,
}

impl ClassificationMode {
    /// Dynamic once the buffer holds a full classifier window.
    pub fn for_buffer(buffered_frames: usize, sequence_length: usize) -> Self {
        if buffered_frames >= sequence_length {
            Self::Dynamic
        } else {
            Self::Static
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class: String,
    /// Position of `class` in the label set; `None` for sentinels.
    pub class_index: Option<usize>,
    pub confidence: f64,
    pub probabilities: Vec<f64>,
    pub corrections: Vec<String>,
    pub mode: Option<ClassificationMode>,
}

impl Prediction {
    pub fn no_hand() -> Self {
        Self::sentinel(labels::NO_HAND)
    }

    pub fn error() -> Self {
        Self::sentinel(labels::ERROR)
    }

    fn sentinel(class: &str) -> Self {
        Self {
            class: class.to_string(),
            class_index: None,
            confidence: 0.0,
            probabilities: Vec::new(),
            corrections: Vec::new(),
            mode: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        labels::is_sentinel(&self.class)
    }

    pub fn is_no_hand(&self) -> bool {
        self.class == labels::NO_HAND
    }

    pub fn is_error(&self) -> bool {
        self.class == labels::ERROR
    }
}

/// A prediction with its confidence replaced by the temporally smoothed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPrediction {
    pub prediction: Prediction,
    /// Confidence of the newest raw prediction before smoothing.
    pub raw_confidence: f64,
}

impl SmoothedPrediction {
    /// Wraps a prediction that did not go through the smoother (sentinels).
    pub fn unsmoothed(prediction: Prediction) -> Self {
        let raw_confidence = prediction.confidence;
        Self {
            prediction,
            raw_confidence,
        }
    }

    pub fn class(&self) -> &str {
        &self.prediction.class
    }

    pub fn confidence(&self) -> f64 {
        self.prediction.confidence
    }

    pub fn corrections(&self) -> &[String] {
        &self.prediction.corrections
    }
}

// src/classifier.rs - Seams for the trained sign models
use anyhow::Result;

use crate::labels;
use crate::landmarks::FeatureVector;
use crate::sequence::ClassSequenceInput;

/// Single-frame hand-shape model.
///
/// Returns one score per entry of `labels::SIGN_CLASSES`, in that order.
pub trait StaticClassifier: Send {
    fn name(&self) -> &'static str;

    fn predict(&mut self, features: &FeatureVector) -> Result<Vec<f64>>;

    /// Runs one throwaway inference so the first real frame is not slow.
    fn warm_up(&mut self) -> Result<()> {
        self.predict(&FeatureVector::zeros()).map(|_| ())
    }
}

/// Motion model over a fixed-length window of frames.
pub trait SequenceClassifier: Send {
    fn name(&self) -> &'static str;

    fn predict(&mut self, sequence: &ClassSequenceInput) -> Result<Vec<f64>>;

    fn warm_up(&mut self, sequence_length: usize) -> Result<()> {
        self.predict(&ClassSequenceInput::zeros(sequence_length)).map(|_| ())
    }
}

/// Development stand-in used when no trained model is available.
/// Every class gets the same score.
#[derive(Debug, Clone, Default)]
pub struct UniformClassifier;

impl UniformClassifier {
    pub fn new() -> Self {
        Self
    }

    fn distribution() -> Vec<f64> {
        let n = labels::class_count();
        vec![1.0 / n as f64; n]
    }
}

impl StaticClassifier for UniformClassifier {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn predict(&mut self, _features: &FeatureVector) -> Result<Vec<f64>> {
        Ok(Self::distribution())
    }
}

impl SequenceClassifier for UniformClassifier {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn predict(&mut self, _sequence: &ClassSequenceInput) -> Result<Vec<f64>> {
        Ok(Self::distribution())
    }
}

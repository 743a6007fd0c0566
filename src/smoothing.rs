// src/smoothing.rs - Temporal damping of per-frame confidence
use std::collections::VecDeque;

use crate::prediction::{Prediction, SmoothedPrediction};

pub const DEFAULT_HISTORY: usize = 5;
/// Newest first.
pub const DEFAULT_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// Weighted moving confidence over the most recent raw predictions.
///
/// Weights are applied newest-first and are not renormalized while the
/// history is shorter than the weight list, so confidence ramps up over the
/// first frames of a session.
#[derive(Debug, Clone)]
pub struct PredictionSmoother {
    history: VecDeque<Prediction>,
    history_size: usize,
    weights: Vec<f64>,
}

impl PredictionSmoother {
    pub fn new() -> Self {
        Self::with_weights(DEFAULT_HISTORY, DEFAULT_WEIGHTS.to_vec())
    }

    pub fn with_weights(history_size: usize, weights: Vec<f64>) -> Self {
        let history_size = history_size.max(1);
        Self {
            history: VecDeque::with_capacity(history_size + 1),
            history_size,
            weights,
        }
    }

    pub fn smooth(&mut self, prediction: Prediction) -> SmoothedPrediction {
        self.history.push_back(prediction.clone());
        if self.history.len() > self.history_size {
            self.history.pop_front();
        }

        let weighted: f64 = self
            .history
            .iter()
            .rev()
            .zip(self.weights.iter())
            .map(|(p, w)| p.confidence * w)
            .sum();

        let raw_confidence = prediction.confidence;
        SmoothedPrediction {
            prediction: Prediction {
                confidence: weighted,
                ..prediction
            },
            raw_confidence,
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for PredictionSmoother {
    fn default() -> Self {
        Self::new()
    }
}

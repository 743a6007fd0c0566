// src/dispatch.rs - Static vs. sequence classification
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, info, trace, warn};

use crate::buffer::FrameBuffer;
use crate::classifier::{SequenceClassifier, StaticClassifier, UniformClassifier};
use crate::error::PipelineError;
use crate::feedback;
use crate::labels;
use crate::landmarks::HandObservation;
use crate::prediction::{ClassificationMode, Prediction};
use crate::sequence::{self, SEQUENCE_LENGTH};

pub struct ClassificationDispatcher {
    static_model: Box<dyn StaticClassifier>,
    sequence_model: Box<dyn SequenceClassifier>,
    sequence_length: usize,
    using_fallback: bool,
}

impl ClassificationDispatcher {
    pub fn new(
        static_model: Box<dyn StaticClassifier>,
        sequence_model: Box<dyn SequenceClassifier>,
    ) -> Self {
        Self {
            static_model,
            sequence_model,
            sequence_length: SEQUENCE_LENGTH,
            using_fallback: false,
        }
    }

    /// Dispatcher backed by `UniformClassifier` on both paths.
    pub fn fallback() -> Self {
        let mut dispatcher = Self::new(
            Box::new(UniformClassifier::new()),
            Box::new(UniformClassifier::new()),
        );
        dispatcher.using_fallback = true;
        dispatcher
    }

    pub fn with_sequence_length(mut self, sequence_length: usize) -> Self {
        self.sequence_length = sequence_length.max(1);
        self
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn uses_fallback(&self) -> bool {
        self.using_fallback
    }

    /// Runs each model once on zero input. A model that fails is swapped for
    /// the uniform stand-in so the session can still run.
    pub fn warm_up(&mut self) {
        match self.static_model.warm_up() {
            Ok(()) => info!("Static classifier '{}' warmed up", self.static_model.name()),
            Err(e) => {
                warn!(
                    "Static classifier '{}' failed warm-up, using fallback: {:#}",
                    self.static_model.name(),
                    e
                );
                self.static_model = Box::new(UniformClassifier::new());
                self.using_fallback = true;
            }
        }

        match self.sequence_model.warm_up(self.sequence_length) {
            Ok(()) => info!("Sequence classifier '{}' warmed up", self.sequence_model.name()),
            Err(e) => {
                warn!(
                    "Sequence classifier '{}' failed warm-up, using fallback: {:#}",
                    self.sequence_model.name(),
                    e
                );
                self.sequence_model = Box::new(UniformClassifier::new());
                self.using_fallback = true;
            }
        }
    }

    /// Classifies one observation. Never fails: a missing hand yields
    /// `NO_HAND`, a model failure yields `ERROR`.
    pub fn classify(&mut self, observation: Option<&HandObservation>, buffer: &FrameBuffer) -> Prediction {
        let Some(observation) = observation else {
            trace!("{}", PipelineError::NoHandDetected);
            return Prediction::no_hand();
        };

        let mode = ClassificationMode::for_buffer(buffer.len(), self.sequence_length);
        debug!("Classifying with {:?} path ({} buffered frames)", mode, buffer.len());

        match self.run(mode, observation, buffer) {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!("{}", e);
                Prediction::error()
            }
        }
    }

    fn run(
        &mut self,
        mode: ClassificationMode,
        observation: &HandObservation,
        buffer: &FrameBuffer,
    ) -> Result<Prediction, PipelineError> {
        let (classifier, scores) = match mode {
            ClassificationMode::Static => {
                let features = observation.features();
                let model = &mut self.static_model;
                (model.name(), panic::catch_unwind(AssertUnwindSafe(|| model.predict(&features))))
            }
            ClassificationMode::Dynamic => {
                let input = sequence::sample(buffer, self.sequence_length);
                let model = &mut self.sequence_model;
                (model.name(), panic::catch_unwind(AssertUnwindSafe(|| model.predict(&input))))
            }
        };

        let probabilities = scores
            .map_err(|payload| PipelineError::classifier(classifier, panic_message(payload.as_ref())))?
            .map_err(|e| PipelineError::classifier(classifier, format!("{:#}", e)))?;
        let (class_index, confidence) = most_likely(&probabilities, classifier)?;
        let class = labels::label(class_index).ok_or_else(|| {
            PipelineError::classifier(classifier, format!("class index {} out of range", class_index))
        })?;

        Ok(Prediction {
            class: class.to_string(),
            class_index: Some(class_index),
            confidence,
            corrections: feedback::generate(confidence, class),
            probabilities,
            mode: Some(mode),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("panicked: {}", detail)
}

/// Index and score of the most likely class; ties go to the lowest index.
fn most_likely(probabilities: &[f64], classifier: &'static str) -> Result<(usize, f64), PipelineError> {
    if probabilities.len() != labels::class_count() {
        return Err(PipelineError::classifier(
            classifier,
            format!(
                "expected {} scores, got {}",
                labels::class_count(),
                probabilities.len()
            ),
        ));
    }
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(PipelineError::classifier(classifier, "non-finite score"));
    }

    let mut best = (0, probabilities[0]);
    for (i, &p) in probabilities.iter().enumerate().skip(1) {
        if p > best.1 {
            best = (i, p);
        }
    }
    Ok(best)
}

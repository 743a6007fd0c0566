// src/sequence.rs - Fixed-length resampling of the frame buffer
use crate::buffer::FrameBuffer;
use crate::landmarks::FeatureVector;

/// Input length the sequence classifier was trained on.
pub const SEQUENCE_LENGTH: usize = 15;

/// Fixed-length, chronological sequence of feature vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSequenceInput {
    frames: Vec<FeatureVector>,
}

impl ClassSequenceInput {
    /// All-zero sequence, used for classifier warm-up.
    pub fn zeros(length: usize) -> Self {
        Self {
            frames: vec![FeatureVector::zeros(); length],
        }
    }

    pub fn frames(&self) -> &[FeatureVector] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Stride-samples the most recent `target_length` buffered frames.
///
/// `step = max(1, N / target_length)` and output `i` reads source
/// `min(i * step, N - 1)`, so short windows repeat their last frame and an
/// empty buffer yields all-zero vectors. Readiness is the caller's check.
pub fn sample(buffer: &FrameBuffer, target_length: usize) -> ClassSequenceInput {
    let window = buffer.snapshot(target_length);
    let n = window.len();
    let step = (n / target_length.max(1)).max(1);

    let frames = (0..target_length)
        .map(|i| {
            let source = (i * step).min(n.saturating_sub(1));
            window
                .get(source)
                .map(|frame| frame.features)
                .unwrap_or_else(FeatureVector::zeros)
        })
        .collect();

    ClassSequenceInput { frames }
}

/// `sample` with the default length, or `None` while the buffer is too short
/// to describe a motion.
pub fn sample_if_ready(buffer: &FrameBuffer) -> Option<ClassSequenceInput> {
    if buffer.is_sequence_ready() {
        Some(sample(buffer, SEQUENCE_LENGTH))
    } else {
        None
    }
}

// src/feedback.rs - Correction hints and headline feedback for the learner
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::progress::TEST_THRESHOLD;

pub const STEADY_HINT: &str = "Hold your hand steady and ensure good lighting";
pub const VISIBILITY_HINT: &str = "Make sure your hand is fully visible to the camera";
pub const SHAPE_HINT: &str = "Check that your hand shape matches the target sign";

/// Below this confidence the steadiness hint is emitted.
pub const STEADY_THRESHOLD: f64 = 0.6;
/// Below this confidence visibility and shape hints are added as well.
pub const VISIBILITY_THRESHOLD: f64 = 0.4;

static SIGN_CORRECTIONS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    table.insert("A", &["Make a fist with thumb beside your fingers"]);
    table.insert("B", &["Keep fingers straight up, thumb tucked in"]);
    table.insert("C", &["Curve your hand like holding a cup"]);
    table.insert("HELLO", &["Raise hand to shoulder level and wave side to side"]);
    table.insert("THANK_YOU", &["Start with fingertips at your chin, then move forward and down"]);
    table
});

/// Correction hints for a prediction.
///
/// Thresholds accumulate: a very uncertain prediction gets the steadiness,
/// visibility and shape hints, followed by whatever the table has for `class`.
pub fn generate(confidence: f64, class: &str) -> Vec<String> {
    let mut hints = Vec::new();

    if confidence < STEADY_THRESHOLD {
        hints.push(STEADY_HINT.to_string());
    }

    if confidence < VISIBILITY_THRESHOLD {
        hints.push(VISIBILITY_HINT.to_string());
        hints.push(SHAPE_HINT.to_string());
    }

    hints.extend(sign_corrections(class).iter().map(|h| h.to_string()));
    hints
}

pub fn sign_corrections(class: &str) -> &'static [&'static str] {
    SIGN_CORRECTIONS.get(class).copied().unwrap_or(&[])
}

/// Coarse rating of a (smoothed) confidence, with the message shown to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackLevel {
    Great,
    Good,
    KeepTrying,
    NotVisible,
}

impl FeedbackLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            Self::Great
        } else if confidence > 0.6 {
            Self::Good
        } else if confidence > 0.3 {
            Self::KeepTrying
        } else {
            Self::NotVisible
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Great => "Great job!",
            Self::Good => "Good! Try to hold the sign steadier",
            Self::KeepTrying => "Keep trying! Check your hand position",
            Self::NotVisible => "Make sure your hand is visible and in position",
        }
    }
}

/// Timed-test verdict: the sign counts once confidence clears `TEST_THRESHOLD`.
pub fn test_passed(confidence: f64) -> bool {
    confidence > TEST_THRESHOLD
}

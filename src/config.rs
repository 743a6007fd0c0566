// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::buffer::{DEFAULT_CAPACITY, MIN_SEQUENCE_FRAMES};
use crate::progress::DEFAULT_ACCURACY_WINDOW;
use crate::sequence::SEQUENCE_LENGTH;
use crate::smoothing::{DEFAULT_HISTORY, DEFAULT_WEIGHTS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub buffer_capacity: usize,
    pub sequence_length: usize,
    pub min_sequence_frames: usize,
    pub max_hands: usize,
    pub smoothing_history: usize,
    pub smoothing_weights: Vec<f64>,
    pub accuracy_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            sequence_length: SEQUENCE_LENGTH,
            min_sequence_frames: MIN_SEQUENCE_FRAMES,
            max_hands: 2,
            smoothing_history: DEFAULT_HISTORY,
            smoothing_weights: DEFAULT_WEIGHTS.to_vec(),
            accuracy_window: DEFAULT_ACCURACY_WINDOW,
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON config; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config.validate())
    }

    /// Coerces sizes that would stall the pipeline.
    pub fn validate(mut self) -> Self {
        if self.buffer_capacity == 0 {
            warn!("buffer_capacity of 0 is not usable, using 1");
            self.buffer_capacity = 1;
        }
        if self.sequence_length == 0 {
            warn!("sequence_length of 0 is not usable, using {}", SEQUENCE_LENGTH);
            self.sequence_length = SEQUENCE_LENGTH;
        }
        if self.max_hands == 0 {
            warn!("max_hands of 0 would ignore every hand, using 1");
            self.max_hands = 1;
        }
        if self.smoothing_history == 0 {
            self.smoothing_history = 1;
        }
        if self.accuracy_window == 0 {
            self.accuracy_window = DEFAULT_ACCURACY_WINDOW;
        }
        if self.sequence_length > self.buffer_capacity {
            // the dynamic path could never trigger
            warn!(
                "sequence_length {} exceeds buffer_capacity {}",
                self.sequence_length, self.buffer_capacity
            );
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.buffer_capacity, 30);
        assert_eq!(config.sequence_length, 15);
        assert_eq!(config.min_sequence_frames, 10);
        assert_eq!(config.smoothing_weights, vec![0.4, 0.3, 0.2, 0.1]);
        assert_eq!(config.accuracy_window, 50);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_hands": 1, "buffer_capacity": 0}}"#).unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.max_hands, 1);
        assert_eq!(config.buffer_capacity, 1);
        assert_eq!(config.sequence_length, 15);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(PipelineConfig::load(file.path()).is_err());
    }
}

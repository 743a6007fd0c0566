// src/lib.rs
pub mod buffer;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod feedback;
pub mod labels;
pub mod landmarks;
pub mod prediction;
pub mod progress;
pub mod sequence;
pub mod session;
pub mod smoothing;
pub mod worker;

pub use classifier::{SequenceClassifier, StaticClassifier, UniformClassifier};
pub use config::PipelineConfig;
pub use dispatch::ClassificationDispatcher;
pub use error::PipelineError;
pub use prediction::{Prediction, SmoothedPrediction};
pub use session::{DetectorFrame, FrameOutcome, TrackingSession};

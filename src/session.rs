// src/session.rs - Per-session recognition pipeline
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::buffer::{BufferedFrame, FrameBuffer};
use crate::config::PipelineConfig;
use crate::dispatch::ClassificationDispatcher;
use crate::landmarks::{HandObservation, Landmark};
use crate::prediction::{Prediction, SmoothedPrediction};
use crate::smoothing::PredictionSmoother;

/// What the landmark detector reports for one camera frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorFrame {
    /// One landmark set per detected hand, in detector order.
    #[serde(default)]
    pub hands: Vec<Vec<Landmark>>,
    /// Seconds since the session started.
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub timestamp: f64,
    /// Result for the first hand slot; `NO_HAND` when no hand was usable.
    pub prediction: SmoothedPrediction,
    /// Result per hand slot, including empty ones.
    pub hands: Vec<SmoothedPrediction>,
}

/// State owned by a single tracked hand.
#[derive(Debug, Clone)]
struct HandPipeline {
    buffer: FrameBuffer,
    smoother: PredictionSmoother,
}

impl HandPipeline {
    fn new(config: &PipelineConfig) -> Self {
        Self {
            buffer: FrameBuffer::with_capacity(config.buffer_capacity)
                .with_min_sequence_frames(config.min_sequence_frames),
            smoother: PredictionSmoother::with_weights(
                config.smoothing_history,
                config.smoothing_weights.clone(),
            ),
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.smoother.reset();
    }
}

/// Context object for one tracking session.
///
/// The caller's frame loop drives it through `process_frame`; each detector
/// hand slot keeps its own buffer and smoother.
pub struct TrackingSession {
    id: Uuid,
    config: PipelineConfig,
    dispatcher: ClassificationDispatcher,
    hands: Vec<HandPipeline>,
    running: bool,
    started_at: DateTime<Utc>,
    frames_processed: u64,
}

impl TrackingSession {
    pub fn new(config: PipelineConfig, dispatcher: ClassificationDispatcher) -> Self {
        let config = config.validate();
        let dispatcher = dispatcher.with_sequence_length(config.sequence_length);
        let hands = (0..config.max_hands).map(|_| HandPipeline::new(&config)).collect();
        let id = Uuid::new_v4();
        info!("Tracking session {} started", id);

        Self {
            id,
            config,
            dispatcher,
            hands,
            running: true,
            started_at: Utc::now(),
            frames_processed: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn hand_buffer(&self, slot: usize) -> Option<&FrameBuffer> {
        self.hands.get(slot).map(|h| &h.buffer)
    }

    /// Resumes a stopped session with empty state.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        for hand in &mut self.hands {
            hand.reset();
        }
        self.id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.frames_processed = 0;
        self.running = true;
        info!("Tracking session {} started", self.id);
    }

    /// Clears every buffer and smoothing history. Until `start` is called
    /// again, frames yield `NO_HAND` and are not buffered.
    pub fn stop(&mut self) {
        for hand in &mut self.hands {
            hand.reset();
        }
        if self.running {
            info!(
                "Tracking session {} stopped after {} frames",
                self.id, self.frames_processed
            );
        }
        self.running = false;
    }

    /// One pass of normalize, buffer, classify and smooth per hand slot.
    pub fn process_frame(&mut self, frame: &DetectorFrame) -> FrameOutcome {
        if !self.running {
            let none = SmoothedPrediction::unsmoothed(Prediction::no_hand());
            return FrameOutcome {
                timestamp: frame.timestamp,
                prediction: none.clone(),
                hands: vec![none; self.hands.len()],
            };
        }

        self.frames_processed += 1;
        if frame.hands.len() > self.hands.len() {
            debug!(
                "Ignoring {} hand(s) beyond max_hands={}",
                frame.hands.len() - self.hands.len(),
                self.hands.len()
            );
        }

        let mut results = Vec::with_capacity(self.hands.len());
        for (slot, hand) in self.hands.iter_mut().enumerate() {
            let observation = match frame.hands.get(slot) {
                Some(landmarks) => match HandObservation::new(landmarks.clone()) {
                    Ok(observation) => Some(observation),
                    Err(e) => {
                        debug!("Hand slot {}: {}", slot, e);
                        None
                    }
                },
                None => None,
            };

            let Some(observation) = observation else {
                results.push(SmoothedPrediction::unsmoothed(Prediction::no_hand()));
                continue;
            };

            hand.buffer
                .push(BufferedFrame::new(observation.features(), frame.timestamp));

            let raw = self.dispatcher.classify(Some(&observation), &hand.buffer);
            let smoothed = if raw.is_sentinel() {
                SmoothedPrediction::unsmoothed(raw)
            } else {
                hand.smoother.smooth(raw)
            };
            results.push(smoothed);
        }

        let prediction = results
            .first()
            .cloned()
            .unwrap_or_else(|| SmoothedPrediction::unsmoothed(Prediction::no_hand()));

        FrameOutcome {
            timestamp: frame.timestamp,
            prediction,
            hands: results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::sample_hand;

    fn session() -> TrackingSession {
        TrackingSession::new(PipelineConfig::default(), ClassificationDispatcher::fallback())
    }

    fn frame(hands: Vec<Vec<Landmark>>, timestamp: f64) -> DetectorFrame {
        DetectorFrame { hands, timestamp }
    }

    #[test]
    fn test_empty_frame_is_no_hand() {
        let mut session = session();
        let outcome = session.process_frame(&frame(vec![], 0.0));
        assert_eq!(outcome.prediction.class(), "NO_HAND");
        assert_eq!(outcome.hands.len(), 2);
        assert!(session.hand_buffer(0).unwrap().is_empty());
    }

    #[test]
    fn test_valid_hand_is_buffered_and_smoothed() {
        let mut session = session();
        let outcome = session.process_frame(&frame(vec![sample_hand()], 0.033));

        assert_eq!(session.hand_buffer(0).unwrap().len(), 1);
        assert!(session.hand_buffer(1).unwrap().is_empty());
        assert_eq!(outcome.prediction.class(), "A");
        let raw = 1.0 / 32.0;
        assert!((outcome.prediction.raw_confidence - raw).abs() < 1e-12);
        assert!((outcome.prediction.confidence() - raw * 0.4).abs() < 1e-12);
        assert_eq!(outcome.hands[1].class(), "NO_HAND");
    }

    #[test]
    fn test_malformed_hand_is_treated_as_absent() {
        let mut session = session();
        let mut short = sample_hand();
        short.truncate(12);
        let outcome = session.process_frame(&frame(vec![short], 0.0));
        assert_eq!(outcome.prediction.class(), "NO_HAND");
        assert!(session.hand_buffer(0).unwrap().is_empty());
    }

    #[test]
    fn test_hands_keep_independent_buffers() {
        let mut session = session();
        for i in 0..5 {
            session.process_frame(&frame(vec![sample_hand(), sample_hand()], i as f64));
        }
        session.process_frame(&frame(vec![sample_hand()], 5.0));
        assert_eq!(session.hand_buffer(0).unwrap().len(), 6);
        assert_eq!(session.hand_buffer(1).unwrap().len(), 5);
    }

    #[test]
    fn test_stop_clears_state_and_blocks_frames() {
        let mut session = session();
        for i in 0..20 {
            session.process_frame(&frame(vec![sample_hand()], i as f64));
        }
        assert_eq!(session.hand_buffer(0).unwrap().len(), 20);

        session.stop();
        assert!(!session.is_running());
        assert!(session.hand_buffer(0).unwrap().is_empty());

        let outcome = session.process_frame(&frame(vec![sample_hand()], 21.0));
        assert_eq!(outcome.prediction.class(), "NO_HAND");
        assert!(session.hand_buffer(0).unwrap().is_empty());

        let old_id = session.id();
        session.start();
        assert_ne!(session.id(), old_id);
        let outcome = session.process_frame(&frame(vec![sample_hand()], 22.0));
        // smoother history was reset, so damping starts over
        assert!((outcome.prediction.confidence() - 0.4 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_extra_hands_are_ignored() {
        let config = PipelineConfig {
            max_hands: 1,
            ..PipelineConfig::default()
        };
        let mut session = TrackingSession::new(config, ClassificationDispatcher::fallback());
        let outcome = session.process_frame(&frame(vec![sample_hand(), sample_hand()], 0.0));
        assert_eq!(outcome.hands.len(), 1);
        assert!(session.hand_buffer(1).is_none());
    }

    #[test]
    fn test_detector_frame_json() {
        let json = r#"{"timestamp": 1.5, "hands": [[{"x": 0.1, "y": 0.2}]]}"#;
        let frame: DetectorFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp, 1.5);
        assert_eq!(frame.hands[0][0], Landmark::new(0.1, 0.2, 0.0));
    }
}

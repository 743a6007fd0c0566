// src/buffer.rs
use std::collections::VecDeque;

use crate::landmarks::FeatureVector;

pub const DEFAULT_CAPACITY: usize = 30;
/// Frames needed before a sequence is worth sampling.
pub const MIN_SEQUENCE_FRAMES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct BufferedFrame {
    pub features: FeatureVector,
    /// Seconds since the tracking session started.
    pub timestamp: f64,
}

impl BufferedFrame {
    pub fn new(features: FeatureVector, timestamp: f64) -> Self {
        Self { features, timestamp }
    }
}

/// Bounded, append-only history of normalized frames for one hand.
/// Oldest frames are evicted first once capacity is reached.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    frames: VecDeque<BufferedFrame>,
    capacity: usize,
    min_sequence_frames: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
            min_sequence_frames: MIN_SEQUENCE_FRAMES,
        }
    }

    pub fn with_min_sequence_frames(mut self, frames: usize) -> Self {
        self.min_sequence_frames = frames;
        self
    }

    pub fn push(&mut self, frame: BufferedFrame) {
        self.frames.push_back(frame);
        if self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// The most recent `n` frames, oldest first.
    pub fn snapshot(&self, n: usize) -> Vec<BufferedFrame> {
        let skip = self.frames.len().saturating_sub(n);
        self.frames.iter().skip(skip).cloned().collect()
    }

    pub fn latest(&self) -> Option<&BufferedFrame> {
        self.frames.back()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_sequence_ready(&self) -> bool {
        self.frames.len() >= self.min_sequence_frames
    }

    pub fn min_sequence_frames(&self) -> usize {
        self.min_sequence_frames
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) fn marked_frame(marker: f64, timestamp: f64) -> BufferedFrame {
    let mut values = [0.0; crate::landmarks::FEATURE_LEN];
    values[0] = marker;
    BufferedFrame::new(FeatureVector::from_array(values), timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = FrameBuffer::new();
        for i in 0..35 {
            buffer.push(marked_frame(0.0, i as f64));
            assert!(buffer.len() <= 30);
        }
        assert_eq!(buffer.len(), 30);
    }

    #[test]
    fn test_snapshot_after_overflow_is_last_thirty() {
        let mut buffer = FrameBuffer::new();
        for i in 0..35 {
            buffer.push(marked_frame(0.0, i as f64));
        }

        let snap = buffer.snapshot(30);
        assert_eq!(snap.len(), 30);
        let stamps: Vec<f64> = snap.iter().map(|f| f.timestamp).collect();
        let expected: Vec<f64> = (5..35).map(|i| i as f64).collect();
        assert_eq!(stamps, expected);
    }

    #[test]
    fn test_snapshot_shorter_than_request() {
        let mut buffer = FrameBuffer::new();
        for i in 0..3 {
            buffer.push(marked_frame(0.0, i as f64));
        }
        let snap = buffer.snapshot(10);
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[0].timestamp, 0.0);
        assert_eq!(snap[2].timestamp, 2.0);
        // non-mutating
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_snapshot_returns_most_recent() {
        let mut buffer = FrameBuffer::new();
        for i in 0..10 {
            buffer.push(marked_frame(0.0, i as f64));
        }
        let snap = buffer.snapshot(4);
        let stamps: Vec<f64> = snap.iter().map(|f| f.timestamp).collect();
        assert_eq!(stamps, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = FrameBuffer::new();
        for i in 0..12 {
            buffer.push(marked_frame(0.0, i as f64));
        }
        assert!(buffer.is_sequence_ready());
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(!buffer.is_sequence_ready());
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn test_readiness_threshold() {
        let mut buffer = FrameBuffer::new();
        for i in 0..9 {
            buffer.push(marked_frame(0.0, i as f64));
        }
        assert!(!buffer.is_sequence_ready());
        buffer.push(marked_frame(0.0, 9.0));
        assert!(buffer.is_sequence_ready());
    }

    #[test]
    fn test_zero_capacity_is_coerced() {
        let mut buffer = FrameBuffer::with_capacity(0);
        buffer.push(marked_frame(0.0, 0.0));
        buffer.push(marked_frame(0.0, 1.0));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.latest().map(|f| f.timestamp), Some(1.0));
    }
}

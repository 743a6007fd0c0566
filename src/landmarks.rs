// src/landmarks.rs - Hand landmark types and bounding-box normalization
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::PipelineError;

/// Fixed MediaPipe hand topology.
pub const HAND_LANDMARKS: usize = 21;
/// 21 landmarks x (x, y, z).
pub const FEATURE_LEN: usize = HAND_LANDMARKS * 3;

/// One detector keypoint. `x`/`y` are relative to the image frame,
/// `z` is relative depth and defaults to 0 when the detector omits it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<[f64; 3]> for Landmark {
    fn from(raw: [f64; 3]) -> Self {
        Self::new(raw[0], raw[1], raw[2])
    }
}

/// The full landmark set of one hand in one frame. Always 21 points.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    landmarks: Vec<Landmark>,
}

impl HandObservation {
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, PipelineError> {
        if landmarks.len() != HAND_LANDMARKS {
            return Err(PipelineError::MalformedObservation {
                count: landmarks.len(),
            });
        }
        Ok(Self { landmarks })
    }

    /// Accepts the `[x, y, z]` array form the detector bridge hands out.
    pub fn from_raw(raw: &[[f64; 3]]) -> Result<Self, PipelineError> {
        Self::new(raw.iter().copied().map(Landmark::from).collect())
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn features(&self) -> FeatureVector {
        normalize(&self.landmarks)
    }
}

/// Normalized classifier input: 21 points in a unit square centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_LEN]);

impl FeatureVector {
    pub fn zeros() -> Self {
        Self([0.0; FEATURE_LEN])
    }

    pub fn from_array(values: [f64; FEATURE_LEN]) -> Self {
        Self(values)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Landmark `i` as a point.
    pub fn point(&self, i: usize) -> Vector3<f64> {
        Vector3::new(self.0[i * 3], self.0[i * 3 + 1], self.0[i * 3 + 2])
    }

    pub fn to_landmarks(&self) -> Vec<Landmark> {
        (0..HAND_LANDMARKS)
            .map(|i| {
                let p = self.point(i);
                Landmark::new(p.x, p.y, p.z)
            })
            .collect()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Translation- and scale-invariant encoding of one hand.
///
/// The `(x, y)` bounding box is centered on the origin and its larger side
/// scaled to 1; `z` passes through. Anything other than 21 landmarks, a
/// non-finite coordinate, or a zero-size bounding box yields the all-zero
/// vector.
pub fn normalize(landmarks: &[Landmark]) -> FeatureVector {
    if landmarks.len() != HAND_LANDMARKS {
        trace!("{}", PipelineError::MalformedObservation { count: landmarks.len() });
        return FeatureVector::zeros();
    }

    // f64::min/max skip NaN, so the box alone would not catch it
    if landmarks
        .iter()
        .any(|lm| !(lm.x.is_finite() && lm.y.is_finite() && lm.z.is_finite()))
    {
        trace!("{}", PipelineError::DegenerateGeometry);
        return FeatureVector::zeros();
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for lm in landmarks {
        min_x = min_x.min(lm.x);
        min_y = min_y.min(lm.y);
        max_x = max_x.max(lm.x);
        max_y = max_y.max(lm.y);
    }

    let width = max_x - min_x;
    let height = max_y - min_y;
    let size = width.max(height);

    if !(size.is_finite() && size > 0.0) {
        trace!("{}", PipelineError::DegenerateGeometry);
        return FeatureVector::zeros();
    }

    let center = Vector3::new(min_x + width / 2.0, min_y + height / 2.0, 0.0);
    let mut out = [0.0; FEATURE_LEN];
    for (i, lm) in landmarks.iter().enumerate() {
        let p = lm.position() - center;
        out[i * 3] = p.x / size;
        out[i * 3 + 1] = p.y / size;
        out[i * 3 + 2] = lm.z;
    }
    FeatureVector(out)
}

#[cfg(test)]
pub(crate) fn sample_hand() -> Vec<Landmark> {
    // Rough open-palm layout in image coordinates.
    (0..HAND_LANDMARKS)
        .map(|i| {
            let finger = i.saturating_sub(1) / 4;
            let joint = i.saturating_sub(1) % 4;
            let x = 0.40 + 0.03 * finger as f64 + 0.002 * joint as f64;
            let y = if i == 0 { 0.70 } else { 0.60 - 0.04 * joint as f64 };
            Landmark::new(x, y, -0.01 * joint as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &FeatureVector, b: &FeatureVector) {
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
        }
    }

    #[test]
    fn test_translation_invariance() {
        let hand = sample_hand();
        let shifted: Vec<Landmark> = hand
            .iter()
            .map(|lm| Landmark::new(lm.x + 0.17, lm.y - 0.08, lm.z))
            .collect();

        assert_close(&normalize(&hand), &normalize(&shifted));
    }

    #[test]
    fn test_scale_invariance_around_centroid() {
        let hand = sample_hand();
        let n = hand.len() as f64;
        let cx = hand.iter().map(|lm| lm.x).sum::<f64>() / n;
        let cy = hand.iter().map(|lm| lm.y).sum::<f64>() / n;

        for factor in [0.5, 1.7, 3.0] {
            let scaled: Vec<Landmark> = hand
                .iter()
                .map(|lm| Landmark::new(cx + (lm.x - cx) * factor, cy + (lm.y - cy) * factor, lm.z))
                .collect();
            assert_close(&normalize(&hand), &normalize(&scaled));
        }
    }

    #[test]
    fn test_output_fits_unit_square() {
        let features = normalize(&sample_hand());
        for i in 0..HAND_LANDMARKS {
            let p = features.point(i);
            assert!(p.x >= -0.5 - 1e-12 && p.x <= 0.5 + 1e-12);
            assert!(p.y >= -0.5 - 1e-12 && p.y <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn test_idempotent() {
        let once = normalize(&sample_hand());
        let twice = normalize(&once.to_landmarks());
        assert_close(&once, &twice);
    }

    #[test]
    fn test_degenerate_is_all_zero() {
        let same = vec![Landmark::new(0.5, 0.5, 0.2); HAND_LANDMARKS];
        let features = normalize(&same);
        assert!(features.is_zero());
        assert!(features.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_non_finite_coordinate_is_all_zero() {
        for bad in [f64::NAN, f64::INFINITY] {
            let mut hand = sample_hand();
            hand[5].x = bad;
            assert!(normalize(&hand).is_zero());

            let mut hand = sample_hand();
            hand[20].z = bad;
            assert!(normalize(&hand).is_zero());
        }
    }

    #[test]
    fn test_wrong_count_is_all_zero() {
        let mut hand = sample_hand();
        hand.pop();
        assert!(normalize(&hand).is_zero());
        assert!(normalize(&[]).is_zero());
    }

    #[test]
    fn test_observation_validates_count() {
        assert!(HandObservation::new(sample_hand()).is_ok());
        let err = HandObservation::new(vec![Landmark::default(); 20]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedObservation { count: 20 }));
    }

    #[test]
    fn test_missing_z_defaults_to_zero() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.25,"y":0.75}"#).unwrap();
        assert_eq!(lm, Landmark::new(0.25, 0.75, 0.0));
    }

    #[test]
    fn test_z_passes_through() {
        let hand = sample_hand();
        let features = normalize(&hand);
        for (i, lm) in hand.iter().enumerate() {
            assert_eq!(features.point(i).z, lm.z);
        }
    }
}

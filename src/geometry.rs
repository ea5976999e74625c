//! Gesture geometry normalization
//!
//! This module converts raw landmark positions into stable, comparable
//! percentages:
//! - Raw mouth width/height and face width in detector units
//! - Distance compensation from the calibrated face width
//! - Clamped 0-1 mouth openness and width percentages
//!
//! Everything here is pure math; the only input beyond the landmarks is a
//! read-only [`CalibrationReference`].

use crate::calibration::CalibrationReference;
use crate::error::GestureError;
use crate::types::{GestureSignal, LandmarkMap, LandmarkSet};

/// Clamp a value to an arbitrary range.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Clamp a value to [0, 1].
pub fn clamp01(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Normalizer for converting landmark positions into gesture percentages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geometry {
    map: LandmarkMap,
}

impl Geometry {
    pub fn new(map: LandmarkMap) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &LandmarkMap {
        &self.map
    }

    /// Raw mouth width in detector units.
    pub fn raw_mouth_width(&self, landmarks: &LandmarkSet) -> f64 {
        landmarks.x(self.map.mouth_left) - landmarks.x(self.map.mouth_right)
    }

    /// Raw mouth height in detector units.
    pub fn raw_mouth_height(&self, landmarks: &LandmarkSet) -> f64 {
        landmarks.y(self.map.mouth_top) - landmarks.y(self.map.mouth_bottom)
    }

    /// Raw face width in detector units.
    pub fn raw_face_width(&self, landmarks: &LandmarkSet) -> f64 {
        landmarks.x(self.map.face_right) - landmarks.x(self.map.face_left)
    }

    /// Deviation of the current face width from the calibrated reference.
    ///
    /// 0 when the widths match, positive when the face appears wider
    /// (closer to the camera), negative when farther.
    pub fn face_delta_pct(
        &self,
        landmarks: &LandmarkSet,
        reference: &CalibrationReference,
    ) -> f64 {
        (self.raw_face_width(landmarks) - reference.face_width) / reference.face_width
    }

    /// Mouth width as a 0-1 percentage of the calibrated range,
    /// compensated for distance from the camera.
    ///
    /// The `(1 - face_delta_pct)` multiplier dampens measurements taken
    /// closer to the camera and amplifies ones taken farther away. It is a
    /// best-effort approximation: the multiplier can leave [0, 1] under
    /// drastic distance changes, so the output is clamped again.
    pub fn width_pct(
        &self,
        landmarks: &LandmarkSet,
        reference: &CalibrationReference,
        face_delta_pct: f64,
    ) -> f64 {
        let scaled = clamp01(
            (self.raw_mouth_width(landmarks) - reference.min_width) / reference.max_width,
        );
        clamp01(scaled * (1.0 - face_delta_pct))
    }

    /// Mouth height as a 0-1 percentage of the calibrated range,
    /// compensated the same way as [`Geometry::width_pct`].
    pub fn height_pct(
        &self,
        landmarks: &LandmarkSet,
        reference: &CalibrationReference,
        face_delta_pct: f64,
    ) -> f64 {
        let scaled = clamp01(
            (self.raw_mouth_height(landmarks) - reference.min_height) / reference.max_height,
        );
        clamp01(scaled * (1.0 - face_delta_pct))
    }

    /// Compute the full per-frame gesture signal.
    ///
    /// Validates the reference first so a degenerate calibration surfaces as
    /// [`GestureError::InvalidCalibration`] instead of NaN reaching the
    /// clamp stage.
    pub fn signal(
        &self,
        landmarks: &LandmarkSet,
        reference: &CalibrationReference,
    ) -> Result<GestureSignal, GestureError> {
        reference.validate()?;

        let face_delta_pct = self.face_delta_pct(landmarks, reference);
        Ok(GestureSignal {
            width_pct: self.width_pct(landmarks, reference, face_delta_pct),
            height_pct: self.height_pct(landmarks, reference, face_delta_pct),
            face_delta_pct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    /// Landmark set with the six consumed points at controlled positions.
    fn make_landmarks(
        mouth_width: f64,
        mouth_height: f64,
        face_width: f64,
    ) -> LandmarkSet {
        let map = LandmarkMap::default();
        let mut points = vec![Point::new(0.0, 0.0); 68];
        points[map.mouth_right] = Point::new(100.0, 0.0);
        points[map.mouth_left] = Point::new(100.0 + mouth_width, 0.0);
        points[map.mouth_bottom] = Point::new(0.0, 200.0);
        points[map.mouth_top] = Point::new(0.0, 200.0 + mouth_height);
        points[map.face_left] = Point::new(50.0, 0.0);
        points[map.face_right] = Point::new(50.0 + face_width, 0.0);
        LandmarkSet::from_points(points).unwrap()
    }

    fn make_reference() -> CalibrationReference {
        CalibrationReference {
            face_width: 150.0,
            min_width: 40.0,
            max_width: 60.0,
            min_height: 10.0,
            max_height: 50.0,
        }
    }

    #[test]
    fn test_raw_measurements() {
        let geometry = Geometry::default();
        let landmarks = make_landmarks(55.0, 30.0, 150.0);

        assert!((geometry.raw_mouth_width(&landmarks) - 55.0).abs() < 1e-9);
        assert!((geometry.raw_mouth_height(&landmarks) - 30.0).abs() < 1e-9);
        assert!((geometry.raw_face_width(&landmarks) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_face_delta_sign() {
        let geometry = Geometry::default();
        let reference = make_reference();

        // At the calibrated distance the delta is zero.
        let at = make_landmarks(55.0, 30.0, 150.0);
        assert!(geometry.face_delta_pct(&at, &reference).abs() < 1e-9);

        // Closer (wider apparent face) is positive, farther negative.
        let closer = make_landmarks(55.0, 30.0, 180.0);
        assert!(geometry.face_delta_pct(&closer, &reference) > 0.0);
        let farther = make_landmarks(55.0, 30.0, 120.0);
        assert!(geometry.face_delta_pct(&farther, &reference) < 0.0);
    }

    #[test]
    fn test_signal_values_at_reference_distance() {
        let geometry = Geometry::default();
        let reference = make_reference();
        let landmarks = make_landmarks(55.0, 30.0, 150.0);

        let signal = geometry.signal(&landmarks, &reference).unwrap();
        // (55 - 40) / 60 = 0.25; (30 - 10) / 50 = 0.4
        assert!((signal.width_pct - 0.25).abs() < 1e-9);
        assert!((signal.height_pct - 0.4).abs() < 1e-9);
        assert!(signal.face_delta_pct.abs() < 1e-9);
    }

    #[test]
    fn test_clamp_invariant_under_extreme_inputs() {
        let geometry = Geometry::default();
        let reference = make_reference();

        // Mouth far beyond the calibrated range, face much closer and much
        // farther than the reference: outputs must stay in [0, 1].
        let cases = [
            make_landmarks(500.0, 400.0, 600.0),
            make_landmarks(500.0, 400.0, 20.0),
            make_landmarks(-50.0, -30.0, 150.0),
            make_landmarks(0.0, 0.0, 1.0),
        ];
        for landmarks in &cases {
            let signal = geometry.signal(landmarks, &reference).unwrap();
            assert!((0.0..=1.0).contains(&signal.width_pct));
            assert!((0.0..=1.0).contains(&signal.height_pct));
        }
    }

    #[test]
    fn test_compensation_dampens_when_closer() {
        let geometry = Geometry::default();
        let reference = make_reference();

        // Same raw mouth measurements; the closer frame must report smaller
        // percentages than the frame at the calibrated distance.
        let at = make_landmarks(70.0, 30.0, 150.0);
        let closer = make_landmarks(70.0, 30.0, 195.0);

        let signal_at = geometry.signal(&at, &reference).unwrap();
        let signal_closer = geometry.signal(&closer, &reference).unwrap();
        assert!(signal_closer.width_pct < signal_at.width_pct);
        assert!(signal_closer.height_pct < signal_at.height_pct);
    }

    #[test]
    fn test_degenerate_reference_is_rejected() {
        let geometry = Geometry::default();
        let landmarks = make_landmarks(55.0, 30.0, 150.0);

        let mut reference = make_reference();
        reference.max_height = 0.0;
        let result = geometry.signal(&landmarks, &reference);
        assert!(matches!(result, Err(GestureError::InvalidCalibration(_))));

        let mut reference = make_reference();
        reference.max_width = 0.0;
        assert!(geometry.signal(&landmarks, &reference).is_err());

        let mut reference = make_reference();
        reference.face_width = 0.0;
        assert!(geometry.signal(&landmarks, &reference).is_err());
    }

    #[test]
    fn test_clamp_helpers() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
        assert_eq!(clamp01(1.5), 1.0);
        assert_eq!(clamp01(-0.5), 0.0);
    }
}

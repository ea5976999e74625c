//! Calibration reference and capture state machine
//!
//! This module manages the per-user reference measurements that anchor the
//! geometry normalization:
//! - A five-value [`CalibrationReference`] (face width plus mouth ranges)
//! - A six-step capture cycle advanced one step per user trigger
//! - Validation that rejects captures which would zero out a range
//!
//! The reference is single-writer (only [`Calibration::advance`] mutates it)
//! and read by the normalizer on every frame.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GestureError;
use crate::geometry::Geometry;
use crate::types::LandmarkSet;

/// The five-value baseline used to normalize raw measurements.
///
/// The default is a stock reference from a sample webcam session. It keeps
/// the normalizer well-defined before the first capture cycle finishes; any
/// real use should recalibrate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReference {
    /// Reference face width in detector units.
    pub face_width: f64,
    /// Mouth width with the mouth maximally narrow.
    pub min_width: f64,
    /// Mouth width range divisor.
    pub max_width: f64,
    /// Mouth height with the mouth closed.
    pub min_height: f64,
    /// Mouth height range divisor.
    pub max_height: f64,
}

impl Default for CalibrationReference {
    fn default() -> Self {
        Self {
            face_width: 147.945_605_266_839_27,
            min_width: 43.643_948_674_201_965,
            max_width: 59.995_106_309_652_33,
            min_height: 8.769_448_757_171_63,
            max_height: 64.545_889_616_012_57,
        }
    }
}

impl CalibrationReference {
    /// Reject references whose denominators would poison the normalizer.
    pub fn validate(&self) -> Result<(), GestureError> {
        for (name, value) in [
            ("face_width", self.face_width),
            ("max_width", self.max_width),
            ("max_height", self.max_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GestureError::InvalidCalibration(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// One step of the capture cycle.
///
/// The cycle starts at `AwaitFaceWidth`; `Idle` is the terminal state after
/// a full pass and doubles as the restart point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStep {
    Idle,
    AwaitFaceWidth,
    AwaitMinWidth,
    AwaitMaxWidth,
    AwaitMinHeight,
    AwaitMaxHeight,
}

impl CalibrationStep {
    pub fn index(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::AwaitFaceWidth => 1,
            Self::AwaitMinWidth => 2,
            Self::AwaitMaxWidth => 3,
            Self::AwaitMinHeight => 4,
            Self::AwaitMaxHeight => 5,
        }
    }

    /// Pose instruction to show the user for the upcoming capture.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Idle => "Calibration complete",
            Self::AwaitFaceWidth => "Look straight at the camera",
            Self::AwaitMinWidth => "Relax your mouth",
            Self::AwaitMaxWidth => "Stretch your mouth as wide as you can",
            Self::AwaitMinHeight => "Close your mouth",
            Self::AwaitMaxHeight => "Open your mouth as far as you can",
        }
    }
}

/// Capture state machine plus the reference it populates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibration {
    reference: CalibrationReference,
    step: CalibrationStep,
    complete: bool,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibration {
    /// Start a fresh capture cycle over the stock reference.
    pub fn new() -> Self {
        Self {
            reference: CalibrationReference::default(),
            step: CalibrationStep::AwaitFaceWidth,
            complete: false,
        }
    }

    /// Adopt an existing reference (e.g. restored by an outer layer) and
    /// mark the cycle complete, skipping capture entirely.
    pub fn precalibrated(reference: CalibrationReference) -> Result<Self, GestureError> {
        reference.validate()?;
        Ok(Self {
            reference,
            step: CalibrationStep::Idle,
            complete: true,
        })
    }

    pub fn step(&self) -> CalibrationStep {
        self.step
    }

    /// True once a full capture cycle has finished. Live modulator dispatch
    /// is gated on this flag.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn reference(&self) -> &CalibrationReference {
        &self.reference
    }

    /// Advance the cycle by one step.
    ///
    /// Every capture step requires a currently visible face; without one the
    /// call returns [`GestureError::NoFaceDetected`] and changes nothing, so
    /// the caller can show transient feedback and retry. Captures that would
    /// zero out a normalization denominator are rejected the same way, as
    /// [`GestureError::InvalidCalibration`].
    ///
    /// Returns the step now awaiting capture.
    pub fn advance(
        &mut self,
        latest: Option<&LandmarkSet>,
        geometry: &Geometry,
    ) -> Result<CalibrationStep, GestureError> {
        if self.step == CalibrationStep::Idle {
            // Restarting invalidates the previous cycle's completeness.
            self.complete = false;
            self.step = CalibrationStep::AwaitFaceWidth;
            debug!("Calibration cycle restarted");
            return Ok(self.step);
        }

        let landmarks = latest.ok_or(GestureError::NoFaceDetected)?;

        match self.step {
            CalibrationStep::Idle => unreachable!("handled above"),
            CalibrationStep::AwaitFaceWidth => {
                let value = geometry.raw_face_width(landmarks);
                Self::check_denominator("face_width", value)?;
                self.reference.face_width = value;
                self.step = CalibrationStep::AwaitMinWidth;
                debug!(face_width = value, "Captured reference face width");
            }
            CalibrationStep::AwaitMinWidth => {
                self.reference.min_width = geometry.raw_mouth_width(landmarks);
                self.step = CalibrationStep::AwaitMaxWidth;
                debug!(min_width = self.reference.min_width, "Captured min mouth width");
            }
            CalibrationStep::AwaitMaxWidth => {
                let value = geometry.raw_mouth_width(landmarks);
                Self::check_denominator("max_width", value)?;
                self.reference.max_width = value;
                self.step = CalibrationStep::AwaitMinHeight;
                debug!(max_width = value, "Captured max mouth width");
            }
            CalibrationStep::AwaitMinHeight => {
                self.reference.min_height = geometry.raw_mouth_height(landmarks);
                self.step = CalibrationStep::AwaitMaxHeight;
                debug!(min_height = self.reference.min_height, "Captured min mouth height");
            }
            CalibrationStep::AwaitMaxHeight => {
                let value = geometry.raw_mouth_height(landmarks);
                Self::check_denominator("max_height", value)?;
                self.reference.max_height = value;
                self.step = CalibrationStep::Idle;
                self.complete = true;
                info!(reference = ?self.reference, "Calibration complete");
            }
        }

        Ok(self.step)
    }

    fn check_denominator(name: &str, value: f64) -> Result<(), GestureError> {
        if !value.is_finite() || value <= 0.0 {
            warn!(name, value, "Rejected capture that would zero out a range");
            return Err(GestureError::InvalidCalibration(format!(
                "captured {} must be finite and positive, got {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Load a calibration snapshot from JSON, rejecting degenerate references.
    pub fn from_json(json: &str) -> Result<Self, GestureError> {
        let calibration: Self = serde_json::from_str(json)?;
        calibration.reference.validate()?;
        Ok(calibration)
    }

    /// Serialize the calibration snapshot to JSON.
    pub fn to_json(&self) -> Result<String, GestureError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LandmarkMap, Point};

    fn make_landmarks(mouth_width: f64, mouth_height: f64, face_width: f64) -> LandmarkSet {
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

    #[test]
    fn test_full_cycle_in_fixed_order() {
        let geometry = Geometry::default();
        let mut calibration = Calibration::new();
        assert_eq!(calibration.step(), CalibrationStep::AwaitFaceWidth);
        assert!(!calibration.is_complete());

        let neutral = make_landmarks(45.0, 10.0, 150.0);
        let wide = make_landmarks(60.0, 12.0, 150.0);
        let open = make_landmarks(44.0, 55.0, 150.0);

        assert_eq!(
            calibration.advance(Some(&neutral), &geometry).unwrap(),
            CalibrationStep::AwaitMinWidth
        );
        assert_eq!(
            calibration.advance(Some(&neutral), &geometry).unwrap(),
            CalibrationStep::AwaitMaxWidth
        );
        assert_eq!(
            calibration.advance(Some(&wide), &geometry).unwrap(),
            CalibrationStep::AwaitMinHeight
        );
        assert_eq!(
            calibration.advance(Some(&neutral), &geometry).unwrap(),
            CalibrationStep::AwaitMaxHeight
        );
        assert_eq!(
            calibration.advance(Some(&open), &geometry).unwrap(),
            CalibrationStep::Idle
        );

        assert!(calibration.is_complete());
        let reference = calibration.reference();
        assert!((reference.face_width - 150.0).abs() < 1e-9);
        assert!((reference.min_width - 45.0).abs() < 1e-9);
        assert!((reference.max_width - 60.0).abs() < 1e-9);
        assert!((reference.min_height - 10.0).abs() < 1e-9);
        assert!((reference.max_height - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_face_retry_is_idempotent() {
        let geometry = Geometry::default();
        let mut calibration = Calibration::new();
        let before = *calibration.reference();

        // Repeated failed advances never change step or reference.
        for _ in 0..3 {
            let result = calibration.advance(None, &geometry);
            assert!(matches!(result, Err(GestureError::NoFaceDetected)));
            assert_eq!(calibration.step(), CalibrationStep::AwaitFaceWidth);
            assert_eq!(calibration.reference(), &before);
        }

        // A later advance with a face proceeds normally.
        let landmarks = make_landmarks(45.0, 10.0, 150.0);
        assert_eq!(
            calibration.advance(Some(&landmarks), &geometry).unwrap(),
            CalibrationStep::AwaitMinWidth
        );
    }

    #[test]
    fn test_zero_range_capture_rejected_without_transition() {
        let geometry = Geometry::default();
        let mut calibration = Calibration::new();
        let neutral = make_landmarks(45.0, 10.0, 150.0);

        calibration.advance(Some(&neutral), &geometry).unwrap();
        calibration.advance(Some(&neutral), &geometry).unwrap();
        assert_eq!(calibration.step(), CalibrationStep::AwaitMaxWidth);

        // A max-width capture of zero would make the normalizer divide by
        // zero; the step must stay put so the user can re-pose and retry.
        let degenerate = make_landmarks(0.0, 10.0, 150.0);
        let result = calibration.advance(Some(&degenerate), &geometry);
        assert!(matches!(result, Err(GestureError::InvalidCalibration(_))));
        assert_eq!(calibration.step(), CalibrationStep::AwaitMaxWidth);

        let wide = make_landmarks(60.0, 12.0, 150.0);
        assert_eq!(
            calibration.advance(Some(&wide), &geometry).unwrap(),
            CalibrationStep::AwaitMinHeight
        );
    }

    #[test]
    fn test_restart_clears_completeness() {
        let geometry = Geometry::default();
        let mut calibration =
            Calibration::precalibrated(CalibrationReference::default()).unwrap();
        assert!(calibration.is_complete());
        assert_eq!(calibration.step(), CalibrationStep::Idle);

        // Advancing from Idle restarts the cycle and drops the flag.
        assert_eq!(
            calibration.advance(None, &geometry).unwrap(),
            CalibrationStep::AwaitFaceWidth
        );
        assert!(!calibration.is_complete());
    }

    #[test]
    fn test_precalibrated_rejects_degenerate_reference() {
        let reference = CalibrationReference {
            max_width: 0.0,
            ..CalibrationReference::default()
        };
        assert!(Calibration::precalibrated(reference).is_err());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let geometry = Geometry::default();
        let mut calibration = Calibration::new();
        let neutral = make_landmarks(45.0, 10.0, 150.0);
        calibration.advance(Some(&neutral), &geometry).unwrap();

        let json = calibration.to_json().unwrap();
        let loaded = Calibration::from_json(&json).unwrap();
        assert_eq!(loaded.step(), calibration.step());
        assert_eq!(loaded.is_complete(), calibration.is_complete());
        assert_eq!(loaded.reference(), calibration.reference());
    }

    #[test]
    fn test_snapshot_load_rejects_degenerate_reference() {
        let json = r#"{
            "reference": {
                "face_width": 150.0,
                "min_width": 40.0,
                "max_width": 0.0,
                "min_height": 10.0,
                "max_height": 50.0
            },
            "step": "idle",
            "complete": true
        }"#;
        assert!(matches!(
            Calibration::from_json(json),
            Err(GestureError::InvalidCalibration(_))
        ));
    }
}

//! Core types for the Facetone pipeline
//!
//! This module defines the data that flows through each frame: raw landmark
//! positions from the detector, the semantic index map into them, and the
//! normalized gesture signal driving the modulators.

use serde::{Deserialize, Serialize};

use crate::error::GestureError;

/// Minimum landmark count a detector must deliver per face.
pub const MIN_LANDMARKS: usize = 68;

/// A single detector-reported 2D point, in detector units (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An ordered set of facial landmark points for one detected face.
///
/// Owned by the frame that produced it and superseded every frame. The set
/// is validated at construction to hold at least [`MIN_LANDMARKS`] points so
/// index lookups through a [`LandmarkMap`] cannot go out of bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    /// Build a landmark set, rejecting sets below the minimum count.
    pub fn from_points(points: Vec<Point>) -> Result<Self, GestureError> {
        if points.len() < MIN_LANDMARKS {
            return Err(GestureError::TooFewLandmarks {
                got: points.len(),
                needed: MIN_LANDMARKS,
            });
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    pub fn x(&self, index: usize) -> f64 {
        self.points[index].x
    }

    pub fn y(&self, index: usize) -> f64 {
        self.points[index].y
    }
}

/// One detected face. Only `landmarks` is consumed by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub landmarks: LandmarkSet,
}

impl Face {
    pub fn new(landmarks: LandmarkSet) -> Self {
        Self { landmarks }
    }
}

/// Semantic indices into a [`LandmarkSet`].
///
/// Only six of the 68 points are consumed. The defaults are the indices of
/// the 68-point layout produced by the face-landmark detectors this engine
/// was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkMap {
    pub mouth_left: usize,
    pub mouth_right: usize,
    pub mouth_top: usize,
    pub mouth_bottom: usize,
    pub face_left: usize,
    pub face_right: usize,
}

impl Default for LandmarkMap {
    fn default() -> Self {
        Self {
            mouth_left: 54,
            mouth_right: 48,
            mouth_top: 57,
            mouth_bottom: 51,
            face_left: 1,
            face_right: 13,
        }
    }
}

impl LandmarkMap {
    /// Largest index this map dereferences.
    pub fn max_index(&self) -> usize {
        self.mouth_left
            .max(self.mouth_right)
            .max(self.mouth_top)
            .max(self.mouth_bottom)
            .max(self.face_left)
            .max(self.face_right)
    }
}

/// The per-frame normalized gesture signal driving all modulators.
///
/// `width_pct` and `height_pct` are clamped to [0,1]. `face_delta_pct` is
/// unclamped: 0 when the detected face width equals the calibrated width,
/// positive when the user is closer to the camera, negative when farther.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureSignal {
    pub width_pct: f64,
    pub height_pct: f64,
    pub face_delta_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_set_rejects_short_input() {
        let result = LandmarkSet::from_points(vec![Point::new(0.0, 0.0); 10]);
        assert!(matches!(
            result,
            Err(GestureError::TooFewLandmarks { got: 10, needed: 68 })
        ));
    }

    #[test]
    fn test_landmark_set_accepts_full_input() {
        let set = LandmarkSet::from_points(vec![Point::new(1.0, 2.0); 68]).unwrap();
        assert_eq!(set.len(), 68);
        assert_eq!(set.x(54), 1.0);
        assert_eq!(set.y(54), 2.0);
    }

    #[test]
    fn test_default_map_fits_minimum_count() {
        let map = LandmarkMap::default();
        assert!(map.max_index() < MIN_LANDMARKS);
    }
}

//! Face detector contract
//!
//! The detector is an external collaborator: an opaque, possibly slow async
//! call returning zero or more faces for the live camera frame at call time.
//! Only the first face is ever consumed. The core never retries a failed
//! detection; errors propagate to the caller's frame scheduler.

use std::collections::VecDeque;

use crate::error::GestureError;
use crate::types::{Face, LandmarkSet};

/// Source of per-frame face detections.
///
/// `detect` is the pipeline's sole suspension point: a slow implementation
/// naturally throttles the frame rate instead of queueing a backlog.
#[allow(async_fn_in_trait)]
pub trait FaceDetector {
    async fn detect(&mut self) -> Result<Vec<Face>, GestureError>;
}

/// Detector that replays a pre-recorded sequence of frames.
///
/// Each queued entry is one frame: a landmark set, or `None` for a frame in
/// which no face was visible. Once the script runs out, every further call
/// reports no face. Used by the CLI replay harness and the test suite.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    frames: VecDeque<Option<LandmarkSet>>,
}

impl ScriptedDetector {
    pub fn new(frames: impl IntoIterator<Item = Option<LandmarkSet>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, frame: Option<LandmarkSet>) {
        self.frames.push_back(frame);
    }

    /// Frames left in the script.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FaceDetector for ScriptedDetector {
    async fn detect(&mut self) -> Result<Vec<Face>, GestureError> {
        match self.frames.pop_front().flatten() {
            Some(landmarks) => Ok(vec![Face::new(landmarks)]),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn landmarks() -> LandmarkSet {
        LandmarkSet::from_points(vec![Point::new(0.0, 0.0); 68]).unwrap()
    }

    #[tokio::test]
    async fn test_scripted_detector_replays_in_order() {
        let mut detector =
            ScriptedDetector::new([Some(landmarks()), None, Some(landmarks())]);
        assert_eq!(detector.remaining(), 3);

        assert_eq!(detector.detect().await.unwrap().len(), 1);
        assert!(detector.detect().await.unwrap().is_empty());
        assert_eq!(detector.detect().await.unwrap().len(), 1);

        // Past the end of the script there is no face.
        assert!(detector.detect().await.unwrap().is_empty());
    }
}

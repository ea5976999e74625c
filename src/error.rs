//! Error types for Facetone

use thiserror::Error;

/// Errors that can occur in the gesture pipeline
#[derive(Debug, Error)]
pub enum GestureError {
    #[error("No face detected")]
    NoFaceDetected,

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Detector failure: {0}")]
    Detector(String),

    #[error("Unknown modulator key: {0}")]
    UnknownModulator(String),

    #[error("Landmark set too small: got {got}, need at least {needed}")]
    TooFewLandmarks { got: usize, needed: usize },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

//! Pipeline orchestration
//!
//! This module provides the public per-frame API for Facetone. Each `step`
//! runs one activation cycle: request a detection, normalize the first
//! face's landmarks into a gesture signal, and route the signal to the
//! calibration machine or the selected modulator.
//!
//! Scheduling is the caller's job: await each step before requesting the
//! next, so a slow detector throttles the frame rate instead of queueing a
//! backlog.

use tracing::debug;

use crate::calibration::{Calibration, CalibrationStep};
use crate::detector::FaceDetector;
use crate::error::GestureError;
use crate::geometry::Geometry;
use crate::modulators::{ModulatorKey, ModulatorRegistry};
use crate::types::{GestureSignal, LandmarkSet};

/// Result of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// The detector saw no face this frame.
    NoFace,
    /// The signal computed from the first detected face.
    Signal(GestureSignal),
}

/// Visual mirror of the per-frame signal (e.g. an on-screen mouth box).
///
/// Driven every frame regardless of calibration state, so the user can see
/// the normalizer respond while calibrating.
pub trait SignalMirror {
    fn on_signal(&mut self, signal: &GestureSignal);
    fn on_no_face(&mut self);
}

/// The per-frame gesture pipeline.
///
/// Owns the detector, the normalizer, the calibration machine, and the
/// modulator registry. Live modulator dispatch is gated on a completed
/// calibration cycle and on the host surface holding input focus.
pub struct GesturePipeline<D: FaceDetector> {
    detector: D,
    geometry: Geometry,
    calibration: Calibration,
    registry: ModulatorRegistry,
    mirror: Option<Box<dyn SignalMirror>>,
    latest: Option<LandmarkSet>,
    focused: bool,
}

impl<D: FaceDetector> GesturePipeline<D> {
    pub fn new(detector: D, geometry: Geometry, registry: ModulatorRegistry) -> Self {
        Self {
            detector,
            geometry,
            calibration: Calibration::new(),
            registry,
            mirror: None,
            latest: None,
            focused: true,
        }
    }

    /// Replace the fresh calibration with an existing one (e.g. restored
    /// from a snapshot).
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_mirror(mut self, mirror: Box<dyn SignalMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn selected_modulator(&self) -> Option<ModulatorKey> {
        self.registry.selected()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Run one activation cycle against the live camera frame.
    ///
    /// The detection call is the sole suspension point. Detector errors
    /// propagate unretried; the caller's scheduling wrapper decides whether
    /// to keep requesting frames.
    pub async fn step(&mut self, now_ms: f64) -> Result<FrameOutcome, GestureError> {
        let faces = self.detector.detect().await?;

        let Some(face) = faces.into_iter().next() else {
            debug!("No face this frame");
            self.latest = None;
            if let Some(mirror) = self.mirror.as_mut() {
                mirror.on_no_face();
            }
            if self.live() {
                self.registry.face_lost(now_ms);
            }
            return Ok(FrameOutcome::NoFace);
        };

        let signal = self
            .geometry
            .signal(&face.landmarks, self.calibration.reference())?;

        // The mirror always sees the signal, calibrated or not.
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.on_signal(&signal);
        }
        self.latest = Some(face.landmarks);

        if self.live() {
            self.registry.dispatch(&signal, now_ms);
        }

        Ok(FrameOutcome::Signal(signal))
    }

    /// Advance the calibration cycle using the most recently seen face.
    pub fn advance_calibration(&mut self) -> Result<CalibrationStep, GestureError> {
        self.calibration
            .advance(self.latest.as_ref(), &self.geometry)
    }

    /// Report a host-surface focus change.
    ///
    /// Losing focus silences the active modulator immediately, independent
    /// of the next frame's outcome.
    pub fn set_focused(&mut self, focused: bool, now_ms: f64) {
        if self.focused && !focused {
            self.registry.silence_active(now_ms);
        }
        self.focused = focused;
    }

    /// Switch the selected modulator, silencing the outgoing one first.
    pub fn select_modulator(
        &mut self,
        key: ModulatorKey,
        now_ms: f64,
    ) -> Result<(), GestureError> {
        self.registry.select(key, now_ms)
    }

    fn live(&self) -> bool {
        self.calibration.is_complete() && self.focused
    }
}

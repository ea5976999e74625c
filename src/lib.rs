//! Facetone - Mouth-gesture audio engine
//!
//! Facetone turns a live stream of facial-landmark coordinates into a
//! continuous two-axis mouth gesture signal (openness and width, both
//! normalized 0-1) and routes it through a selectable output modulator
//! driving audible feedback: sustained notes, Morse-style dot/dash beeps,
//! or volume/rate modulation of pre-loaded audio clips.
//!
//! ## Modules
//!
//! - **Geometry**: pure normalization from raw landmarks to percentages
//! - **Calibration**: per-user reference capture state machine
//! - **Modulators**: stateful, debounced gesture consumers over audio seams
//! - **Pipeline**: the per-frame loop tying detector, normalizer, and the
//!   selected modulator together

pub mod audio;
pub mod calibration;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod modulators;
pub mod pipeline;
pub mod types;

pub use calibration::{Calibration, CalibrationReference, CalibrationStep};
pub use error::GestureError;
pub use geometry::Geometry;
pub use modulators::{Modulator, ModulatorKey, ModulatorRegistry};
pub use pipeline::{FrameOutcome, GesturePipeline, SignalMirror};
pub use types::{Face, GestureSignal, LandmarkMap, LandmarkSet, Point};

/// Facetone version embedded in snapshots and CLI output
pub const FACETONE_VERSION: &str = env!("CARGO_PKG_VERSION");

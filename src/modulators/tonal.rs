//! Tonal modulator
//!
//! Maps the two gesture axes onto a fixed 7x8 note grid: mouth width picks
//! the pitch letter, mouth openness picks the octave row. Every face frame
//! re-triggers the computed note; a lost face releases it.

use tracing::debug;

use crate::audio::NoteSynth;
use crate::types::GestureSignal;

use super::{Modulator, ModulatorKey};

/// Column symbols selected by `width_pct`.
pub const WIDTH_SYMBOLS: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

/// Row symbols selected by `height_pct`.
pub const HEIGHT_SYMBOLS: [&str; 8] = ["1", "2", "3", "4", "5", "6", "7", "8"];

/// Partition a 0-1 percentage into one of `len` equal buckets.
///
/// A percentage of exactly 1.0 lands in the last valid bucket rather than
/// one past the end.
fn bucket(pct: f64, len: usize) -> usize {
    ((pct * len as f64).floor() as usize).min(len - 1)
}

/// Derive the note identifier for a gesture signal. Deterministic: equal
/// signals always yield equal notes.
pub fn note_for(signal: &GestureSignal) -> String {
    let column = WIDTH_SYMBOLS[bucket(signal.width_pct, WIDTH_SYMBOLS.len())];
    let row = HEIGHT_SYMBOLS[bucket(signal.height_pct, HEIGHT_SYMBOLS.len())];
    format!("{}{}", column, row)
}

/// Modulator sustaining a synth note chosen from the gesture grid.
pub struct TonalModulator<S: NoteSynth> {
    synth: S,
    sounding: bool,
}

impl<S: NoteSynth> TonalModulator<S> {
    pub fn new(synth: S) -> Self {
        Self {
            synth,
            sounding: false,
        }
    }
}

impl<S: NoteSynth> Modulator for TonalModulator<S> {
    fn key(&self) -> ModulatorKey {
        ModulatorKey::Tones
    }

    fn on_signal(&mut self, signal: &GestureSignal, now_ms: f64) {
        let note = note_for(signal);
        debug!(note = note.as_str(), "Sustaining note");
        self.synth.attack(&note, now_ms);
        self.sounding = true;
    }

    fn on_face_lost(&mut self, now_ms: f64) {
        if self.sounding {
            self.synth.release(now_ms);
            self.sounding = false;
        }
    }

    fn silence(&mut self, now_ms: f64) {
        // Release regardless of the sounding flag; release is idempotent
        // and this is the stuck-note safety net.
        self.synth.release(now_ms);
        self.sounding = false;
    }
}

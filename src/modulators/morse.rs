//! Morse modulator
//!
//! Classifies open/close mouth gestures into dot and dash events by how long
//! the mouth stayed open, and sounds each event as a fixed-length beep.
//! Classification is edge-triggered: holding the mouth open or closed across
//! any number of frames fires nothing until the state actually flips.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::NoteSynth;
use crate::types::GestureSignal;

use super::{Modulator, ModulatorKey};

/// A classified open/close gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorseSymbol {
    Dot,
    Dash,
}

/// Thresholds for the open/close classifier and the beeps it produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorseConfig {
    /// `height_pct` above this latches the mouth open.
    pub open_threshold: f64,
    /// Open durations at or above this are dashes; shorter ones are dots.
    pub dash_ms: f64,
    /// Beep length for a dot.
    pub dot_tone_ms: f64,
    /// Beep length for a dash.
    pub dash_tone_ms: f64,
    /// Pitch of the beeps.
    pub tone: &'static str,
}

impl Default for MorseConfig {
    fn default() -> Self {
        Self {
            open_threshold: 0.3,
            dash_ms: 500.0,
            dot_tone_ms: 80.0,
            dash_tone_ms: 240.0,
            tone: "E5",
        }
    }
}

/// Edge-triggered open/close tracker.
///
/// Owns the latch and the open timestamp; emits at most one symbol per
/// open-then-close cycle, on the closing edge.
#[derive(Debug, Clone, Default)]
pub struct OpenCloseClassifier {
    opened: bool,
    last_opened_at: f64,
    last_closed_at: f64,
}

impl OpenCloseClassifier {
    /// Feed one frame's mouth openness. Returns a symbol only on the
    /// closing edge.
    pub fn update(
        &mut self,
        height_pct: f64,
        now_ms: f64,
        config: &MorseConfig,
    ) -> Option<MorseSymbol> {
        if !self.opened && height_pct > config.open_threshold {
            self.opened = true;
            self.last_opened_at = now_ms;
            return None;
        }

        if self.opened && height_pct <= config.open_threshold {
            self.opened = false;
            self.last_closed_at = now_ms;
            let duration_ms = self.last_closed_at - self.last_opened_at;
            let symbol = if duration_ms < config.dash_ms {
                MorseSymbol::Dot
            } else {
                MorseSymbol::Dash
            };
            debug!(?symbol, duration_ms, "Classified mouth gesture");
            return Some(symbol);
        }

        None
    }

    /// Drop an in-progress open gesture without emitting. Used when the
    /// face disappears mid-gesture: a duration measured against a vanished
    /// face would be fabricated.
    pub fn reset(&mut self) {
        self.opened = false;
    }

    pub fn opened(&self) -> bool {
        self.opened
    }
}

/// Modulator beeping a dot or dash for each open/close mouth gesture.
pub struct MorseModulator<S: NoteSynth> {
    synth: S,
    classifier: OpenCloseClassifier,
    config: MorseConfig,
}

impl<S: NoteSynth> MorseModulator<S> {
    pub fn new(synth: S, config: MorseConfig) -> Self {
        Self {
            synth,
            classifier: OpenCloseClassifier::default(),
            config,
        }
    }
}

impl<S: NoteSynth> Modulator for MorseModulator<S> {
    fn key(&self) -> ModulatorKey {
        ModulatorKey::Morse
    }

    fn on_signal(&mut self, signal: &GestureSignal, now_ms: f64) {
        if let Some(symbol) = self
            .classifier
            .update(signal.height_pct, now_ms, &self.config)
        {
            let duration_ms = match symbol {
                MorseSymbol::Dot => self.config.dot_tone_ms,
                MorseSymbol::Dash => self.config.dash_tone_ms,
            };
            self.synth
                .attack_release(self.config.tone, duration_ms, now_ms);
        }
    }

    fn on_face_lost(&mut self, _now_ms: f64) {
        self.classifier.reset();
    }

    fn silence(&mut self, now_ms: f64) {
        self.classifier.reset();
        self.synth.release(now_ms);
    }
}

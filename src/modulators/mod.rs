//! Gesture modulators
//!
//! A modulator is a named, stateful consumer of [`GestureSignal`]s that
//! drives an audio backend. Exactly one modulator is selected at a time;
//! switching the selection silences the outgoing modulator before the new
//! one receives its first signal, so no sustained tone or playing clip can
//! get stuck across a switch.

mod level;
mod morse;
mod tonal;
mod trigger;

pub use level::{LevelConfig, LevelModulator};
pub use morse::{MorseConfig, MorseModulator, MorseSymbol, OpenCloseClassifier};
pub use tonal::{TonalModulator, HEIGHT_SYMBOLS, WIDTH_SYMBOLS};
pub use trigger::{TriggerConfig, TriggerModulator};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GestureError;
use crate::types::GestureSignal;

/// Stable modulator identifier, decoupled from any display glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModulatorKey {
    Tones,
    Morse,
    ClipLevel,
    ClipTrigger,
}

impl ModulatorKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModulatorKey::Tones => "tones",
            ModulatorKey::Morse => "morse",
            ModulatorKey::ClipLevel => "clip-level",
            ModulatorKey::ClipTrigger => "clip-trigger",
        }
    }
}

impl std::str::FromStr for ModulatorKey {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tones" => Ok(ModulatorKey::Tones),
            "morse" => Ok(ModulatorKey::Morse),
            "clip-level" => Ok(ModulatorKey::ClipLevel),
            "clip-trigger" => Ok(ModulatorKey::ClipTrigger),
            other => Err(GestureError::UnknownModulator(other.to_string())),
        }
    }
}

/// A stateful gesture consumer with audio side effects.
///
/// Implementations must be safely callable every frame and may not assume a
/// fixed call interval; the pipeline's frame spacing varies with detector
/// latency. All timing decisions use the caller-supplied frame clock.
pub trait Modulator {
    fn key(&self) -> ModulatorKey;

    /// Consume one frame's gesture signal.
    fn on_signal(&mut self, signal: &GestureSignal, now_ms: f64);

    /// The current frame detected no face.
    fn on_face_lost(&mut self, _now_ms: f64) {}

    /// Stop all audible output: release sustained tones, pause clips.
    fn silence(&mut self, now_ms: f64);
}

/// Registry mapping stable keys to modulator instances, one selected.
#[derive(Default)]
pub struct ModulatorRegistry {
    entries: HashMap<ModulatorKey, Box<dyn Modulator>>,
    selected: Option<ModulatorKey>,
}

impl ModulatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a modulator under its own key. The first registration
    /// becomes the selection.
    pub fn insert(&mut self, modulator: Box<dyn Modulator>) {
        let key = modulator.key();
        self.entries.insert(key, modulator);
        if self.selected.is_none() {
            self.selected = Some(key);
        }
    }

    pub fn selected(&self) -> Option<ModulatorKey> {
        self.selected
    }

    /// Switch the selection, silencing the outgoing modulator first.
    ///
    /// Selecting an unregistered key fails and leaves the current selection
    /// (and its audio state) untouched.
    pub fn select(&mut self, key: ModulatorKey, now_ms: f64) -> Result<(), GestureError> {
        if !self.entries.contains_key(&key) {
            return Err(GestureError::UnknownModulator(key.as_str().to_string()));
        }
        if self.selected == Some(key) {
            return Ok(());
        }
        self.silence_active(now_ms);
        info!(key = key.as_str(), "Selected modulator");
        self.selected = Some(key);
        Ok(())
    }

    /// Forward a signal to the selected modulator.
    pub fn dispatch(&mut self, signal: &GestureSignal, now_ms: f64) {
        if let Some(modulator) = self.active_mut() {
            modulator.on_signal(signal, now_ms);
        }
    }

    /// Tell the selected modulator the face was lost this frame.
    pub fn face_lost(&mut self, now_ms: f64) {
        if let Some(modulator) = self.active_mut() {
            modulator.on_face_lost(now_ms);
        }
    }

    /// Silence the selected modulator's output.
    pub fn silence_active(&mut self, now_ms: f64) {
        if let Some(modulator) = self.active_mut() {
            debug!(key = modulator.key().as_str(), "Silencing modulator");
            modulator.silence(now_ms);
        }
    }

    fn active_mut(&mut self) -> Option<&mut Box<dyn Modulator>> {
        let key = self.selected?;
        self.entries.get_mut(&key)
    }
}

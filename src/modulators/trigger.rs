//! Trigger modulator
//!
//! Plays a clip from its start when the mouth opens past a threshold and
//! pauses it when the mouth closes again. The clip's own paused flag is the
//! latch, so holding the mouth open never restarts playback mid-clip.

use tracing::debug;

use crate::audio::AudioClip;
use crate::types::GestureSignal;

use super::{Modulator, ModulatorKey};

/// Tuning for the trigger modulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    /// `height_pct` above this starts the clip; at or below pauses it.
    pub threshold: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

/// One-shot clip player keyed to mouth openness.
pub struct TriggerModulator<C: AudioClip> {
    clip: C,
    config: TriggerConfig,
}

impl<C: AudioClip> TriggerModulator<C> {
    pub fn new(clip: C, config: TriggerConfig) -> Self {
        Self { clip, config }
    }
}

impl<C: AudioClip> Modulator for TriggerModulator<C> {
    fn key(&self) -> ModulatorKey {
        ModulatorKey::ClipTrigger
    }

    fn on_signal(&mut self, signal: &GestureSignal, _now_ms: f64) {
        if signal.height_pct > self.config.threshold {
            if self.clip.paused() {
                debug!("Triggering clip from start");
                self.clip.seek(0.0);
                self.clip.play();
            }
        } else if !self.clip.paused() {
            self.clip.pause();
        }
    }

    fn silence(&mut self, _now_ms: f64) {
        if !self.clip.paused() {
            self.clip.pause();
        }
    }
}

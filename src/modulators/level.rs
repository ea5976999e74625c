//! Level modulator
//!
//! Continuously maps mouth openness to clip volume and mouth width to
//! playback rate. A debounce pauses the clip once the openness has sat
//! still near zero for several frames, and resumes it on any fresh
//! movement, so sensor jitter cannot chatter the transport.

use tracing::debug;

use crate::audio::AudioClip;
use crate::geometry::clamp01;
use crate::types::GestureSignal;

use super::{Modulator, ModulatorKey};

/// Tuning for the level modulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelConfig {
    /// Volume gain applied to `height_pct` before clamping.
    pub gain: f64,
    /// Added to `width_pct` to form the playback rate.
    pub rate_offset: f64,
    /// Frame-to-frame height changes below this count as "still".
    pub low_delta: f64,
    /// Still frames required before a pause is considered.
    pub still_frames: u32,
    /// Pause only while the current height is below this.
    pub pause_floor: f64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            gain: 5.0,
            rate_offset: 0.8,
            low_delta: 0.1,
            still_frames: 4,
            pause_floor: 0.2,
        }
    }
}

/// Modulator driving a looping clip's volume and rate from the gesture.
pub struct LevelModulator<C: AudioClip> {
    clip: C,
    config: LevelConfig,
    last_height: f64,
    still_run: u32,
}

impl<C: AudioClip> LevelModulator<C> {
    pub fn new(mut clip: C, config: LevelConfig) -> Self {
        // Continuous modulation of a finite clip would silently stop at the
        // end of the file.
        clip.set_loop(true);
        Self {
            clip,
            config,
            last_height: 0.0,
            still_run: 0,
        }
    }
}

impl<C: AudioClip> Modulator for LevelModulator<C> {
    fn key(&self) -> ModulatorKey {
        ModulatorKey::ClipLevel
    }

    fn on_signal(&mut self, signal: &GestureSignal, _now_ms: f64) {
        let delta = (signal.height_pct - self.last_height).abs();
        if delta < self.config.low_delta {
            self.still_run += 1;
        } else {
            self.still_run = 0;
        }
        self.last_height = signal.height_pct;

        self.clip
            .set_volume(clamp01(signal.height_pct * self.config.gain));
        self.clip
            .set_playback_rate(signal.width_pct + self.config.rate_offset);

        let idle = self.still_run > self.config.still_frames
            && signal.height_pct < self.config.pause_floor;
        if idle {
            if !self.clip.paused() {
                debug!(still_run = self.still_run, "Pausing idle clip");
                self.clip.pause();
            }
        } else if self.clip.paused() {
            self.clip.play();
        }
    }

    fn silence(&mut self, _now_ms: f64) {
        if !self.clip.paused() {
            self.clip.pause();
        }
    }
}

//! Audio backend contracts
//!
//! The core never talks to an audio device directly; modulators drive one of
//! two backend seams:
//! - [`NoteSynth`] for sustained/timed tones addressed by note name
//! - [`AudioClip`] for pre-loaded clip playback with volume and rate control
//!
//! Backend calls carry no failure contract; faults inside a backend are the
//! backend's concern. Timestamps are scheduling hints in milliseconds on the
//! caller's frame clock.

/// A tone generator addressed by note identifier (e.g. `"C4"`).
pub trait NoteSynth {
    /// Start (or re-trigger) the given note.
    fn attack(&mut self, note: &str, at_ms: f64);

    /// Release whatever note is sounding. Must be idempotent.
    fn release(&mut self, at_ms: f64);

    /// Sound a note for a fixed duration.
    fn attack_release(&mut self, note: &str, duration_ms: f64, at_ms: f64) {
        self.attack(note, at_ms);
        self.release(at_ms + duration_ms);
    }
}

/// A pre-loaded audio clip with independent playback controls.
pub trait AudioClip {
    fn play(&mut self);
    fn pause(&mut self);
    fn paused(&self) -> bool;
    fn volume(&self) -> f64;
    /// Set playback volume; callers pass values already clamped to [0, 1].
    fn set_volume(&mut self, volume: f64);
    fn set_playback_rate(&mut self, rate: f64);
    /// Seek to a position in seconds from the start of the clip.
    fn seek(&mut self, seconds: f64);
    fn set_loop(&mut self, looped: bool);
}

//! Feedback sounds for resolved bubbles
//!
//! Playback is fire-and-forget: a sink that fails (autoplay policy, missing
//! asset) is logged and otherwise ignored.

use crate::error::HostError;
use crate::settings::EngineSettings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Answer dropped on the statement was right
    Correct,
    /// Answer dropped on the statement was wrong
    Incorrect,
}

/// Something that can start playing a sound from a URL
pub trait AudioSink {
    fn play(&mut self, url: &str, volume: f32) -> Result<(), HostError>;
}

/// Sink that plays nothing (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn play(&mut self, _url: &str, _volume: f32) -> Result<(), HostError> {
        Ok(())
    }
}

/// Audio manager for feedback sounds
#[derive(Debug)]
pub struct AudioManager<A> {
    sink: A,
    correct_url: String,
    incorrect_url: String,
    master_volume: f32,
    muted: bool,
}

impl<A: AudioSink> AudioManager<A> {
    pub fn new(sink: A, settings: &EngineSettings) -> Self {
        Self {
            sink,
            correct_url: settings.correct_sound_url.clone(),
            incorrect_url: settings.incorrect_sound_url.clone(),
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Play a sound effect, swallowing any failure
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let url = match effect {
            SoundEffect::Correct => &self.correct_url,
            SoundEffect::Incorrect => &self.incorrect_url,
        };
        if let Err(e) = self.sink.play(url, vol) {
            log::warn!("Feedback sound {:?} failed ({}): {}", effect, url, e);
        }
    }

    pub fn sink(&self) -> &A {
        &self.sink
    }
}

//! Engine settings
//!
//! Loaded from a JSON file alongside the video; every field is optional and
//! falls back to the defaults below.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{COLLISION_THRESHOLD, SKIP_THRESHOLD_MS};
use crate::error::Result;

/// Which due bubbles a normal (non-skip) tick may release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DuePolicy {
    /// Only the earliest unseen bubble is checked per tick
    #[default]
    HeadOnly,
    /// Every unseen bubble at or before the current time is released
    AllDue,
}

impl DuePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuePolicy::HeadOnly => "head-only",
            DuePolicy::AllDue => "all-due",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "head-only" | "headonly" | "head" => Some(DuePolicy::HeadOnly),
            "all-due" | "alldue" | "all" => Some(DuePolicy::AllDue),
            _ => None,
        }
    }
}

/// Where the overlay places its bubbles, as fractions of the container
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayLayout {
    pub statement_anchor: Vec2,
    pub answer_anchors: [Vec2; 2],
    /// Statement bubble diameter (pixels)
    pub statement_size: f32,
    /// Answer bubble diameter (pixels)
    pub answer_size: f32,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            statement_anchor: Vec2::new(0.5, 0.3),
            answer_anchors: [Vec2::new(0.25, 0.75), Vec2::new(0.75, 0.75)],
            statement_size: 160.0,
            answer_size: 110.0,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    // === Scheduling ===
    /// Playback jumps larger than this count as a seek
    pub skip_threshold_ms: u64,
    pub due_policy: DuePolicy,
    /// Restart the session (and playback) when the video ends
    pub loop_playback: bool,

    // === Resolution ===
    /// Forgiveness margin (pixels) around the statement bubble
    pub collision_threshold: f32,
    /// Delay before reporting a correct answer and closing
    pub correct_close_delay_ms: f64,
    /// Delay before reporting a wrong answer and closing
    pub incorrect_close_delay_ms: f64,
    /// Duration of the absorb-into-statement animation
    pub absorb_animation_ms: f64,
    /// Duration of the wrong-answer shake
    pub shake_duration_ms: f64,

    // === Layout ===
    pub layout: OverlayLayout,
    /// Seed for the option placement shuffle (random when unset)
    pub rng_seed: Option<u64>,

    // === Audio ===
    pub correct_sound_url: String,
    pub incorrect_sound_url: String,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub muted: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            skip_threshold_ms: SKIP_THRESHOLD_MS,
            due_policy: DuePolicy::HeadOnly,
            loop_playback: false,

            collision_threshold: COLLISION_THRESHOLD,
            correct_close_delay_ms: 1000.0,
            incorrect_close_delay_ms: 1500.0,
            absorb_animation_ms: 400.0,
            shake_duration_ms: 500.0,

            layout: OverlayLayout::default(),
            rng_seed: None,

            correct_sound_url: "/sounds/correct.mp3".to_string(),
            incorrect_sound_url: "/sounds/incorrect.mp3".to_string(),
            master_volume: 0.8,
            muted: false,
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    /// Load settings from a file, falling back to defaults if it is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Settings file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Clamp values that would break the engine
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !self.collision_threshold.is_finite() || self.collision_threshold < 0.0 {
            self.collision_threshold = defaults.collision_threshold;
        }
        for delay in [
            &mut self.correct_close_delay_ms,
            &mut self.incorrect_close_delay_ms,
            &mut self.absorb_animation_ms,
            &mut self.shake_duration_ms,
        ] {
            if !delay.is_finite() || *delay < 0.0 {
                *delay = 0.0;
            }
        }
        self.master_volume = if self.master_volume.is_finite() {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            defaults.master_volume
        };
        if self.correct_sound_url.is_empty() {
            self.correct_sound_url = defaults.correct_sound_url;
        }
        if self.incorrect_sound_url.is_empty() {
            self.incorrect_sound_url = defaults.incorrect_sound_url;
        }
        if !(self.layout.statement_size > 0.0) {
            self.layout.statement_size = defaults.layout.statement_size;
        }
        if !(self.layout.answer_size > 0.0) {
            self.layout.answer_size = defaults.layout.answer_size;
        }
        self
    }
}

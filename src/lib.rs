//! Bubble Timeline - interactive question bubbles over a playing video
//!
//! Core modules:
//! - `sim`: Pure physics for the draggable bubbles (integration, bounce, flick, collision)
//! - `drag`: Per-object drag controller driven by pointer gestures
//! - `resolution`: Answer evaluation and win/lose animations
//! - `overlay`: Mount/unmount of the blocking question layer
//! - `queue`: Single-flight presentation state machine (pause/resume contract)
//! - `scheduler`: Playback clock observation and due-bubble detection
//! - `engine`: Composition root the host player talks to

pub mod audio;
pub mod drag;
pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod overlay;
pub mod platform;
pub mod queue;
pub mod resolution;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod timer;

pub use engine::{EngineEvent, SessionScore, TimelineEngine};
pub use error::{Error, HostError, Result};
pub use model::{Bubble, PlaybackClock, Video};
pub use settings::{DuePolicy, EngineSettings, OverlayLayout};

/// Engine configuration constants
pub mod consts {
    /// Velocity multiplier applied every physics step
    pub const FRICTION: f32 = 0.92;
    /// Fraction of velocity kept (and reflected) on a wall hit
    pub const BOUNCE_DAMPENING: f32 = 0.7;
    /// At or below this speed a bubble stops moving
    pub const MIN_VELOCITY: f32 = 0.3;
    /// Flick speed cap (pixels per frame)
    pub const MAX_VELOCITY: f32 = 25.0;

    /// Reference frame duration (60fps-equivalent) used to normalize flicks
    pub const FRAME_MS: f32 = 16.0;
    /// Elapsed-time floor for flick derivation (guards zero-duration drags)
    pub const MIN_FLICK_ELAPSED_MS: f32 = 16.0;

    /// Playback jumps larger than this are treated as a seek
    pub const SKIP_THRESHOLD_MS: u64 = 1500;
    /// Extra forgiveness (pixels) when dropping an answer near the statement
    pub const COLLISION_THRESHOLD: f32 = 10.0;
}

//! Host player and overlay surface interfaces
//!
//! The host owns the media element and the overlay's DOM/GPU surface. It
//! drives the engine by calling `TimelineEngine::on_time_update`, `on_ended`,
//! `on_frame` and `on_gesture`; the engine calls back through these traits.

use crate::error::HostError;
use crate::sim::Container;

/// Control surface of the underlying media player
pub trait HostPlayer {
    fn pause(&mut self) -> Result<(), HostError>;
    fn play(&mut self) -> Result<(), HostError>;
    fn current_time_ms(&self) -> u64;
    fn seek_to(&mut self, ms: u64) -> Result<(), HostError>;
    fn is_playing(&self) -> bool;
}

/// Pointer identifier assigned by the host input system
pub type PointerId = i32;

/// The overlay's drawing area and pointer capture
pub trait OverlaySurface {
    /// Current bounding size; read on every physics step
    fn container(&self) -> Container;
    fn capture_pointer(&mut self, pointer: PointerId) -> Result<(), HostError>;
    fn release_pointer(&mut self, pointer: PointerId) -> Result<(), HostError>;
}

//! Drag controller for a single bubble
//!
//! While a gesture is active the bubble follows the pointer with no physics.
//! On release it is flicked with the gesture velocity and handed to the
//! frame loop until friction stops it.

use glam::Vec2;

use crate::consts::MIN_VELOCITY;
use crate::host::{OverlaySurface, PointerId};
use crate::sim::{BubblePhysics, Container, clamp_to_container, flick_velocity, update_physics};
use crate::timer::{FrameHandle, FrameLoop};

/// What a bubble represents in the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRole {
    /// Fixed drop target showing the prompt
    Statement,
    /// Draggable candidate answer
    Answer { option_index: usize },
}

/// Visual state the renderer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualState {
    #[default]
    Resting,
    Dragging,
    /// Being pulled into the statement (correct answer)
    Absorbing,
    /// Flashing and shaking (wrong answer)
    Shaking,
}

/// A bubble on the overlay
#[derive(Debug, Clone)]
pub struct DragObject {
    pub role: DragRole,
    pub label: String,
    pub body: BubblePhysics,
    /// Diameter in pixels
    pub size: f32,
    /// Render scale (1.0 = full size)
    pub scale: f32,
    pub visual: VisualState,
}

impl DragObject {
    pub fn statement(label: impl Into<String>, center: Vec2, size: f32) -> Self {
        Self::new(DragRole::Statement, label, center, size)
    }

    pub fn answer(option_index: usize, label: impl Into<String>, center: Vec2, size: f32) -> Self {
        Self::new(DragRole::Answer { option_index }, label, center, size)
    }

    fn new(role: DragRole, label: impl Into<String>, center: Vec2, size: f32) -> Self {
        Self {
            role,
            label: label.into(),
            body: BubblePhysics::at(center),
            size,
            scale: 1.0,
            visual: VisualState::Resting,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.body.position
    }

    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn option_index(&self) -> Option<usize> {
        match self.role {
            DragRole::Answer { option_index } => Some(option_index),
            DragRole::Statement => None,
        }
    }
}

/// Emitted on every gesture end, whether or not the bubble ends up moving
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRelease {
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct ActiveGesture {
    pointer: PointerId,
    start_pos: Vec2,
    start_ms: f64,
}

/// Owns one bubble's live position and velocity
#[derive(Debug, Clone)]
pub struct DragController {
    slot: usize,
    object: DragObject,
    gesture: Option<ActiveGesture>,
    locked: bool,
    frame: Option<FrameHandle>,
}

impl DragController {
    /// `slot` identifies this controller in the overlay's frame loop
    pub fn new(slot: usize, object: DragObject) -> Self {
        Self {
            slot,
            object,
            gesture: None,
            locked: false,
            frame: None,
        }
    }

    pub fn object(&self) -> &DragObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut DragObject {
        &mut self.object
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn pointer(&self) -> Option<PointerId> {
        self.gesture.map(|g| g.pointer)
    }

    fn accepts_input(&self) -> bool {
        !self.locked && self.object.role != DragRole::Statement
    }

    /// Begin a drag. Returns false if the gesture was ignored.
    pub fn on_gesture_start<S: OverlaySurface + ?Sized>(
        &mut self,
        pointer: PointerId,
        position: Vec2,
        now_ms: f64,
        surface: &mut S,
        frames: &mut FrameLoop<usize>,
    ) -> bool {
        if !self.accepts_input() || self.gesture.is_some() {
            return false;
        }

        if let Err(e) = surface.capture_pointer(pointer) {
            log::debug!("Pointer capture failed for {}: {}", pointer, e);
        }
        if let Some(handle) = self.frame.take() {
            frames.cancel(handle);
        }
        self.object.body.freeze();
        self.object.visual = VisualState::Dragging;
        self.gesture = Some(ActiveGesture {
            pointer,
            start_pos: position,
            start_ms: now_ms,
        });
        true
    }

    /// Follow the pointer, clamped to the container interior
    pub fn on_gesture_move(&mut self, pointer: PointerId, position: Vec2, container: Container) -> bool {
        if !self.accepts_input() || self.pointer() != Some(pointer) {
            return false;
        }
        self.object.body.position = clamp_to_container(position, self.object.radius(), container);
        true
    }

    /// Release: flick and hand over to the frame loop if fast enough
    pub fn on_gesture_end<S: OverlaySurface + ?Sized>(
        &mut self,
        pointer: PointerId,
        position: Vec2,
        now_ms: f64,
        container: Container,
        surface: &mut S,
        frames: &mut FrameLoop<usize>,
    ) -> Option<DragRelease> {
        if !self.accepts_input() || self.pointer() != Some(pointer) {
            return None;
        }
        let gesture = self.gesture.take()?;
        if let Err(e) = surface.release_pointer(pointer) {
            log::debug!("Pointer release failed for {}: {}", pointer, e);
        }

        let body = &mut self.object.body;
        body.position = clamp_to_container(position, self.object.size / 2.0, container);
        let velocity = flick_velocity(gesture.start_pos, gesture.start_ms, position, now_ms);
        if velocity.length() > MIN_VELOCITY {
            body.velocity = velocity;
            body.is_moving = true;
            self.frame = Some(frames.request(self.slot));
        } else {
            body.freeze();
        }
        self.object.visual = VisualState::Resting;

        log::debug!(
            "Released {:?} at {:?} with velocity {:?}",
            self.object.role,
            body.position,
            velocity
        );
        Some(DragRelease {
            position: body.position,
            velocity,
        })
    }

    /// Abandon a gesture without a release notification
    pub fn on_gesture_cancel<S: OverlaySurface + ?Sized>(&mut self, pointer: PointerId, surface: &mut S) {
        if self.pointer() != Some(pointer) {
            return;
        }
        self.gesture = None;
        if let Err(e) = surface.release_pointer(pointer) {
            log::debug!("Pointer release failed for {}: {}", pointer, e);
        }
        self.object.visual = VisualState::Resting;
    }

    /// One physics frame. Skipped while dragged or locked.
    pub fn step(&mut self, container: Container, frames: &mut FrameLoop<usize>) -> bool {
        self.frame = None;
        if self.gesture.is_some() || self.locked {
            return false;
        }
        let radius = self.object.radius();
        let moving = update_physics(&mut self.object.body, radius, container);
        if moving {
            self.frame = Some(frames.request(self.slot));
        }
        moving
    }

    /// Stop accepting input and motion (resolution in progress)
    pub fn lock<S: OverlaySurface + ?Sized>(&mut self, surface: &mut S, frames: &mut FrameLoop<usize>) {
        self.locked = true;
        self.release(surface, frames);
        self.object.body.freeze();
    }

    /// Drop any gesture and pending frame (unmount)
    pub fn release<S: OverlaySurface + ?Sized>(&mut self, surface: &mut S, frames: &mut FrameLoop<usize>) {
        if let Some(gesture) = self.gesture.take() {
            if let Err(e) = surface.release_pointer(gesture.pointer) {
                log::debug!("Pointer release failed for {}: {}", gesture.pointer, e);
            }
        }
        if let Some(handle) = self.frame.take() {
            frames.cancel(handle);
        }
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame.is_some()
    }
}

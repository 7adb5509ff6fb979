//! Velocity integration, friction, wall bounce and flick derivation

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Motion state of one bubble
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BubblePhysics {
    /// Center position in container pixels
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_moving: bool,
}

impl BubblePhysics {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            is_moving: false,
        }
    }

    /// Stop all motion in place
    pub fn freeze(&mut self) {
        self.velocity = Vec2::ZERO;
        self.is_moving = false;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Overlay bounds (origin at top-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub width: f32,
    pub height: f32,
}

impl Container {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() / 2.0
    }

    /// Point from fractional coordinates (0..1 on each axis)
    pub fn at_fraction(&self, fraction: Vec2) -> Vec2 {
        self.size() * fraction
    }

    /// Too small (or not finite) to lay anything out in
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// One integration step: friction, then move
#[inline]
pub fn integrate(body: &mut BubblePhysics) {
    body.velocity *= FRICTION;
    body.position += body.velocity;
}

/// Keep one axis inside [radius, extent - radius], bouncing off the walls
fn bounce_axis(pos: &mut f32, vel: &mut f32, radius: f32, extent: f32) -> bool {
    if extent < radius * 2.0 {
        // Object larger than the container on this axis
        *pos = extent / 2.0;
        *vel = 0.0;
        return true;
    }
    if *pos - radius < 0.0 {
        *pos = radius;
        *vel = vel.abs() * BOUNCE_DAMPENING;
        true
    } else if *pos + radius > extent {
        *pos = extent - radius;
        *vel = -vel.abs() * BOUNCE_DAMPENING;
        true
    } else {
        false
    }
}

/// Clamp the body inside the container and reflect velocity on wall hits.
///
/// Returns true if any wall was hit.
pub fn apply_boundary(body: &mut BubblePhysics, radius: f32, container: Container) -> bool {
    let hit_x = bounce_axis(
        &mut body.position.x,
        &mut body.velocity.x,
        radius,
        container.width,
    );
    let hit_y = bounce_axis(
        &mut body.position.y,
        &mut body.velocity.y,
        radius,
        container.height,
    );
    hit_x || hit_y
}

/// Advance a moving body one frame.
///
/// Returns whether the body is still moving (i.e. the caller should request
/// another frame).
pub fn update_physics(body: &mut BubblePhysics, radius: f32, container: Container) -> bool {
    if !body.is_moving {
        return false;
    }

    integrate(body);
    apply_boundary(body, radius, container);

    if body.speed() <= MIN_VELOCITY {
        body.freeze();
    }
    body.is_moving
}

/// Scale a velocity down uniformly so its magnitude is at most `max`
#[inline]
pub fn clamp_velocity(velocity: Vec2, max: f32) -> Vec2 {
    let speed = velocity.length();
    if speed > max {
        velocity * (max / speed)
    } else {
        velocity
    }
}

/// Release velocity of a drag gesture, normalized to a 60fps frame and capped
pub fn flick_velocity(start: Vec2, start_ms: f64, end: Vec2, end_ms: f64) -> Vec2 {
    let elapsed = (end_ms - start_ms) as f32;
    let elapsed = if elapsed.is_finite() {
        elapsed.max(MIN_FLICK_ELAPSED_MS)
    } else {
        MIN_FLICK_ELAPSED_MS
    };

    let velocity = (end - start) / elapsed * FRAME_MS;
    if !velocity.is_finite() {
        return Vec2::ZERO;
    }
    clamp_velocity(velocity, MAX_VELOCITY)
}

/// Clamp a center point so a circle of `radius` stays inside the container
pub fn clamp_to_container(point: Vec2, radius: f32, container: Container) -> Vec2 {
    let clamp_axis = |v: f32, extent: f32| {
        if extent < radius * 2.0 {
            extent / 2.0
        } else {
            v.clamp(radius, extent - radius)
        }
    };
    Vec2::new(
        clamp_axis(point.x, container.width),
        clamp_axis(point.y, container.height),
    )
}

//! Bubble physics
//!
//! Pure and stateless: every function takes the body and container it works
//! on, so the same inputs always give the same motion.
//! - Velocities are in pixels per 60fps-equivalent frame
//! - The container is re-read by callers every step (it may resize)

pub mod collision;
pub mod physics;

pub use collision::{circles_collide, point_in_circle};
pub use physics::{
    BubblePhysics, Container, apply_boundary, clamp_to_container, clamp_velocity, flick_velocity,
    integrate, update_physics,
};

//! Circle collision tests
//!
//! Bubbles are circles: a drop counts when the dragged bubble's center lands
//! inside the statement circle grown by a forgiveness margin.

use glam::Vec2;

/// Whether two circles overlap.
///
/// `threshold` widens the test (the "dropped near the target" forgiveness).
/// Touching exactly at the combined radius is not a collision.
#[inline]
pub fn circles_collide(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32, threshold: f32) -> bool {
    a.distance(b) < radius_a + radius_b + threshold
}

/// Whether a point lies strictly inside a circle
#[inline]
pub fn point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    circles_collide(point, 0.0, center, radius, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_collide() {
        let a = Vec2::new(0.0, 0.0);
        assert!(circles_collide(a, 10.0, Vec2::new(15.0, 0.0), 10.0, 0.0));
        assert!(!circles_collide(a, 10.0, Vec2::new(25.0, 0.0), 10.0, 0.0));
        // Exactly touching is a miss
        assert!(!circles_collide(a, 10.0, Vec2::new(20.0, 0.0), 10.0, 0.0));
    }

    #[test]
    fn test_threshold_forgives_near_miss() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(0.0, 85.0);
        assert!(!circles_collide(a, 0.0, b, 80.0, 0.0));
        assert!(circles_collide(a, 0.0, b, 80.0, 10.0));
    }

    #[test]
    fn test_point_in_circle() {
        assert!(point_in_circle(Vec2::new(3.0, 4.0), Vec2::ZERO, 5.1));
        assert!(!point_in_circle(Vec2::new(3.0, 4.0), Vec2::ZERO, 5.0));
    }
}

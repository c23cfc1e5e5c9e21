//! Signed distance narrow phase
//!
//! Every footprint in the world is a circle or an axis-aligned box. Overlap is
//! decided by the signed distance from one shape's centre to the other.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collision footprint, centred on the body position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
}

impl Shape {
    /// Half-size of the axis-aligned bounding box
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rect { half_extents } => half_extents,
        }
    }

    /// Same shape scaled uniformly
    pub fn scaled(&self, factor: f32) -> Shape {
        match *self {
            Shape::Circle { radius } => Shape::Circle { radius: radius * factor },
            Shape::Rect { half_extents } => Shape::Rect { half_extents: half_extents * factor },
        }
    }
}

/// Signed distance to a circle
#[inline]
pub fn sd_circle(p: Vec2, center: Vec2, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// Signed distance to an axis-aligned box
#[inline]
pub fn sd_box(p: Vec2, center: Vec2, half_extents: Vec2) -> f32 {
    let d = (p - center).abs() - half_extents;
    d.max(Vec2::ZERO).length() + d.x.max(d.y).min(0.0)
}

/// Whether two placed shapes overlap (touching counts)
pub fn shapes_overlap(a_pos: Vec2, a: Shape, b_pos: Vec2, b: Shape) -> bool {
    match (a, b) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            sd_circle(a_pos, b_pos, rb) <= ra
        }
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            sd_box(a_pos, b_pos, half_extents) <= radius
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            sd_box(b_pos, a_pos, half_extents) <= radius
        }
        (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => {
            let d = (a_pos - b_pos).abs();
            d.x <= ha.x + hb.x && d.y <= ha.y + hb.y
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sd_circle() {
        assert!((sd_circle(Vec2::new(10.0, 0.0), Vec2::ZERO, 4.0) - 6.0).abs() < 1e-6);
        assert!(sd_circle(Vec2::new(1.0, 0.0), Vec2::ZERO, 4.0) < 0.0);
    }

    #[test]
    fn test_sd_box_outside_and_inside() {
        let half = Vec2::new(10.0, 5.0);
        assert!((sd_box(Vec2::new(13.0, 0.0), Vec2::ZERO, half) - 3.0).abs() < 1e-6);
        // Corner region uses euclidean distance
        assert!((sd_box(Vec2::new(13.0, 9.0), Vec2::ZERO, half) - 5.0).abs() < 1e-5);
        assert!((sd_box(Vec2::new(0.0, 4.0), Vec2::ZERO, half) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_circle_circle_overlap() {
        let a = Shape::Circle { radius: 5.0 };
        let b = Shape::Circle { radius: 5.0 };
        assert!(shapes_overlap(Vec2::ZERO, a, Vec2::new(9.9, 0.0), b));
        assert!(!shapes_overlap(Vec2::ZERO, a, Vec2::new(10.1, 0.0), b));
    }

    #[test]
    fn test_circle_rect_overlap_is_symmetric() {
        let circle = Shape::Circle { radius: 4.0 };
        let wall = Shape::Rect { half_extents: Vec2::new(25.0, 500.0) };
        let wall_pos = Vec2::new(-25.0, 500.0);
        assert!(shapes_overlap(Vec2::new(3.0, 200.0), circle, wall_pos, wall));
        assert!(shapes_overlap(wall_pos, wall, Vec2::new(3.0, 200.0), circle));
        assert!(!shapes_overlap(Vec2::new(5.0, 200.0), circle, wall_pos, wall));
    }

    #[test]
    fn test_scaled_shape() {
        let s = Shape::Circle { radius: 2.0 }.scaled(1.5);
        assert_eq!(s, Shape::Circle { radius: 3.0 });
        assert_eq!(s.half_extents(), Vec2::splat(3.0));
    }
}

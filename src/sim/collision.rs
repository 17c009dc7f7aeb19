//! Axis-aligned hitboxes
//!
//! Every entity collides as a rectangle centered on its position. Overlap is
//! strict: rectangles that only share an edge do not touch.

use glam::Vec2;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub min: Vec2,
    pub max: Vec2,
}

impl Hitbox {
    /// Rectangle of `size` centered on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap test
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// Anything with a position and a rectangular footprint
pub trait Collider {
    fn hitbox(&self) -> Hitbox;

    fn touches<C: Collider + ?Sized>(&self, other: &C) -> bool {
        self.hitbox().overlaps(&other.hitbox())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_edges() {
        let hb = Hitbox::centered(Vec2::new(100.0, 50.0), Vec2::new(40.0, 20.0));
        assert_eq!(hb.left(), 80.0);
        assert_eq!(hb.right(), 120.0);
        assert_eq!(hb.top(), 40.0);
        assert_eq!(hb.bottom(), 60.0);
        assert_eq!(hb.center(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_overlap() {
        let a = Hitbox::centered(Vec2::ZERO, Vec2::splat(10.0));
        let b = Hitbox::centered(Vec2::new(8.0, 8.0), Vec2::splat(10.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Hitbox::centered(Vec2::ZERO, Vec2::splat(10.0));
        let b = Hitbox::centered(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        assert!(!a.overlaps(&b));
    }
}

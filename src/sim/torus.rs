//! Toroidal world geometry
//!
//! The world is a `width × height` rectangle whose edges wrap. Every
//! positional delta takes the shortest path, which may cross an edge:
//! if |Δ| exceeds half the extent, the full extent is subtracted/added.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Extent of a wrapping world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Torus {
    pub width: f32,
    pub height: f32,
}

impl Torus {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    fn wrap_delta(d: f32, extent: f32) -> f32 {
        let half = extent / 2.0;
        if d > half {
            d - extent
        } else if d < -half {
            d + extent
        } else {
            d
        }
    }

    #[inline]
    fn wrap_coord(v: f32, extent: f32) -> f32 {
        let w = v.rem_euclid(extent);
        if w >= extent { 0.0 } else { w }
    }

    /// Shortest displacement from `from` to `to`
    #[inline]
    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            Self::wrap_delta(to.x - from.x, self.width),
            Self::wrap_delta(to.y - from.y, self.height),
        )
    }

    /// Squared toroidal distance
    #[inline]
    pub fn distance_squared(&self, a: Vec2, b: Vec2) -> f32 {
        self.delta(a, b).length_squared()
    }

    /// Toroidal distance
    #[inline]
    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        self.delta(a, b).length()
    }

    /// Heading (radians) of the shortest path from `from` to `to`
    #[inline]
    pub fn angle_to(&self, from: Vec2, to: Vec2) -> f32 {
        let d = self.delta(from, to);
        d.y.atan2(d.x)
    }

    /// Bring a position back into [0, width) × [0, height)
    #[inline]
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            Self::wrap_coord(p.x, self.width),
            Self::wrap_coord(p.y, self.height),
        )
    }

    /// Whether a position already lies inside the canonical rectangle
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        (0.0..self.width).contains(&p.x) && (0.0..self.height).contains(&p.y)
    }

    /// Translate `p` by `offset` and wrap the result
    #[inline]
    pub fn offset(&self, p: Vec2, offset: Vec2) -> Vec2 {
        self.wrap(p + offset)
    }
}

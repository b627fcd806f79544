//! 2D geometry for the visualization surface.
//!
//! Positions live in screen-like coordinates: `(0, 0)` is the top-left
//! corner and `(width, height)` the bottom-right one.

use serde::{Deserialize, Serialize};

/// A point on the visualization surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[inline]
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves toward `target` by at most `max_step`, never overshooting.
    #[must_use]
    pub fn step_toward(self, target: Self, max_step: f32) -> Self {
        let dist = self.distance_to(target);
        if dist <= max_step || dist <= f32::EPSILON {
            return target;
        }
        let t = max_step / dist;
        Self {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }

    /// Offsets the position by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Rectangular bounds of the visualization surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Surface width.
    pub width: f32,
    /// Surface height.
    pub height: f32,
}

impl Bounds {
    /// Creates new bounds.
    #[inline]
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Center of the surface.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    /// Returns true if `pos` lies inside the bounds (edges included).
    #[inline]
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        (0.0..=self.width).contains(&pos.x) && (0.0..=self.height).contains(&pos.y)
    }

    /// Clamps `pos` into the bounds.
    #[inline]
    #[must_use]
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(pos.x.clamp(0.0, self.width), pos.y.clamp(0.0, self.height))
    }

    /// Length of the shorter side.
    #[inline]
    #[must_use]
    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_toward_does_not_overshoot() {
        let from = Position::new(0.0, 0.0);
        let to = Position::new(3.0, 4.0);

        let half = from.step_toward(to, 2.5);
        assert!((half.x - 1.5).abs() < 1e-5);
        assert!((half.y - 2.0).abs() < 1e-5);

        assert_eq!(from.step_toward(to, 10.0), to);
    }

    #[test]
    fn test_clamp_into_bounds() {
        let bounds = Bounds::new(100.0, 50.0);
        let pos = bounds.clamp(Position::new(-5.0, 70.0));
        assert_eq!(pos, Position::new(0.0, 50.0));
        assert!(bounds.contains(pos));
    }
}

//! 2-D points in board space.

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use crate::snap::{is_aligned, snap_to_grid};

/// A point in two-dimensional board space, in millimeters.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    /// The x-coordinate of the point.
    pub x: f64,
    /// The y-coordinate of the point.
    pub y: f64,
}

impl Point {
    /// Creates a new [`Point`] from (x, y) coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the origin, `(0, 0)`.
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Snaps both coordinates to the nearest multiple of `resolution`.
    pub fn snap_to_grid(&self, resolution: f64) -> Self {
        Self {
            x: snap_to_grid(self.x, resolution),
            y: snap_to_grid(self.y, resolution),
        }
    }

    /// Returns `true` if both coordinates lie on the `resolution` grid.
    pub fn is_aligned(&self, resolution: f64) -> bool {
        is_aligned(self.x, resolution) && is_aligned(self.y, resolution)
    }

    /// Returns `true` if this point is within `epsilon` of `other` in both coordinates.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.abs_diff_eq(other, epsilon)
    }
}

impl AbsDiffEq for Point {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon) && self.y.abs_diff_eq(&other.y, epsilon)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

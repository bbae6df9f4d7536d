//! Axis-aligned bounding rectangles.

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// An axis-aligned rectangle, specified by its lower-left and upper-right corners.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    /// The lower-left corner.
    pub bl: Point,
    /// The upper-right corner.
    pub tr: Point,
}

impl Rect {
    /// Creates a new rectangle from its corners, normalizing so that `bl` is
    /// the lower-left corner and `tr` is the upper-right corner.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            bl: Point::new(a.x.min(b.x), a.y.min(b.y)),
            tr: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Returns `true` if `p` lies within this rectangle, inclusive of the boundary.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.bl.x && p.x <= self.tr.x && p.y >= self.bl.y && p.y <= self.tr.y
    }

    /// Returns a new rectangle inflated outward by `margin` on each side.
    pub fn inflate(&self, margin: f64) -> Self {
        Self {
            bl: Point::new(self.bl.x - margin, self.bl.y - margin),
            tr: Point::new(self.tr.x + margin, self.tr.y + margin),
        }
    }
}

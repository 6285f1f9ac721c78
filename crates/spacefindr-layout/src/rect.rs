//! Axis-aligned rectangles.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent, never negative.
    pub width: f64,
    /// Vertical extent, never negative.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its top-left corner and extents.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width times height.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the point lies inside; left and top edges are inclusive.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Area shared with `other`, 0 when they only touch or are disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    /// Split at `fraction` of the width into left and right parts.
    pub(crate) fn split_x(&self, fraction: f64) -> (Rect, Rect) {
        let first = self.width * fraction;
        (
            Rect::new(self.x, self.y, first, self.height),
            Rect::new(self.x + first, self.y, self.width - first, self.height),
        )
    }

    /// Split at `fraction` of the height into top and bottom parts.
    pub(crate) fn split_y(&self, fraction: f64) -> (Rect, Rect) {
        let first = self.height * fraction;
        (
            Rect::new(self.x, self.y, self.width, first),
            Rect::new(self.x, self.y + first, self.width, self.height - first),
        )
    }
}

/// An item positioned by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRect<T> {
    /// The caller's item.
    pub item: T,
    /// Where the item was placed.
    pub rect: Rect,
}

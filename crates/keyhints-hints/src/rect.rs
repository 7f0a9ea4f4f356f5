//! Axis-aligned rectangles in CSS pixels.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "rect_tests.rs"]
mod tests;

/// A client rect. `width` and `height` are always `right - left` and
/// `bottom - top`; they go negative for empty intersections.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn create(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            left: x1,
            top: y1,
            right: x2,
            bottom: y2,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Build from `[x1, y1, x2, y2]`.
    pub fn from_corners(corners: [f64; 4]) -> Self {
        Self::create(corners[0], corners[1], corners[2], corners[3])
    }

    pub fn translate(&self, x: f64, y: f64) -> Self {
        Self::create(self.left + x, self.top + y, self.right + x, self.bottom + y)
    }

    /// Parts of `self` not covered by `other`, as up to eight rects
    /// surrounding the covered region.
    pub fn subtract(&self, other: &Rect) -> Vec<Rect> {
        let inner = self.intersect(other);
        if inner.width < 0.0 || inner.height < 0.0 {
            return vec![*self];
        }

        let outer = self;
        [
            Rect::create(outer.left, outer.top, inner.left, inner.top),
            Rect::create(inner.left, outer.top, inner.right, inner.top),
            Rect::create(inner.right, outer.top, outer.right, inner.top),
            Rect::create(outer.left, inner.top, inner.left, inner.bottom),
            Rect::create(inner.right, inner.top, outer.right, inner.bottom),
            Rect::create(outer.left, inner.bottom, inner.left, outer.bottom),
            Rect::create(inner.left, inner.bottom, inner.right, outer.bottom),
            Rect::create(inner.right, inner.bottom, outer.right, outer.bottom),
        ]
        .into_iter()
        .filter(|r| r.width > 0.0 && r.height > 0.0)
        .collect()
    }

    /// Overlap with positive area. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.right > other.left
            && self.left < other.right
            && self.bottom > other.top
            && self.top < other.bottom
    }

    /// Overlap or shared edge.
    pub fn intersects_strict(&self, other: &Rect) -> bool {
        self.right >= other.left
            && self.left <= other.right
            && self.bottom >= other.top
            && self.top <= other.bottom
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect::create(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

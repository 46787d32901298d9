//! Plain screen-coordinate geometry.
//!
//! Coordinates follow the accessibility convention: origin at the top-left
//! of the primary display, y growing downward. All values are points.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self { Point { x, y } }
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self { Size { width, height } }
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    #[inline]
    pub fn min_x(&self) -> f64 { self.origin.x }

    #[inline]
    pub fn min_y(&self) -> f64 { self.origin.y }

    #[inline]
    pub fn max_x(&self) -> f64 { self.origin.x + self.size.width }

    #[inline]
    pub fn max_y(&self) -> f64 { self.origin.y + self.size.height }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// Area of the overlap with `other`, zero when disjoint.
    pub fn overlap_area(&self, other: &Rect) -> f64 {
        let w = self.max_x().min(other.max_x()) - self.min_x().max(other.min_x());
        let h = self.max_y().min(other.max_y()) - self.min_y().max(other.min_y());
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    /// Shrink by `d` on every edge.
    pub fn inset(&self, d: f64) -> Rect {
        Rect::new(
            self.origin.x + d,
            self.origin.y + d,
            (self.size.width - 2.0 * d).max(0.0),
            (self.size.height - 2.0 * d).max(0.0),
        )
    }

    /// Round all four components to integer points.
    pub fn round(&self) -> Rect {
        Rect::new(
            self.origin.x.round(),
            self.origin.y.round(),
            self.size.width.round(),
            self.size.height.round(),
        )
    }

    /// True when every component differs by less than `eps`.
    pub fn approx_eq(&self, other: &Rect, eps: f64) -> bool {
        (self.origin.x - other.origin.x).abs() < eps
            && (self.origin.y - other.origin.y).abs() < eps
            && (self.size.width - other.size.width).abs() < eps
            && (self.size.height - other.size.height).abs() < eps
    }

    /// Largest per-component distance to `other`, over origin and size.
    pub fn chebyshev_distance(&self, other: &Rect) -> f64 {
        (self.origin.x - other.origin.x)
            .abs()
            .max((self.origin.y - other.origin.y).abs())
            .max((self.size.width - other.size.width).abs())
            .max((self.size.height - other.size.height).abs())
    }

    /// Component-wise linear interpolation toward `to`.
    pub fn lerp(&self, to: &Rect, t: f64) -> Rect {
        Rect::new(
            self.origin.x + (to.origin.x - self.origin.x) * t,
            self.origin.y + (to.origin.y - self.origin.y) * t,
            self.size.width + (to.size.width - self.size.width) * t,
            self.size.height + (to.size.height - self.size.height) * t,
        )
    }
}

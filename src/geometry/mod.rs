//! Geometric primitives and algorithms.
//!
//! This module provides points, line segments, axis-aligned rectangles and
//! oriented-box fitting used throughout the reconstruction core.

mod oriented;
mod rect;

pub use oriented::{fit_oriented_box, OrientedBox};
pub use rect::{Rect, RelativePlacement};

use imageproc::drawing::BresenhamLineIter;
use serde::{Deserialize, Serialize};

use crate::core::{SchemeError, SchemeResult};

/// A 2D point with floating-point coordinates.
///
/// Points are geometric arguments only; regions never store them as
/// independent state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate (column axis).
    pub x: f32,
    /// Y-coordinate (row axis).
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance_to(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x, y)
    }
}

/// A straight line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// First endpoint.
    pub start: Point,
    /// Second endpoint.
    pub end: Point,
}

impl Line {
    /// Creates a segment, rejecting coincident endpoints.
    pub fn new(start: Point, end: Point) -> SchemeResult<Self> {
        if start == end {
            return Err(SchemeError::invalid_geometry(format!(
                "zero-length segment at ({}, {})",
                start.x, start.y
            )));
        }
        Ok(Self { start, end })
    }

    /// Segment length.
    #[inline]
    pub fn length(&self) -> f32 {
        self.start.distance_to(self.end)
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// Returns true when the segment is exactly vertical.
    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.start.x == self.end.x
    }

    /// Slope of the segment, `None` for vertical segments.
    pub fn slope(&self) -> Option<f32> {
        if self.is_vertical() {
            None
        } else {
            Some((self.end.y - self.start.y) / (self.end.x - self.start.x))
        }
    }

    /// Integer pixels covered by the segment, rasterized with Bresenham's
    /// algorithm.
    pub fn pixels(&self) -> Vec<(i32, i32)> {
        BresenhamLineIter::new((self.start.x, self.start.y), (self.end.x, self.end.y)).collect()
    }

    /// Bounds of the segment as `(top, left, bottom, right)` floats.
    pub fn envelope(&self) -> (f32, f32, f32, f32) {
        (
            self.start.y.min(self.end.y),
            self.start.x.min(self.end.x),
            self.start.y.max(self.end.y),
            self.start.x.max(self.end.x),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
    }

    #[test]
    fn test_zero_length_segment_rejected() {
        let p = Point::new(1.0, 2.0);
        assert!(Line::new(p, p).is_err());
    }

    #[test]
    fn test_line_metrics() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(0.0, 10.0)).unwrap();
        assert!(line.is_vertical());
        assert_eq!(line.slope(), None);
        assert_eq!(line.length(), 10.0);
        assert_eq!(line.midpoint(), Point::new(0.0, 5.0));

        let slanted = Line::new(Point::new(0.0, 0.0), Point::new(4.0, 2.0)).unwrap();
        assert_eq!(slanted.slope(), Some(0.5));
    }

    #[test]
    fn test_pixels_cover_endpoints() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(5.0, 0.0)).unwrap();
        let pixels = line.pixels();
        assert!(pixels.contains(&(0, 0)));
        assert!(pixels.contains(&(4, 0)));
    }

    #[test]
    fn test_envelope() {
        let line = Line::new(Point::new(8.0, 1.0), Point::new(2.0, 7.0)).unwrap();
        assert_eq!(line.envelope(), (1.0, 2.0, 7.0, 8.0));
    }
}

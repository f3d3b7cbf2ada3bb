//! Axis-aligned rectangular regions.
//!
//! [`Rect`] is the base geometric primitive of the crate. All regions of a
//! raster surface, from single connected components to merged super-panels,
//! are described by a rectangle with `top`, `left`, `bottom`, `right`
//! bounds. `right` and `bottom` are exclusive, so `width == right - left`
//! counts pixels.

use serde::{Deserialize, Serialize};

use crate::core::{SchemeError, SchemeResult};
use crate::geometry::{Line, Point};

/// Strict placement of one rectangle relative to another.
///
/// Each flag states where the *other* rectangle lies with respect to the
/// receiver, with no projection overlap on the relevant axis. Diagonal
/// placements set two flags, e.g. `above` and `left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativePlacement {
    /// The other rectangle lies strictly above.
    pub above: bool,
    /// The other rectangle lies strictly to the left.
    pub left: bool,
    /// The other rectangle lies strictly below.
    pub below: bool,
    /// The other rectangle lies strictly to the right.
    pub right: bool,
}

/// An axis-aligned rectangle with exclusive bottom/right bounds.
///
/// The coordinate tuple is the rectangle's identity: equality and hashing
/// use nothing else. Construction through [`Rect::new`] rejects inverted
/// and zero-area bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Top bound (inclusive).
    pub top: i32,
    /// Left bound (inclusive).
    pub left: i32,
    /// Bottom bound (exclusive).
    pub bottom: i32,
    /// Right bound (exclusive).
    pub right: i32,
}

impl Rect {
    /// Creates a rectangle, validating that it has positive area.
    ///
    /// # Errors
    ///
    /// Returns an invalid-geometry error when `top >= bottom` or
    /// `left >= right`.
    pub fn new(top: i32, left: i32, bottom: i32, right: i32) -> SchemeResult<Self> {
        if top >= bottom || left >= right {
            return Err(SchemeError::invalid_geometry(format!(
                "degenerate rectangle (top={top}, left={left}, bottom={bottom}, right={right})"
            )));
        }
        Ok(Self {
            top,
            left,
            bottom,
            right,
        })
    }

    /// Creates a rectangle from bounds that are known to be ordered.
    pub(crate) fn from_bounds(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        debug_assert!(top < bottom && left < right);
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Creates the smallest rectangle covering every rectangle in `rects`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when `rects` is empty.
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> SchemeResult<Self> {
        let mut iter = rects.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| SchemeError::invalid_input("cannot bound an empty set of rectangles"))?;
        let mut out = *first;
        for rect in iter {
            out.top = out.top.min(rect.top);
            out.left = out.left.min(rect.left);
            out.bottom = out.bottom.max(rect.bottom);
            out.right = out.right.max(rect.right);
        }
        Ok(out)
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Area in pixels.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Perimeter length in pixels.
    #[inline]
    pub fn perimeter(&self) -> i32 {
        2 * (self.width() + self.height())
    }

    /// Width divided by height.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    /// Length of the diagonal.
    #[inline]
    pub fn diagonal_length(&self) -> f32 {
        (self.width() as f32).hypot(self.height() as f32)
    }

    /// Center point. May have fractional coordinates.
    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) as f32 / 2.0,
            (self.top + self.bottom) as f32 / 2.0,
        )
    }

    /// Integer pixel nearest to the center point.
    pub fn geometric_center(&self) -> (i32, i32) {
        let c = self.center();
        (c.x.round() as i32, c.y.round() as i32)
    }

    /// Returns true when `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// Returns true when the point lies inside this rectangle, bounds
    /// included.
    pub fn contains_point(&self, point: Point) -> bool {
        let horizontal = self.left as f32 <= point.x && point.x <= self.right as f32;
        let vertical = self.top as f32 <= point.y && point.y <= self.bottom as f32;
        horizontal && vertical
    }

    /// Returns true when the two rectangles share interior pixels.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.right.min(other.right) > self.left.max(other.left)
            && self.bottom.min(other.bottom) > self.top.max(other.top)
    }

    /// Returns true when any rasterized pixel of the segment lies inside
    /// this rectangle.
    pub fn overlaps_segment(&self, segment: &Line) -> bool {
        segment.pixels().into_iter().any(|(x, y)| {
            x >= self.left && x < self.right && y >= self.top && y < self.bottom
        })
    }

    /// Returns true when the two rectangles overlap once projected onto
    /// the vertical axis.
    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        self.bottom.min(other.bottom) > self.top.max(other.top)
    }

    /// The intersection rectangle, if the two rectangles overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let top = self.top.max(other.top);
        let left = self.left.max(other.left);
        let bottom = self.bottom.min(other.bottom);
        let right = self.right.min(other.right);
        if top < bottom && left < right {
            Some(Rect::from_bounds(top, left, bottom, right))
        } else {
            None
        }
    }

    /// Distance between the two center points.
    pub fn center_separation(&self, other: &Rect) -> f32 {
        self.center().distance_to(other.center())
    }

    /// Distance between the center point and `point`.
    pub fn center_separation_to_point(&self, point: Point) -> f32 {
        self.center().distance_to(point)
    }

    /// Classifies where `other` lies relative to this rectangle.
    pub fn placement_of(&self, other: &Rect) -> RelativePlacement {
        RelativePlacement {
            above: other.bottom < self.top,
            left: other.right < self.left,
            below: self.bottom < other.top,
            right: self.right < other.left,
        }
    }

    /// Distance between the nearest edges or corners of two rectangles.
    ///
    /// Overlapping rectangles have a separation of 0. Otherwise the pair's
    /// relative placement selects one of eight cases: a plain axis-aligned
    /// gap when the rectangles overlap on one axis, or the distance between
    /// the two facing corners when they are diagonal neighbours. The result
    /// is symmetric in the two rectangles.
    pub fn edge_separation(&self, other: &Rect) -> f32 {
        let placement = self.placement_of(other);
        let (t1, l1, b1, r1) = (
            self.top as f32,
            self.left as f32,
            self.bottom as f32,
            self.right as f32,
        );
        let (t2, l2, b2, r2) = (
            other.top as f32,
            other.left as f32,
            other.bottom as f32,
            other.right as f32,
        );
        match placement {
            RelativePlacement {
                above: true,
                left: true,
                ..
            } => (l1 - r2).hypot(t1 - b2),
            RelativePlacement {
                below: true,
                left: true,
                ..
            } => (l1 - r2).hypot(t2 - b1),
            RelativePlacement {
                below: true,
                right: true,
                ..
            } => (l2 - r1).hypot(t2 - b1),
            RelativePlacement {
                above: true,
                right: true,
                ..
            } => (l2 - r1).hypot(t1 - b2),
            RelativePlacement { left: true, .. } => l1 - r2,
            RelativePlacement { right: true, .. } => l2 - r1,
            RelativePlacement { below: true, .. } => t2 - b1,
            RelativePlacement { above: true, .. } => t1 - b2,
            _ => 0.0,
        }
    }

    /// Distance between the rectangle boundary and a point, 0 when the
    /// point lies inside.
    pub fn separation_to_point(&self, point: Point) -> f32 {
        let dx = (self.left as f32 - point.x)
            .max(point.x - self.right as f32)
            .max(0.0);
        let dy = (self.top as f32 - point.y)
            .max(point.y - self.bottom as f32)
            .max(0.0);
        dx.hypot(dy)
    }

    /// Intersection over union of the two rectangles.
    ///
    /// Disjoint rectangles yield exactly 0.0; identical rectangles yield
    /// exactly 1.0.
    pub fn compute_iou(&self, other: &Rect) -> f32 {
        match self.intersection(other) {
            None => 0.0,
            Some(inter) => {
                let inter_area = inter.area();
                let union = self.area() + other.area() - inter_area;
                inter_area as f32 / union as f32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(top: i32, left: i32, bottom: i32, right: i32) -> Rect {
        Rect::new(top, left, bottom, right).unwrap()
    }

    #[test]
    fn test_degenerate_rect_rejected() {
        assert!(Rect::new(10, 5, 10, 20).is_err());
        assert!(Rect::new(10, 5, 8, 20).is_err());
        assert!(Rect::new(0, 0, 5, 0).is_err());
    }

    #[test]
    fn test_basic_metrics() {
        let r = rect(10, 20, 30, 60);
        assert_eq!(r.width(), 40);
        assert_eq!(r.height(), 20);
        assert_eq!(r.area(), 800);
        assert_eq!(r.perimeter(), 120);
        assert_eq!(r.aspect_ratio(), 2.0);
        assert!((r.diagonal_length() - (40.0f32).hypot(20.0)).abs() < 1e-6);
        let c = r.center();
        assert_eq!((c.x, c.y), (40.0, 20.0));
    }

    #[test]
    fn test_containment_implies_overlap_and_zero_separation() {
        let outer = rect(0, 0, 100, 100);
        let inner = rect(10, 10, 50, 50);
        assert!(outer.contains(&inner));
        assert!(outer.overlaps(&inner));
        assert_eq!(outer.edge_separation(&inner), 0.0);
    }

    #[test]
    fn test_edge_separation_zero_iff_overlap() {
        let a = rect(0, 0, 10, 10);
        let overlapping = rect(5, 5, 15, 15);
        let disjoint = rect(20, 20, 30, 30);
        assert!(a.overlaps(&overlapping));
        assert_eq!(a.edge_separation(&overlapping), 0.0);
        assert!(!a.overlaps(&disjoint));
        assert!(a.edge_separation(&disjoint) > 0.0);
    }

    #[test]
    fn test_edge_separation_symmetric() {
        let cases = [
            (rect(0, 0, 10, 10), rect(30, 40, 50, 60)),
            (rect(0, 40, 10, 60), rect(30, 0, 50, 10)),
            (rect(0, 0, 10, 10), rect(0, 40, 10, 60)),
            (rect(0, 0, 10, 10), rect(40, 0, 60, 10)),
        ];
        for (a, b) in cases {
            assert_eq!(a.edge_separation(&b), b.edge_separation(&a));
        }
    }

    #[test]
    fn test_edge_separation_axis_gaps_and_corners() {
        let a = rect(0, 0, 10, 10);
        // Strictly right with vertical overlap: plain horizontal gap.
        assert_eq!(a.edge_separation(&rect(0, 25, 10, 35)), 15.0);
        // Strictly below: plain vertical gap.
        assert_eq!(a.edge_separation(&rect(22, 0, 30, 10)), 12.0);
        // Diagonal neighbour: corner to corner.
        let diag = rect(13, 14, 20, 20);
        assert_eq!(a.edge_separation(&diag), 3.0f32.hypot(4.0));
    }

    #[test]
    fn test_separation_to_point() {
        let r = rect(0, 0, 10, 10);
        assert_eq!(r.separation_to_point(Point::new(5.0, 5.0)), 0.0);
        assert_eq!(r.separation_to_point(Point::new(14.0, 5.0)), 4.0);
        assert_eq!(
            r.separation_to_point(Point::new(13.0, 14.0)),
            3.0f32.hypot(4.0)
        );
    }

    #[test]
    fn test_iou() {
        let a = rect(0, 0, 10, 10);
        let b = rect(0, 5, 10, 15);
        let disjoint = rect(50, 50, 60, 60);
        assert_eq!(a.compute_iou(&a), 1.0);
        assert_eq!(a.compute_iou(&disjoint), 0.0);
        // 50 shared pixels out of 150 total.
        assert!((a.compute_iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.compute_iou(&b), b.compute_iou(&a));
    }

    #[test]
    fn test_placement_of() {
        let a = rect(20, 20, 30, 30);
        let above_left = rect(0, 0, 10, 10);
        let placement = a.placement_of(&above_left);
        assert!(placement.above && placement.left);
        assert!(!placement.below && !placement.right);
    }

    #[test]
    fn test_overlaps_vertically() {
        let a = rect(0, 0, 10, 10);
        assert!(a.overlaps_vertically(&rect(5, 100, 15, 110)));
        assert!(!a.overlaps_vertically(&rect(10, 0, 20, 10)));
    }

    #[test]
    fn test_bounding() {
        let rects = [rect(0, 5, 10, 15), rect(2, 0, 20, 10)];
        let bound = Rect::bounding(rects.iter()).unwrap();
        assert_eq!(bound, rect(0, 0, 20, 15));
        let empty: [Rect; 0] = [];
        assert!(Rect::bounding(empty.iter()).is_err());
    }

    #[test]
    fn test_segment_overlap() {
        let r = rect(0, 0, 10, 10);
        let crossing = Line::new(Point::new(-5.0, 5.0), Point::new(15.0, 5.0)).unwrap();
        let outside = Line::new(Point::new(20.0, 0.0), Point::new(20.0, 30.0)).unwrap();
        assert!(r.overlaps_segment(&crossing));
        assert!(!r.overlaps_segment(&outside));
    }
}

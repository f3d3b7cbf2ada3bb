//! Oriented bounding-box fitting.
//!
//! Fits the minimum-area rotated rectangle around a point set using a
//! convex hull followed by rotating calipers. The fitted box recovers the
//! major-axis angle of elongated shapes such as reaction arrows.

use itertools::Itertools;

use std::f32::consts::PI;

use crate::geometry::Point;

/// A rotated rectangle fitted around a point set.
#[derive(Debug, Clone, Copy)]
pub struct OrientedBox {
    /// Center of the rectangle.
    pub center: Point,
    /// Extent along the fitted edge direction.
    pub width: f32,
    /// Extent along the perpendicular direction.
    pub height: f32,
    /// Angle of the fitted edge direction in degrees, anti-clockwise from
    /// the positive x-axis.
    pub angle: f32,
}

impl OrientedBox {
    /// Angle of the longer side in degrees, normalized to `(-90, 90]`.
    ///
    /// For an elongated shape this is the direction of its major axis.
    pub fn major_axis_angle(&self) -> f32 {
        let raw = if self.width >= self.height {
            self.angle
        } else {
            self.angle + 90.0
        };
        let mut angle = raw % 180.0;
        if angle > 90.0 {
            angle -= 180.0;
        } else if angle <= -90.0 {
            angle += 180.0;
        }
        angle
    }
}

/// Fits the minimum-area oriented box around `points`.
///
/// Point sets with fewer than 3 distinct hull points degrade to the
/// axis-aligned bounding box with an angle of 0.
pub fn fit_oriented_box(points: &[Point]) -> OrientedBox {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return axis_aligned_fallback(points);
    }

    let mut min_area = f32::MAX;
    let mut best: Option<OrientedBox> = None;

    let n = hull.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let edge_x = hull[j].x - hull[i].x;
        let edge_y = hull[j].y - hull[i].y;
        let edge_length = edge_x.hypot(edge_y);
        if edge_length < f32::EPSILON {
            continue;
        }

        // Project every hull point onto the edge direction and its normal.
        let nx = edge_x / edge_length;
        let ny = edge_y / edge_length;
        let px = -ny;
        let py = nx;

        let mut min_n = f32::MAX;
        let mut max_n = f32::MIN;
        let mut min_p = f32::MAX;
        let mut max_p = f32::MIN;
        for point in &hull {
            let proj_n = nx * (point.x - hull[i].x) + ny * (point.y - hull[i].y);
            min_n = min_n.min(proj_n);
            max_n = max_n.max(proj_n);
            let proj_p = px * (point.x - hull[i].x) + py * (point.y - hull[i].y);
            min_p = min_p.min(proj_p);
            max_p = max_p.max(proj_p);
        }

        let width = max_n - min_n;
        let height = max_p - min_p;
        let area = width * height;
        if area < min_area {
            min_area = area;
            let center_n = (min_n + max_n) / 2.0;
            let center_p = (min_p + max_p) / 2.0;
            let center = Point::new(
                hull[i].x + center_n * nx + center_p * px,
                hull[i].y + center_n * ny + center_p * py,
            );
            best = Some(OrientedBox {
                center,
                width,
                height,
                angle: f32::atan2(ny, nx) * 180.0 / PI,
            });
        }
    }

    best.unwrap_or_else(|| axis_aligned_fallback(points))
}

/// Axis-aligned bounding box of the point set, angle 0.
fn axis_aligned_fallback(points: &[Point]) -> OrientedBox {
    let x_bounds = points.iter().map(|p| p.x).minmax().into_option();
    let y_bounds = points.iter().map(|p| p.y).minmax().into_option();
    match (x_bounds, y_bounds) {
        (Some((min_x, max_x)), Some((min_y, max_y))) => OrientedBox {
            center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            width: max_x - min_x,
            height: max_y - min_y,
            angle: 0.0,
        },
        _ => OrientedBox {
            center: Point::new(0.0, 0.0),
            width: 0.0,
            height: 0.0,
            angle: 0.0,
        },
    }
}

/// Convex hull of a point set via Graham's scan.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut points = points.to_vec();

    // Start from the lowest point, leftmost on ties.
    let mut start_idx = 0;
    for i in 1..points.len() {
        if points[i].y < points[start_idx].y
            || (points[i].y == points[start_idx].y && points[i].x < points[start_idx].x)
        {
            start_idx = i;
        }
    }
    points.swap(0, start_idx);
    let start = points[0];

    points[1..].sort_by(|a, b| {
        let cross = cross_product(start, *a, *b);
        if cross == 0.0 {
            let dist_a = (a.x - start.x).powi(2) + (a.y - start.y).powi(2);
            let dist_b = (b.x - start.x).powi(2) + (b.y - start.y).powi(2);
            dist_a
                .partial_cmp(&dist_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        } else if cross > 0.0 {
            std::cmp::Ordering::Less
        } else {
            std::cmp::Ordering::Greater
        }
    });

    let mut hull: Vec<Point> = Vec::new();
    for point in points {
        while hull.len() > 1
            && cross_product(hull[hull.len() - 2], hull[hull.len() - 1], point) <= 0.0
        {
            hull.pop();
        }
        hull.push(point);
    }
    hull
}

#[inline]
fn cross_product(p1: Point, p2: Point, p3: Point) -> f32 {
    (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_aligned_rectangle() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(40.0, 0.0),
            Point::new(40.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let fitted = fit_oriented_box(&points);
        let long = fitted.width.max(fitted.height);
        let short = fitted.width.min(fitted.height);
        assert!((long - 40.0).abs() < 1e-3);
        assert!((short - 10.0).abs() < 1e-3);
        assert!(fitted.major_axis_angle().abs() < 1e-3);
    }

    #[test]
    fn test_vertical_rectangle_major_axis() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 40.0),
            Point::new(0.0, 40.0),
        ];
        let fitted = fit_oriented_box(&points);
        assert!((fitted.major_axis_angle().abs() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotated_rectangle_angle() {
        // A 45-degree elongated point set.
        let points: Vec<Point> = (0..20)
            .flat_map(|i| {
                let t = i as f32;
                vec![Point::new(t, t), Point::new(t + 1.0, t), Point::new(t, t + 1.0)]
            })
            .collect();
        let fitted = fit_oriented_box(&points);
        assert!((fitted.major_axis_angle().abs() - 45.0).abs() < 2.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let two = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let fitted = fit_oriented_box(&two);
        assert_eq!(fitted.angle, 0.0);
        assert_eq!(fitted.width, 10.0);

        let empty: Vec<Point> = vec![];
        let fitted = fit_oriented_box(&empty);
        assert_eq!(fitted.width, 0.0);
    }
}

//! Reaction arrows.
//!
//! An [`Arrow`] couples a panel with its pixel contour, an optional fitted
//! line primitive, and a reference point biased toward the arrowhead. The
//! reference point disambiguates the product side during role assignment:
//! erosion of the non-symmetric arrow mask shifts the surviving centroid
//! toward the heavier (head) end.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{ArrowConfig, SchemeError, SchemeResult};
use crate::geometry::{fit_oriented_box, Line, Point, Rect};
use crate::surface::{Panel, Surface};

/// Kinds of reaction arrows.
///
/// The kinds differ in which optional attributes upstream detection
/// populates; directional scanning treats all of them identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrowKind {
    /// A plain solid arrow.
    Solid,
    /// A pair of half-headed arrows denoting equilibrium.
    Equilibrium,
    /// A double-headed resonance arrow.
    Resonance,
    /// A curved arrow.
    Curly,
}

/// A classified reaction arrow.
#[derive(Debug, Clone)]
pub struct Arrow {
    panel: Panel,
    kind: ArrowKind,
    line: Option<Line>,
    contour: Vec<Point>,
    reference_pt: Point,
}

impl PartialEq for Arrow {
    fn eq(&self, other: &Self) -> bool {
        self.panel == other.panel
    }
}

impl Eq for Arrow {}

impl std::hash::Hash for Arrow {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.panel.hash(state);
    }
}

impl Arrow {
    /// Creates an arrow from precomputed parts.
    ///
    /// # Errors
    ///
    /// Returns an invalid-geometry error when the contour is empty.
    pub fn from_parts(
        panel: Panel,
        kind: ArrowKind,
        line: Option<Line>,
        contour: Vec<Point>,
        reference_pt: Point,
    ) -> SchemeResult<Self> {
        if contour.is_empty() {
            return Err(SchemeError::invalid_geometry("arrow contour is empty"));
        }
        Ok(Self {
            panel,
            kind,
            line,
            contour,
            reference_pt,
        })
    }

    /// Creates an arrow from a classified panel, tracing the contour and
    /// computing the reference point from the surface.
    pub fn detect(
        panel: Panel,
        kind: ArrowKind,
        line: Option<Line>,
        fig: &Surface,
    ) -> SchemeResult<Self> {
        Self::detect_with_config(panel, kind, line, fig, &ArrowConfig::default())
    }

    /// Creates an arrow with an explicit reference-point configuration.
    pub fn detect_with_config(
        panel: Panel,
        kind: ArrowKind,
        line: Option<Line>,
        fig: &Surface,
        config: &ArrowConfig,
    ) -> SchemeResult<Self> {
        config.validate()?;
        let contour = trace_contour(&panel, fig)?;
        let reference_pt = compute_reference_point(&panel, fig, config);
        Self::from_parts(panel, kind, line, contour, reference_pt)
    }

    /// The arrow's panel.
    #[inline]
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// The arrow kind.
    #[inline]
    pub fn kind(&self) -> ArrowKind {
        self.kind
    }

    /// The fitted line primitive, if upstream detection produced one.
    #[inline]
    pub fn line(&self) -> Option<Line> {
        self.line
    }

    /// The arrow's pixel contour.
    #[inline]
    pub fn contour(&self) -> &[Point] {
        &self.contour
    }

    /// The reference point biased toward the product side.
    #[inline]
    pub fn reference_point(&self) -> Point {
        self.reference_pt
    }

    /// The arrow's bounding rectangle.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.panel.rect()
    }

    /// The arrow's geometric center.
    #[inline]
    pub fn center(&self) -> Point {
        self.panel.center()
    }

    /// Returns true when the fitted line is vertical, `None` without a
    /// line primitive.
    pub fn is_vertical(&self) -> Option<bool> {
        self.line.map(|line| line.is_vertical())
    }

    /// Angle of the arrow's major axis in degrees within `(-90, 90]`,
    /// recovered from the minimum-area box around its contour.
    pub fn fitted_angle(&self) -> f32 {
        fit_oriented_box(&self.contour).major_axis_angle()
    }
}

/// Traces the outer contour of the panel's pixel mask.
fn trace_contour(panel: &Panel, fig: &Surface) -> SchemeResult<Vec<Point>> {
    let pixels = panel.pixels(fig);
    if pixels.is_empty() {
        return Err(SchemeError::invalid_geometry(
            "arrow panel resolves to no pixels",
        ));
    }

    let left = panel.left();
    let top = panel.top();
    let mut mask = GrayImage::new(panel.width() as u32, panel.height() as u32);
    for &(x, y) in pixels {
        mask.put_pixel(x - left as u32, y - top as u32, Luma([255]));
    }

    let contours = find_contours::<i32>(&mask);
    let outline = contours
        .into_iter()
        .max_by_key(|c| c.points.len())
        .ok_or_else(|| SchemeError::invalid_geometry("arrow mask has no contour"))?;

    Ok(outline
        .points
        .into_iter()
        .map(|p| Point::new((p.x + left) as f32, (p.y + top) as f32))
        .collect())
}

/// Computes the reference point of an arrow.
///
/// The arrow mask is rendered into a padded crop, upscaled by an integer
/// factor, and eroded with a 3x3 structuring element. Erosion of a
/// non-symmetric shape moves the surviving centroid toward the heavier
/// arrowhead end; the centroid is then mapped back through the upscale
/// factor and padding offsets into the arrow's own frame.
fn compute_reference_point(panel: &Panel, fig: &Surface, config: &ArrowConfig) -> Point {
    let pad = config.ref_pad;
    let scale = config.ref_upscale;

    let left = panel.left();
    let top = panel.top();
    let width = panel.width() as u32;
    let height = panel.height() as u32;

    let mut mask = GrayImage::new(width + 2 * pad, height + 2 * pad);
    for &(x, y) in panel.pixels(fig) {
        mask.put_pixel(x - left as u32 + pad, y - top as u32 + pad, Luma([255]));
    }

    let upscaled = imageops::resize(
        &mask,
        mask.width() * scale,
        mask.height() * scale,
        FilterType::Nearest,
    );
    let eroded = morphology::erode(&upscaled, Norm::LInf, config.ref_erosions);

    let mut sum_x = 0.0f32;
    let mut sum_y = 0.0f32;
    let mut count = 0u32;
    for (x, y, pixel) in eroded.enumerate_pixels() {
        if pixel[0] > 200 {
            sum_x += x as f32;
            sum_y += y as f32;
            count += 1;
        }
    }

    if count == 0 {
        warn!(
            "erosion removed every arrow pixel, falling back to the panel center"
        );
        return panel.center();
    }

    let cx = sum_x / count as f32 / scale as f32 - pad as f32;
    let cy = sum_y / count as f32 / scale as f32 - pad as f32;
    Point::new(cx + left as f32, cy + top as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect as IRect;

    fn arrow_surface() -> Surface {
        // A horizontal shaft with a heavy block head at the right end.
        let mut img = GrayImage::new(120, 60);
        draw_filled_rect_mut(&mut img, IRect::at(20, 28).of_size(40, 4), Luma([255]));
        draw_filled_rect_mut(&mut img, IRect::at(60, 24).of_size(12, 12), Luma([255]));
        Surface::new(img.clone(), img).unwrap()
    }

    #[test]
    fn test_detect_traces_contour() {
        let fig = arrow_surface();
        let panel = fig.connected_components()[0].clone();
        let arrow = Arrow::detect(panel, ArrowKind::Solid, None, &fig).unwrap();
        assert!(!arrow.contour().is_empty());
    }

    #[test]
    fn test_reference_point_biased_toward_head() {
        let fig = arrow_surface();
        let panel = fig.connected_components()[0].clone();
        let arrow = Arrow::detect(panel, ArrowKind::Solid, None, &fig).unwrap();
        let center = arrow.center();
        assert!(
            arrow.reference_point().x > center.x,
            "reference {:?} should sit right of center {:?}",
            arrow.reference_point(),
            center
        );
    }

    #[test]
    fn test_fitted_angle_horizontal() {
        let fig = arrow_surface();
        let panel = fig.connected_components()[0].clone();
        let arrow = Arrow::detect(panel, ArrowKind::Solid, None, &fig).unwrap();
        assert!(arrow.fitted_angle().abs() < 15.0);
    }

    #[test]
    fn test_empty_contour_rejected() {
        let rect = Rect::new(0, 0, 10, 10).unwrap();
        let result = Arrow::from_parts(
            Panel::new(rect),
            ArrowKind::Solid,
            None,
            Vec::new(),
            Point::new(0.0, 0.0),
        );
        assert!(result.is_err());
    }
}

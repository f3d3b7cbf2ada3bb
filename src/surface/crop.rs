//! Crops: surfaces that are views into a parent surface.
//!
//! A [`Crop`] owns a sub-image of a parent [`Surface`] together with the
//! clamped source rectangle and any padding applied after cropping. The
//! offsets give exact bidirectional coordinate mappers between the crop
//! frame and the parent frame.

use image::imageops;
use image::GrayImage;

use crate::core::{SchemeError, SchemeResult};
use crate::geometry::{Point, Rect};
use crate::surface::{Panel, Surface};

/// A rectangular view into a parent surface.
#[derive(Debug, Clone)]
pub struct Crop {
    surface: Surface,
    source_rect: Rect,
    pad_top: i32,
    pad_left: i32,
}

impl Crop {
    /// Crops `region` out of `parent`, clamping the region to the parent
    /// bounds first.
    ///
    /// # Errors
    ///
    /// Returns an invalid-geometry error when the clamped region is empty,
    /// i.e. the requested region lies entirely outside the parent.
    pub(crate) fn new(parent: &Surface, region: Rect) -> SchemeResult<Self> {
        let top = region.top.max(0);
        let left = region.left.max(0);
        let bottom = region.bottom.min(parent.height() as i32);
        let right = region.right.min(parent.width() as i32);
        if top >= bottom || left >= right {
            return Err(SchemeError::invalid_geometry(format!(
                "crop region ({}, {}, {}, {}) lies outside the surface",
                region.top, region.left, region.bottom, region.right
            )));
        }
        let source_rect = Rect::from_bounds(top, left, bottom, right);

        let width = (right - left) as u32;
        let height = (bottom - top) as u32;
        let img = imageops::crop_imm(parent.image(), left as u32, top as u32, width, height)
            .to_image();
        let raw = imageops::crop_imm(parent.raw_image(), left as u32, top as u32, width, height)
            .to_image();

        let mut surface = Surface::with_config(img, raw, parent.config.clone())?;
        surface.scaling_factor = parent.scaling_factor;

        Ok(Self {
            surface,
            source_rect,
            pad_top: 0,
            pad_left: 0,
        })
    }

    /// The cropped surface. Its connected components are labeled in the
    /// crop frame, padding included.
    #[inline]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The clamped source rectangle in parent coordinates.
    #[inline]
    pub fn source_rect(&self) -> Rect {
        self.source_rect
    }

    /// Padding applied after cropping, as `(top, left)`.
    #[inline]
    pub fn padding(&self) -> (i32, i32) {
        (self.pad_top, self.pad_left)
    }

    /// Panels of the crop's connected components.
    pub fn connected_components(&self) -> &[Panel] {
        self.surface.connected_components()
    }

    /// Pads the crop with `pad` background pixels on every side.
    ///
    /// Components labeled afterwards carry coordinates shifted by the
    /// padding amount; the recorded offsets keep [`Crop::to_parent_point`]
    /// and friends exact.
    pub fn pad(&mut self, pad: u32) {
        if pad == 0 {
            return;
        }
        let img = pad_image(self.surface.image(), pad);
        let raw = pad_image(self.surface.raw_image(), pad);
        self.surface.replace_buffers(img, raw);
        self.pad_top += pad as i32;
        self.pad_left += pad as i32;
    }

    /// Maps a point from the crop frame into the parent frame.
    pub fn to_parent_point(&self, point: Point) -> Point {
        Point::new(
            point.x + (self.source_rect.left - self.pad_left) as f32,
            point.y + (self.source_rect.top - self.pad_top) as f32,
        )
    }

    /// Maps a point from the parent frame into the crop frame.
    pub fn to_crop_point(&self, point: Point) -> Point {
        Point::new(
            point.x - (self.source_rect.left - self.pad_left) as f32,
            point.y - (self.source_rect.top - self.pad_top) as f32,
        )
    }

    /// Maps a rectangle from the crop frame into the parent frame.
    pub fn to_parent_rect(&self, rect: Rect) -> Rect {
        let dx = self.source_rect.left - self.pad_left;
        let dy = self.source_rect.top - self.pad_top;
        Rect::from_bounds(rect.top + dy, rect.left + dx, rect.bottom + dy, rect.right + dx)
    }

    /// Maps a rectangle from the parent frame into the crop frame.
    pub fn to_crop_rect(&self, rect: Rect) -> Rect {
        let dx = self.source_rect.left - self.pad_left;
        let dy = self.source_rect.top - self.pad_top;
        Rect::from_bounds(rect.top - dy, rect.left - dx, rect.bottom - dy, rect.right - dx)
    }

    /// Maps a panel from the crop frame into the parent frame, keeping its
    /// tags and role.
    pub fn to_parent_panel(&self, panel: &Panel) -> Panel {
        panel.translated(
            self.source_rect.left - self.pad_left,
            self.source_rect.top - self.pad_top,
        )
    }

    /// Maps a panel from the parent frame into the crop frame, keeping its
    /// tags and role.
    pub fn to_crop_panel(&self, panel: &Panel) -> Panel {
        panel.translated(
            self.pad_left - self.source_rect.left,
            self.pad_top - self.source_rect.top,
        )
    }
}

fn pad_image(img: &GrayImage, pad: u32) -> GrayImage {
    let mut out = GrayImage::new(img.width() + 2 * pad, img.height() + 2 * pad);
    imageops::replace(&mut out, img, pad as i64, pad as i64);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect as IRect;

    fn fixture() -> Surface {
        let mut img = GrayImage::new(200, 100);
        draw_filled_rect_mut(&mut img, IRect::at(50, 40).of_size(20, 10), Luma([255]));
        Surface::new(img.clone(), img).unwrap()
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let fig = fixture();
        let crop = fig.crop(Rect::new(-10, 150, 300, 400).unwrap()).unwrap();
        assert_eq!(crop.source_rect(), Rect::new(0, 150, 100, 200).unwrap());
        assert_eq!(crop.surface().width(), 50);
        assert_eq!(crop.surface().height(), 100);
    }

    #[test]
    fn test_crop_fully_outside_rejected() {
        let fig = fixture();
        assert!(fig.crop(Rect::new(0, 300, 50, 400).unwrap()).is_err());
    }

    #[test]
    fn test_point_round_trip_with_padding() {
        let fig = fixture();
        let mut crop = fig.crop(Rect::new(20, 30, 90, 120).unwrap()).unwrap();
        crop.pad(7);
        let parent = Point::new(55.0, 44.0);
        let in_crop = crop.to_crop_point(parent);
        assert_eq!(in_crop, Point::new(55.0 - 30.0 + 7.0, 44.0 - 20.0 + 7.0));
        let back = crop.to_parent_point(in_crop);
        assert_eq!(back, parent);
    }

    #[test]
    fn test_padded_components_map_back_exactly() {
        let fig = fixture();
        let mut crop = fig.crop(Rect::new(20, 30, 90, 120).unwrap()).unwrap();
        crop.pad(10);
        let components = crop.connected_components();
        assert_eq!(components.len(), 1);
        // In-crop coordinates carry the padding offset.
        assert_eq!(
            components[0].rect(),
            Rect::new(40 - 20 + 10, 50 - 30 + 10, 50 - 20 + 10, 70 - 30 + 10).unwrap()
        );
        // Mapping back through the crop reproduces the un-padded parent
        // coordinates exactly.
        let restored = crop.to_parent_panel(&components[0]);
        assert_eq!(restored.rect(), Rect::new(40, 50, 50, 70).unwrap());
    }

    #[test]
    fn test_rect_mappers_are_inverses() {
        let fig = fixture();
        let mut crop = fig.crop(Rect::new(10, 10, 90, 190).unwrap()).unwrap();
        crop.pad(3);
        let rect = Rect::new(42, 55, 61, 70).unwrap();
        assert_eq!(crop.to_parent_rect(crop.to_crop_rect(rect)), rect);
        assert_eq!(crop.to_crop_rect(crop.to_parent_rect(rect)), rect);
    }
}

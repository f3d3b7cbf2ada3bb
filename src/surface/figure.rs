//! Raster surfaces with lazy connected-component labeling.
//!
//! A [`Surface`] owns a working image buffer (background 0, foreground
//! bright) together with the raw image it was derived from. Connected
//! components are labeled on demand: the working image is binarized at the
//! configured threshold and labeled with 8-connectivity, producing one
//! [`Panel`] per component and a parallel `u32` label map the panels
//! resolve their pixel sets from.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::{SchemeError, SchemeResult, SurfaceConfig};
use crate::geometry::{Point, Rect};
use crate::surface::{Crop, Panel, PanelRole};

/// Label map produced by connected-component labeling.
pub type LabelMap = ImageBuffer<Luma<u32>, Vec<u32>>;

#[derive(Debug, Clone)]
pub(crate) struct Labeling {
    pub(crate) map: LabelMap,
    pub(crate) panels: Vec<Panel>,
}

/// A raster surface with lazily-labeled connected components.
#[derive(Debug, Clone)]
pub struct Surface {
    pub(crate) img: GrayImage,
    pub(crate) raw: GrayImage,
    pub(crate) scaling_factor: Option<f32>,
    pub(crate) labeling: once_cell::sync::OnceCell<Labeling>,
    pub(crate) config: SurfaceConfig,
}

impl Surface {
    /// Creates a surface from a working image and the raw image it was
    /// derived from.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for empty buffers.
    pub fn new(img: GrayImage, raw: GrayImage) -> SchemeResult<Self> {
        Self::with_config(img, raw, SurfaceConfig::default())
    }

    /// Creates a surface with an explicit configuration.
    pub fn with_config(img: GrayImage, raw: GrayImage, config: SurfaceConfig) -> SchemeResult<Self> {
        if img.width() == 0 || img.height() == 0 {
            return Err(SchemeError::invalid_input("surface image has zero extent"));
        }
        config.validate()?;
        Ok(Self {
            img,
            raw,
            scaling_factor: None,
            labeling: once_cell::sync::OnceCell::new(),
            config,
        })
    }

    /// The working image buffer.
    #[inline]
    pub fn image(&self) -> &GrayImage {
        &self.img
    }

    /// The raw image buffer.
    #[inline]
    pub fn raw_image(&self) -> &GrayImage {
        &self.raw
    }

    /// Width of the surface in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.img.width()
    }

    /// Height of the surface in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.img.height()
    }

    /// Length of the image diagonal.
    #[inline]
    pub fn diagonal(&self) -> f32 {
        (self.width() as f32).hypot(self.height() as f32)
    }

    /// Total image area in pixels.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Center of the surface.
    pub fn center(&self) -> Point {
        Point::new(self.width() as f32 / 2.0, self.height() as f32 / 2.0)
    }

    /// The rectangle covering the whole surface.
    pub fn bounding_box(&self) -> Rect {
        Rect::from_bounds(0, 0, self.height() as i32, self.width() as i32)
    }

    /// Scaling factor recorded by [`Surface::rescaled`], if any.
    #[inline]
    pub fn scaling_factor(&self) -> Option<f32> {
        self.scaling_factor
    }

    /// Panels of all connected components, labeled on first access.
    pub fn connected_components(&self) -> &[Panel] {
        &self.labeling().panels
    }

    /// The label map backing the connected components.
    pub fn label_map(&self) -> &LabelMap {
        &self.labeling().map
    }

    fn labeling(&self) -> &Labeling {
        self.labeling.get_or_init(|| self.compute_labeling())
    }

    fn compute_labeling(&self) -> Labeling {
        let threshold = self.config.bin_threshold;
        let mut binary = GrayImage::new(self.width(), self.height());
        for (src, dst) in self.img.pixels().zip(binary.pixels_mut()) {
            *dst = Luma([if src[0] > threshold { 255 } else { 0 }]);
        }

        let map = connected_components(&binary, Connectivity::Eight, Luma([0u8]));

        // Bounding box per label; BTreeMap keeps panel order deterministic.
        let mut bounds: BTreeMap<u32, (u32, u32, u32, u32)> = BTreeMap::new();
        for (x, y, label) in map.enumerate_pixels() {
            let tag = label[0];
            if tag == 0 {
                continue;
            }
            bounds
                .entry(tag)
                .and_modify(|(min_x, min_y, max_x, max_y)| {
                    *min_x = (*min_x).min(x);
                    *min_y = (*min_y).min(y);
                    *max_x = (*max_x).max(x);
                    *max_y = (*max_y).max(y);
                })
                .or_insert((x, y, x, y));
        }

        let total_area = self.area() as f32;
        let mut panels = Vec::with_capacity(bounds.len());
        for (tag, (min_x, min_y, max_x, max_y)) in bounds {
            let rect = Rect::from_bounds(
                min_y as i32,
                min_x as i32,
                max_y as i32 + 1,
                max_x as i32 + 1,
            );
            // A spurious component spanning the whole image sometimes
            // survives binarization.
            if rect.area() as f32 >= total_area * self.config.spurious_area_ratio {
                debug!(
                    tag,
                    area = rect.area(),
                    "discarding whole-image component"
                );
                continue;
            }
            panels.push(Panel::with_tags(rect, vec![tag]));
        }

        Labeling { map, panels }
    }

    /// Returns an isotropically rescaled copy whose smaller dimension
    /// equals `min_dim_to`, recording the scaling factor so panels can
    /// report coordinates in the original frame.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when `min_dim_to` is zero.
    pub fn rescaled(&self, min_dim_to: u32) -> SchemeResult<Surface> {
        if min_dim_to == 0 {
            return Err(SchemeError::invalid_input("min_dim_to must be positive"));
        }
        let min_dim = self.width().min(self.height());
        let factor = min_dim_to as f32 / min_dim as f32;
        let new_w = ((self.width() as f32) * factor).round().max(1.0) as u32;
        let new_h = ((self.height() as f32) * factor).round().max(1.0) as u32;
        let img = imageops::resize(&self.img, new_w, new_h, FilterType::Triangle);
        let raw = imageops::resize(&self.raw, new_w, new_h, FilterType::Triangle);
        let mut out = Surface::with_config(img, raw, self.config.clone())?;
        out.scaling_factor = Some(self.scaling_factor.unwrap_or(1.0) * factor);
        Ok(out)
    }

    /// Assigns `role` to every connected component that fully contains one
    /// of the given regions.
    pub fn set_roles(&mut self, regions: &[Rect], role: PanelRole) {
        // Force the labeling so get_mut below sees it.
        let _ = self.connected_components();
        if let Some(labeling) = self.labeling.get_mut() {
            for panel in &mut labeling.panels {
                if regions.iter().any(|region| panel.rect().contains(region)) {
                    panel.set_role(role);
                }
            }
        }
    }

    /// Zeroes the pixels of `panel` in the working image.
    pub fn mask_off(&mut self, panel: &Panel) {
        let pixels: Vec<(u32, u32)> = panel.pixels(self).to_vec();
        for (x, y) in pixels {
            self.img.put_pixel(x, y, Luma([0]));
        }
    }

    /// Creates a crop of this surface over `region`, clamped to the
    /// surface bounds.
    pub fn crop(&self, region: Rect) -> SchemeResult<Crop> {
        Crop::new(self, region)
    }

    /// Creates a crop of this surface and pads it by `pad` pixels on every
    /// side.
    pub fn padded_crop(&self, region: Rect, pad: u32) -> SchemeResult<Crop> {
        let mut crop = Crop::new(self, region)?;
        crop.pad(pad);
        Ok(crop)
    }

    /// Creates a crop of `region` grown by `extension` pixels on every
    /// side, clamped to the surface bounds.
    pub fn extended_crop(&self, region: Rect, extension: i32) -> SchemeResult<Crop> {
        let grown = Rect::new(
            region.top - extension,
            region.left - extension,
            region.bottom + extension,
            region.right + extension,
        )?;
        Crop::new(self, grown)
    }

    pub(crate) fn replace_buffers(&mut self, img: GrayImage, raw: GrayImage) {
        self.img = img;
        self.raw = raw;
        self.labeling = once_cell::sync::OnceCell::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect as IRect;

    fn surface_with_blobs(blobs: &[(i32, i32, u32, u32)]) -> Surface {
        let mut img = GrayImage::new(200, 100);
        for &(x, y, w, h) in blobs {
            draw_filled_rect_mut(&mut img, IRect::at(x, y).of_size(w, h), Luma([255]));
        }
        Surface::new(img.clone(), img).unwrap()
    }

    #[test]
    fn test_zero_extent_rejected() {
        let img = GrayImage::new(0, 0);
        assert!(Surface::new(img.clone(), img).is_err());
    }

    #[test]
    fn test_component_labeling() {
        let fig = surface_with_blobs(&[(10, 10, 20, 10), (100, 50, 30, 20)]);
        let components = fig.connected_components();
        assert_eq!(components.len(), 2);
        let rects: Vec<Rect> = components.iter().map(|p| p.rect()).collect();
        assert!(rects.contains(&Rect::new(10, 10, 20, 30).unwrap()));
        assert!(rects.contains(&Rect::new(50, 100, 70, 130).unwrap()));
    }

    #[test]
    fn test_whole_image_component_discarded() {
        let mut img = GrayImage::new(100, 100);
        draw_filled_rect_mut(&mut img, IRect::at(0, 0).of_size(100, 100), Luma([255]));
        let fig = Surface::new(img.clone(), img).unwrap();
        assert!(fig.connected_components().is_empty());
    }

    #[test]
    fn test_panel_pixels_resolve_from_label_map() {
        let fig = surface_with_blobs(&[(10, 10, 4, 3)]);
        let panel = fig.connected_components()[0].clone();
        let pixels = panel.pixels(&fig);
        assert_eq!(pixels.len(), 12);
        assert!(pixels.contains(&(10, 10)));
        assert!(pixels.contains(&(13, 12)));
    }

    #[test]
    fn test_contains_any_pixel_of_is_stricter_than_boxes() {
        // Two separated blobs; a composite panel box can overlap the second
        // blob's box without sharing any of its pixels.
        let mut img = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut img, IRect::at(10, 10).of_size(20, 4), Luma([255]));
        draw_filled_rect_mut(&mut img, IRect::at(34, 20).of_size(10, 4), Luma([255]));
        let fig = Surface::new(img.clone(), img).unwrap();
        let components = fig.connected_components();
        assert_eq!(components.len(), 2);
        // Composite panel over the union of the first component's box,
        // grown to overlap the second box without touching its pixels.
        let first = components[0].clone();
        let second = components[1].clone();
        let wide = Panel::with_tags(
            Rect::new(first.top(), first.left(), second.bottom(), second.right()).unwrap(),
            first.tags().to_vec(),
        );
        assert!(wide.rect().overlaps(&second.rect()));
        assert!(!wide.contains_any_pixel_of(&second, &fig));
    }

    #[test]
    fn test_rescaled_records_factor_and_round_trips() {
        let fig = surface_with_blobs(&[(20, 10, 40, 20)]);
        let scaled = fig.rescaled(200).unwrap();
        assert_eq!(scaled.scaling_factor(), Some(2.0));
        assert_eq!(scaled.width(), 400);
        assert_eq!(scaled.height(), 200);
        let panel = scaled.connected_components()[0].clone();
        let original = panel.in_original_frame(&scaled);
        // Bilinear resampling can blur edges by a pixel.
        assert!((original[0] - 10).abs() <= 1);
        assert!((original[1] - 20).abs() <= 1);
        assert!((original[2] - 30).abs() <= 1);
        assert!((original[3] - 60).abs() <= 1);
    }

    #[test]
    fn test_set_roles() {
        let mut fig = surface_with_blobs(&[(10, 10, 20, 10)]);
        let inner = Rect::new(12, 12, 18, 25).unwrap();
        fig.set_roles(&[inner], PanelRole::Diagram);
        assert_eq!(
            fig.connected_components()[0].role(),
            Some(PanelRole::Diagram)
        );
    }

    #[test]
    fn test_mask_off() {
        let mut fig = surface_with_blobs(&[(10, 10, 4, 3)]);
        let panel = fig.connected_components()[0].clone();
        fig.mask_off(&panel);
        assert_eq!(fig.image().get_pixel(11, 11)[0], 0);
    }
}

//! Tagged regions of a raster surface.
//!
//! A [`Panel`] is a rectangle bound to the surface it was detected on,
//! carrying the connected-component tags it is composed of and an optional
//! role assigned during classification. The panel resolves its exact pixel
//! set lazily from the surface's label map.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::{SchemeError, SchemeResult};
use crate::geometry::{Point, Rect};
use crate::surface::Surface;

/// Role assigned to a panel during segmentation and scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelRole {
    /// A reaction arrow.
    Arrow,
    /// Text belonging to a reaction-conditions region.
    ConditionsText,
    /// Text belonging to a species label.
    LabelText,
    /// A chemical structure diagram.
    Diagram,
    /// A solitary bond line or other diagram fragment.
    DiagramPart,
    /// A component too small to classify, usually noise.
    Tiny,
    /// A diagram acting as a reactant of a step.
    StepReactant,
    /// A diagram acting as a product of a step.
    StepProduct,
    /// Anything else.
    Other,
}

/// A rectangle bound to a raster surface.
///
/// Equality and hashing consider the coordinate tuple only; tags, role and
/// the cached pixel set do not participate.
#[derive(Debug, Clone)]
pub struct Panel {
    rect: Rect,
    tags: Vec<u32>,
    role: Option<PanelRole>,
    pixels: OnceCell<Vec<(u32, u32)>>,
}

impl PartialEq for Panel {
    fn eq(&self, other: &Self) -> bool {
        self.rect == other.rect
    }
}

impl Eq for Panel {}

impl std::hash::Hash for Panel {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rect.hash(state);
    }
}

impl Panel {
    /// Creates an untagged panel over the given rectangle.
    pub fn new(rect: Rect) -> Self {
        Self::with_tags(rect, Vec::new())
    }

    /// Creates a panel composed of the given connected-component tags.
    pub fn with_tags(rect: Rect, tags: Vec<u32>) -> Self {
        Self {
            rect,
            tags,
            role: None,
            pixels: OnceCell::new(),
        }
    }

    /// Creates a large panel covering every panel in `panels`, with the
    /// union of their tags.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when `panels` is empty.
    pub fn bounding(panels: &[Panel]) -> SchemeResult<Panel> {
        let rect = Rect::bounding(panels.iter().map(|p| &p.rect))?;
        let mut tags = Vec::new();
        for panel in panels {
            tags.extend_from_slice(&panel.tags);
        }
        Ok(Panel::with_tags(rect, tags))
    }

    /// The underlying rectangle.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Connected-component tags this panel is composed of.
    #[inline]
    pub fn tags(&self) -> &[u32] {
        &self.tags
    }

    /// Role assigned to the panel, if any.
    #[inline]
    pub fn role(&self) -> Option<PanelRole> {
        self.role
    }

    /// Assigns a role to the panel.
    pub fn set_role(&mut self, role: PanelRole) {
        self.role = Some(role);
    }

    /// Top bound of the panel rectangle.
    #[inline]
    pub fn top(&self) -> i32 {
        self.rect.top
    }

    /// Left bound of the panel rectangle.
    #[inline]
    pub fn left(&self) -> i32 {
        self.rect.left
    }

    /// Bottom bound of the panel rectangle.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.rect.bottom
    }

    /// Right bound of the panel rectangle.
    #[inline]
    pub fn right(&self) -> i32 {
        self.rect.right
    }

    /// Width of the panel rectangle.
    #[inline]
    pub fn width(&self) -> i32 {
        self.rect.width()
    }

    /// Height of the panel rectangle.
    #[inline]
    pub fn height(&self) -> i32 {
        self.rect.height()
    }

    /// Center of the panel rectangle.
    #[inline]
    pub fn center(&self) -> Point {
        self.rect.center()
    }

    /// Edge separation to another panel.
    #[inline]
    pub fn edge_separation(&self, other: &Panel) -> f32 {
        self.rect.edge_separation(&other.rect)
    }

    /// Center separation to another panel.
    #[inline]
    pub fn center_separation(&self, other: &Panel) -> f32 {
        self.rect.center_separation(&other.rect)
    }

    /// Returns true when the other panel's rectangle lies entirely within
    /// this panel's rectangle.
    #[inline]
    pub fn contains(&self, other: &Panel) -> bool {
        self.rect.contains(&other.rect)
    }

    /// Exact pixels of the panel, resolved lazily from the surface's label
    /// map using the panel's tags. Panels without tags resolve to an empty
    /// set.
    pub fn pixels(&self, fig: &Surface) -> &[(u32, u32)] {
        self.pixels.get_or_init(|| {
            if self.tags.is_empty() {
                return Vec::new();
            }
            let map = fig.label_map();
            let mut out = Vec::new();
            for (x, y, label) in map.enumerate_pixels() {
                if self.tags.contains(&label[0]) {
                    out.push((x, y));
                }
            }
            out
        })
    }

    /// Tests literal pixel-set intersection with another panel.
    ///
    /// Stricter than a bounding-box test: dilation during segmentation can
    /// make two panels' boxes overlap without their pixels touching.
    pub fn contains_any_pixel_of(&self, other: &Panel, fig: &Surface) -> bool {
        let own: HashSet<(u32, u32)> = self.pixels(fig).iter().copied().collect();
        other.pixels(fig).iter().any(|p| own.contains(p))
    }

    /// Merges every connected component of `fig` lying entirely within this
    /// panel into a single super-panel.
    ///
    /// Useful for composite panels produced by dilation and merging, where
    /// the merged box must be tightened back onto the raw components.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when the panel contains no
    /// components.
    pub fn merge_underlying(&self, fig: &Surface) -> SchemeResult<Panel> {
        let contained: Vec<Panel> = fig
            .connected_components()
            .iter()
            .filter(|cc| self.rect.contains(&cc.rect))
            .cloned()
            .collect();
        if contained.is_empty() {
            return Err(SchemeError::invalid_input(
                "panel contains no connected components to merge",
            ));
        }
        Panel::bounding(&contained)
    }

    /// Coordinates of the panel in the pre-scaling frame of `fig`, as
    /// `[top, left, bottom, right]`. When the surface was never rescaled
    /// the coordinates are returned unchanged.
    pub fn in_original_frame(&self, fig: &Surface) -> [i32; 4] {
        match fig.scaling_factor() {
            Some(factor) => [
                (self.rect.top as f32 / factor).round() as i32,
                (self.rect.left as f32 / factor).round() as i32,
                (self.rect.bottom as f32 / factor).round() as i32,
                (self.rect.right as f32 / factor).round() as i32,
            ],
            None => [
                self.rect.top,
                self.rect.left,
                self.rect.bottom,
                self.rect.right,
            ],
        }
    }

    /// Returns a copy of the panel translated by `(dx, dy)`, with a fresh
    /// pixel cache.
    pub(crate) fn translated(&self, dx: i32, dy: i32) -> Panel {
        let mut out = Panel::with_tags(
            Rect::from_bounds(
                self.rect.top + dy,
                self.rect.left + dx,
                self.rect.bottom + dy,
                self.rect.right + dx,
            ),
            self.tags.clone(),
        );
        out.role = self.role;
        out
    }
}

//! Raster surfaces, panels and crops.
//!
//! * [`Surface`] owns an image buffer and its lazily-computed
//!   connected-component labeling.
//! * [`Panel`] is a rectangle bound to a surface, tagged with the
//!   components it is composed of.
//! * [`Crop`] is a surface that is also a view into a parent surface, with
//!   exact coordinate mappers in both directions.

mod crop;
mod figure;
mod panel;

pub use crop::Crop;
pub use figure::{LabelMap, Surface};
pub use panel::{Panel, PanelRole};

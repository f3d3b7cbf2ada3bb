//! # rxnscheme
//!
//! Geometric reconstruction of machine-readable reaction schemes from the
//! output of a chemical-diagram segmentation pipeline.
//!
//! Upstream collaborators supply a raster surface with labeled connected
//! components plus classified arrow and diagram objects; this crate
//! performs the spatial reasoning that turns them into a directed scheme
//! graph:
//!
//! - **Spatial algebra**: axis-aligned regions bound to a raster surface,
//!   with overlap, separation and containment predicates.
//! - **Directional probing**: per-arrow scans that partition the nearby
//!   diagrams into reactant and product groups, with a multi-line
//!   fallback for schemes that wrap across print lines.
//! - **Graph assembly**: deduplicated reaction-step aggregation with JSON
//!   export and a single-path reaction-string rendering.
//!
//! ## Modules
//!
//! * [`core`] - Error handling and configuration
//! * [`geometry`] - Points, segments, rectangles, oriented-box fitting
//! * [`surface`] - Raster surfaces, panels and crops
//! * [`model`] - Arrows, diagrams, conditions and reaction steps
//! * [`probe`] - The directional role-probing engine
//! * [`graph`] - The exported scheme graph
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rxnscheme::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let img = image::GrayImage::new(800, 400);
//!     let fig = Surface::new(img.clone(), img)?;
//!
//!     // Upstream classification supplies arrows and diagrams.
//!     let arrows: Vec<Arrow> = Vec::new();
//!     let diagrams: Vec<Diagram> = Vec::new();
//!     let conditions: Vec<Conditions> = Vec::new();
//!
//!     let mut probe = RoleProbe::new(&fig, arrows, diagrams)?;
//!     probe.probe_all()?;
//!     probe.resolve_nodes();
//!
//!     let (_arrows, diagrams, steps) = probe.into_parts();
//!     let graph = SchemeGraph::from_steps(&steps, &diagrams, &conditions);
//!     println!("{}", graph.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod geometry;
pub mod graph;
pub mod model;
pub mod probe;
pub mod surface;

/// Prelude module for convenient imports.
///
/// Brings the types most callers need into scope with a single use
/// statement.
pub mod prelude {
    pub use crate::core::{
        ArrowConfig, ProbeConfig, SchemeConfig, SchemeError, SchemeResult, SurfaceConfig,
    };
    pub use crate::geometry::{Line, Point, Rect};
    pub use crate::graph::{NodeContent, SchemeGraph, SpeciesRecord};
    pub use crate::model::{
        Arrow, ArrowId, ArrowKind, Conditions, ConditionsDict, Diagram, DiagramId, Label,
        LabelKind, ReactionStep, SpeciesQuantity, StepId,
    };
    pub use crate::probe::RoleProbe;
    pub use crate::surface::{Crop, Panel, PanelRole, Surface};
}

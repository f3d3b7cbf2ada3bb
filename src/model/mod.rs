//! Domain models for reaction scheme elements.
//!
//! Arrows, diagrams, condition regions and reaction steps. Cross-references
//! between the models use index newtypes into the collections owned by the
//! probing stage, never owning pointers, so a diagram can list the steps it
//! participates in without keeping them alive.

mod arrow;
mod conditions;
mod diagram;
mod step;

pub use arrow::{Arrow, ArrowKind};
pub use conditions::{Conditions, ConditionsDict, SpeciesQuantity};
pub use diagram::{Diagram, Label, LabelKind};
pub use step::ReactionStep;

use serde::{Deserialize, Serialize};

/// Index of an arrow within a scheme's arrow collection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ArrowId(pub usize);

/// Index of a diagram within a scheme's diagram collection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DiagramId(pub usize);

/// Index of a reaction step within a scheme's step collection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StepId(pub usize);

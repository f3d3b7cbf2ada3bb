//! Reaction steps.

use crate::core::{SchemeError, SchemeResult};
use crate::model::{ArrowId, Diagram, DiagramId};

/// An elementary reaction step: one arrow with its reactant and product
/// groups.
///
/// Reactants and products are disjoint ordered groups of diagram ids. A
/// step may legitimately end up with an empty group under degraded
/// detection; [`ReactionStep::is_complete`] lets callers surface such
/// steps for review instead of silently treating them as finished.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionStep {
    arrow: ArrowId,
    reactants: Vec<DiagramId>,
    products: Vec<DiagramId>,
    single_line: bool,
}

impl ReactionStep {
    /// Creates a reaction step.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when a diagram appears in both
    /// groups.
    pub fn new(
        arrow: ArrowId,
        reactants: Vec<DiagramId>,
        products: Vec<DiagramId>,
        single_line: bool,
    ) -> SchemeResult<Self> {
        if reactants.iter().any(|id| products.contains(id)) {
            return Err(SchemeError::invalid_input(
                "reactant and product groups must be disjoint",
            ));
        }
        Ok(Self {
            arrow,
            reactants,
            products,
            single_line,
        })
    }

    /// The step's arrow.
    #[inline]
    pub fn arrow(&self) -> ArrowId {
        self.arrow
    }

    /// The reactant group.
    #[inline]
    pub fn reactants(&self) -> &[DiagramId] {
        &self.reactants
    }

    /// The product group.
    #[inline]
    pub fn products(&self) -> &[DiagramId] {
        &self.products
    }

    /// Whether the step's source layout lies on a single print line.
    #[inline]
    pub fn single_line(&self) -> bool {
        self.single_line
    }

    /// Every diagram participating in the step, reactants first.
    pub fn species(&self) -> impl Iterator<Item = DiagramId> + '_ {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .copied()
    }

    /// Returns true when the diagram belongs to either group.
    pub fn contains_diagram(&self, id: DiagramId) -> bool {
        self.reactants.contains(&id) || self.products.contains(&id)
    }

    /// Returns true when both groups are populated. Incomplete steps are
    /// recorded rather than dropped and should be surfaced for review.
    pub fn is_complete(&self) -> bool {
        !self.reactants.is_empty() && !self.products.is_empty()
    }

    /// Removes a diagram from whichever group holds it. Returns true when
    /// a removal happened.
    pub(crate) fn remove_diagram(&mut self, id: DiagramId) -> bool {
        let before = self.reactants.len() + self.products.len();
        self.reactants.retain(|d| *d != id);
        self.products.retain(|d| *d != id);
        before != self.reactants.len() + self.products.len()
    }

    /// Renders the step as a reaction SMILES string, with `..` separating
    /// species inside a group and `>>` separating reactants from products.
    /// Unresolved species render as `???`.
    pub fn reaction_smiles(&self, diagrams: &[Diagram]) -> String {
        let render = |ids: &[DiagramId]| {
            ids.iter()
                .map(|id| {
                    diagrams
                        .get(id.0)
                        .and_then(|d| d.smiles())
                        .unwrap_or("???")
                        .to_owned()
                })
                .collect::<Vec<_>>()
                .join("..")
        };
        format!("{}>>{}", render(&self.reactants), render(&self.products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::surface::Panel;

    fn diagram(left: i32, smiles: Option<&str>) -> Diagram {
        Diagram::new(
            Panel::new(Rect::new(0, left, 10, left + 10).unwrap()),
            None,
            smiles.map(|s| s.to_owned()),
        )
    }

    #[test]
    fn test_overlapping_groups_rejected() {
        let shared = DiagramId(0);
        let result = ReactionStep::new(ArrowId(0), vec![shared], vec![shared], true);
        assert!(result.is_err());
    }

    #[test]
    fn test_completeness() {
        let step = ReactionStep::new(ArrowId(0), vec![DiagramId(0)], vec![], true).unwrap();
        assert!(!step.is_complete());
        let step =
            ReactionStep::new(ArrowId(0), vec![DiagramId(0)], vec![DiagramId(1)], true).unwrap();
        assert!(step.is_complete());
    }

    #[test]
    fn test_reaction_smiles() {
        let diagrams = vec![
            diagram(0, Some("CCO")),
            diagram(20, Some("CC(=O)O")),
            diagram(40, None),
        ];
        let step = ReactionStep::new(
            ArrowId(0),
            vec![DiagramId(0), DiagramId(2)],
            vec![DiagramId(1)],
            true,
        )
        .unwrap();
        assert_eq!(step.reaction_smiles(&diagrams), "CCO..???>>CC(=O)O");
    }
}

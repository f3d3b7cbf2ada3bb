//! Chemical structure diagrams and their labels.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::StepId;
use crate::surface::Panel;

static VARIANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+-\d+|\d+[A-Za-z]-[A-Za-z])$").unwrap()
});

static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+").unwrap());

/// Kind of a species label, used downstream for R-group handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelKind {
    /// A single compound label, e.g. `12` or `3a`.
    Simple,
    /// A label covering several variants, e.g. `4a-d` or `10-12`.
    Variants,
    /// No usable text.
    Unknown,
}

impl LabelKind {
    /// Classifies a label's first text line.
    pub fn classify(text: &str) -> LabelKind {
        let text = text.trim();
        if text.is_empty() {
            return LabelKind::Unknown;
        }
        if text.len() < 8 && VARIANT_RE.is_match(text) {
            LabelKind::Variants
        } else {
            LabelKind::Simple
        }
    }
}

/// A recognized species label.
#[derive(Debug, Clone)]
pub struct Label {
    panel: Panel,
    text: Vec<String>,
    kind: LabelKind,
}

impl Label {
    /// Creates a label from its panel and recognized text lines.
    pub fn new(panel: Panel, text: Vec<String>) -> Self {
        let kind = text
            .first()
            .map(|line| LabelKind::classify(line))
            .unwrap_or(LabelKind::Unknown);
        Self { panel, text, kind }
    }

    /// The label's panel.
    #[inline]
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Recognized text lines.
    #[inline]
    pub fn text(&self) -> &[String] {
        &self.text
    }

    /// Classified label kind.
    #[inline]
    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    /// Returns true when both labels start with the same chemical number.
    pub fn is_similar_to(&self, other: &Label) -> bool {
        let number = |label: &Label| {
            label
                .text
                .first()
                .and_then(|line| LEADING_NUMBER_RE.find(line.trim()))
                .map(|m| m.as_str().to_owned())
        };
        match (number(self), number(other)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// A chemical structure diagram.
///
/// Holds the diagram's panel, optional label and SMILES identifier, plus an
/// ordered list of the reaction steps the diagram participates in. The
/// step list is a weak back-reference of indices; the probing stage owns
/// the steps themselves.
#[derive(Debug, Clone)]
pub struct Diagram {
    panel: Panel,
    label: Option<Label>,
    smiles: Option<String>,
    steps: Vec<StepId>,
}

impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        self.panel == other.panel
    }
}

impl Eq for Diagram {}

impl std::hash::Hash for Diagram {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.panel.hash(state);
    }
}

impl Diagram {
    /// Creates a diagram from a classified panel.
    pub fn new(panel: Panel, label: Option<Label>, smiles: Option<String>) -> Self {
        Self {
            panel,
            label,
            smiles,
            steps: Vec::new(),
        }
    }

    /// The diagram's panel.
    #[inline]
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// The diagram's bounding rectangle.
    #[inline]
    pub fn rect(&self) -> crate::geometry::Rect {
        self.panel.rect()
    }

    /// The associated label, if any.
    #[inline]
    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    /// The chemical identifier string, if resolved.
    #[inline]
    pub fn smiles(&self) -> Option<&str> {
        self.smiles.as_deref()
    }

    /// Sets the chemical identifier string.
    pub fn set_smiles(&mut self, smiles: impl Into<String>) {
        self.smiles = Some(smiles.into());
    }

    /// Steps this diagram participates in, in probing order.
    #[inline]
    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    pub(crate) fn steps_mut(&mut self) -> &mut Vec<StepId> {
        &mut self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn label(text: &str) -> Label {
        Label::new(
            Panel::new(Rect::new(0, 0, 10, 10).unwrap()),
            vec![text.to_owned()],
        )
    }

    #[test]
    fn test_label_kind_classification() {
        assert_eq!(LabelKind::classify("12"), LabelKind::Simple);
        assert_eq!(LabelKind::classify("4a-d"), LabelKind::Variants);
        assert_eq!(LabelKind::classify("10-12"), LabelKind::Variants);
        assert_eq!(LabelKind::classify(""), LabelKind::Unknown);
        // Long strings are never variant ranges.
        assert_eq!(LabelKind::classify("compound 10-12"), LabelKind::Simple);
    }

    #[test]
    fn test_label_similarity() {
        assert!(label("12a").is_similar_to(&label("12b")));
        assert!(!label("12a").is_similar_to(&label("13a")));
        assert!(!label("abc").is_similar_to(&label("abc")));
    }

    #[test]
    fn test_diagram_identity_is_the_panel() {
        let a = Diagram::new(
            Panel::new(Rect::new(0, 0, 10, 10).unwrap()),
            None,
            Some("CCO".into()),
        );
        let b = Diagram::new(Panel::new(Rect::new(0, 0, 10, 10).unwrap()), None, None);
        assert_eq!(a, b);
    }
}

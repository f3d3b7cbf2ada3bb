//! Reaction-condition regions.
//!
//! A [`Conditions`] region couples a panel with the dictionary of condition
//! fields parsed from its text and a back-reference to the arrow it
//! annotates.

use serde::{Deserialize, Serialize};

use crate::core::SchemeResult;
use crate::model::ArrowId;
use crate::surface::Panel;

/// A chemical species together with an optional quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesQuantity {
    /// Species name or formula.
    pub species: String,
    /// Numeric value of the quantity, if parsed.
    pub value: Option<f32>,
    /// Units of the quantity, if parsed.
    pub units: Option<String>,
}

/// Parsed condition fields of a reaction step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionsDict {
    /// Species consumed alongside the main reactants.
    pub coreactants: Vec<SpeciesQuantity>,
    /// Catalytic species.
    pub catalysts: Vec<SpeciesQuantity>,
    /// Other species mentioned in the region.
    pub other_species: Vec<String>,
    /// Reaction temperature.
    pub temperature: Option<String>,
    /// Reaction time.
    pub time: Option<String>,
    /// Reaction pressure.
    pub pressure: Option<String>,
    /// Reported yield.
    #[serde(rename = "yield")]
    pub yield_value: Option<String>,
}

impl ConditionsDict {
    /// Merges two dictionaries: list fields concatenate, scalar fields
    /// keep the first populated value.
    pub fn merged(&self, other: &ConditionsDict) -> ConditionsDict {
        let mut out = self.clone();
        out.coreactants.extend(other.coreactants.iter().cloned());
        out.catalysts.extend(other.catalysts.iter().cloned());
        out.other_species.extend(other.other_species.iter().cloned());
        out.temperature = out.temperature.or_else(|| other.temperature.clone());
        out.time = out.time.or_else(|| other.time.clone());
        out.pressure = out.pressure.or_else(|| other.pressure.clone());
        out.yield_value = out.yield_value.or_else(|| other.yield_value.clone());
        out
    }
}

/// A reaction-conditions region.
#[derive(Debug, Clone)]
pub struct Conditions {
    panel: Panel,
    dict: ConditionsDict,
    arrow: Option<ArrowId>,
    text: Option<String>,
}

impl PartialEq for Conditions {
    fn eq(&self, other: &Self) -> bool {
        self.panel == other.panel
    }
}

impl Eq for Conditions {}

impl std::hash::Hash for Conditions {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.panel.hash(state);
    }
}

impl Conditions {
    /// Creates a conditions region.
    pub fn new(
        panel: Panel,
        dict: ConditionsDict,
        arrow: Option<ArrowId>,
        text: Option<String>,
    ) -> Self {
        Self {
            panel,
            dict,
            arrow,
            text,
        }
    }

    /// The region's panel.
    #[inline]
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// The parsed condition dictionary.
    #[inline]
    pub fn dict(&self) -> &ConditionsDict {
        &self.dict
    }

    /// The arrow this region annotates.
    #[inline]
    pub fn arrow(&self) -> Option<ArrowId> {
        self.arrow
    }

    /// The recognized raw text, if any.
    #[inline]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Coreactants listed in the region.
    #[inline]
    pub fn coreactants(&self) -> &[SpeciesQuantity] {
        &self.dict.coreactants
    }

    /// Catalysts listed in the region.
    #[inline]
    pub fn catalysts(&self) -> &[SpeciesQuantity] {
        &self.dict.catalysts
    }

    /// Other species listed in the region.
    #[inline]
    pub fn other_species(&self) -> &[String] {
        &self.dict.other_species
    }

    /// Merges two condition regions belonging to the same arrow into one,
    /// covering both panels.
    ///
    /// # Errors
    ///
    /// Propagates geometric errors from panel bounding.
    pub fn merge(&self, other: &Conditions) -> SchemeResult<Conditions> {
        let panel = Panel::bounding(&[self.panel.clone(), other.panel.clone()])?;
        let dict = self.dict.merged(&other.dict);
        let text = match (&self.text, &other.text) {
            (Some(a), Some(b)) => Some(format!("{a} {b}")),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };
        Ok(Conditions::new(panel, dict, self.arrow, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn species(name: &str) -> SpeciesQuantity {
        SpeciesQuantity {
            species: name.to_owned(),
            value: None,
            units: None,
        }
    }

    #[test]
    fn test_dict_merge() {
        let a = ConditionsDict {
            coreactants: vec![species("HCl")],
            temperature: Some("25 C".into()),
            ..Default::default()
        };
        let b = ConditionsDict {
            coreactants: vec![species("NaOH")],
            temperature: Some("80 C".into()),
            time: Some("2 h".into()),
            ..Default::default()
        };
        let merged = a.merged(&b);
        assert_eq!(merged.coreactants.len(), 2);
        // Scalars keep the first populated value.
        assert_eq!(merged.temperature.as_deref(), Some("25 C"));
        assert_eq!(merged.time.as_deref(), Some("2 h"));
    }

    #[test]
    fn test_region_merge_covers_both_panels() {
        let a = Conditions::new(
            Panel::new(Rect::new(0, 0, 10, 10).unwrap()),
            ConditionsDict::default(),
            Some(ArrowId(0)),
            Some("cat.".into()),
        );
        let b = Conditions::new(
            Panel::new(Rect::new(20, 20, 30, 30).unwrap()),
            ConditionsDict::default(),
            Some(ArrowId(0)),
            None,
        );
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.panel().rect(), Rect::new(0, 0, 30, 30).unwrap());
        assert_eq!(merged.arrow(), Some(ArrowId(0)));
        assert_eq!(merged.text(), Some("cat."));
    }
}

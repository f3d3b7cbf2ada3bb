//! Configuration for the geometric reconstruction core.
//!
//! Each stage of the core carries a small serde-derived configuration
//! struct with sensible defaults and a `validate` method. The aggregate
//! [`SchemeConfig`] groups them for callers that configure everything in
//! one place.

use serde::{Deserialize, Serialize};

use super::errors::{SchemeError, SchemeResult};

/// Configuration for raster surface processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Binarization threshold applied before connected-component labeling.
    /// Pixels strictly above this value count as foreground.
    pub bin_threshold: u8,
    /// A component whose bounding box covers at least this fraction of the
    /// total image area is discarded as a whole-image artifact.
    pub spurious_area_ratio: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            bin_threshold: 40,
            spurious_area_ratio: 0.95,
        }
    }
}

impl SurfaceConfig {
    /// Validates the configuration values.
    pub fn validate(&self) -> SchemeResult<()> {
        if !(0.0..=1.0).contains(&self.spurious_area_ratio) {
            return Err(SchemeError::invalid_input(format!(
                "spurious_area_ratio must be within [0, 1], got {}",
                self.spurious_area_ratio
            )));
        }
        Ok(())
    }
}

/// Configuration for arrow reference-point computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowConfig {
    /// Integer upscale factor applied to the arrow mask before erosion.
    pub ref_upscale: u32,
    /// Padding in pixels added around the arrow crop before upscaling.
    pub ref_pad: u32,
    /// Number of 3x3 erosion iterations applied to the upscaled mask.
    pub ref_erosions: u8,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            ref_upscale: 2,
            ref_pad: 10,
            ref_erosions: 2,
        }
    }
}

impl ArrowConfig {
    /// Validates the configuration values.
    pub fn validate(&self) -> SchemeResult<()> {
        if self.ref_upscale == 0 {
            return Err(SchemeError::invalid_input(
                "ref_upscale must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Configuration for the directional role probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// A diagram counts as hit when the overlap between a probing segment
    /// and its box exceeds this fraction of the smaller of segment length
    /// and diagram diagonal.
    pub min_overlap_factor: f32,
    /// Number of leading probing segments allowed to cross another arrow
    /// without terminating the scan. Adjacent arrows frequently sit close
    /// together in dense schemes.
    pub arrow_overlap_tolerance: usize,
    /// Maximum edge separation between a diagram and the rest of its group
    /// before the node-pruning pass removes it from a single-line step.
    pub max_group_distance: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            min_overlap_factor: 0.3,
            arrow_overlap_tolerance: 2,
            max_group_distance: 100.0,
        }
    }
}

impl ProbeConfig {
    /// Validates the configuration values.
    pub fn validate(&self) -> SchemeResult<()> {
        if !(0.0..=1.0).contains(&self.min_overlap_factor) {
            return Err(SchemeError::invalid_input(format!(
                "min_overlap_factor must be within [0, 1], got {}",
                self.min_overlap_factor
            )));
        }
        if self.max_group_distance < 0.0 {
            return Err(SchemeError::invalid_input(format!(
                "max_group_distance must be non-negative, got {}",
                self.max_group_distance
            )));
        }
        Ok(())
    }
}

/// Aggregate configuration for the whole reconstruction core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeConfig {
    /// Surface processing configuration.
    pub surface: SurfaceConfig,
    /// Arrow reference-point configuration.
    pub arrow: ArrowConfig,
    /// Role probe configuration.
    pub probe: ProbeConfig,
}

impl SchemeConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> SchemeResult<()> {
        self.surface.validate()?;
        self.arrow.validate()?;
        self.probe.validate()?;
        Ok(())
    }
}

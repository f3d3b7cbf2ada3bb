//! Core error handling and configuration.
//!
//! This module hosts the crate-wide error enum, the result alias, and the
//! serde-derived configuration structs used by the other modules.

pub mod config;
pub mod errors;

pub use config::{ArrowConfig, ProbeConfig, SchemeConfig, SurfaceConfig};
pub use errors::{SchemeError, SchemeResult};

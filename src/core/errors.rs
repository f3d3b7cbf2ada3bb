//! Error types for the scheme reconstruction core.
//!
//! This module defines the crate-wide error enum together with a handful of
//! convenience constructors. All fallible operations in the crate return
//! [`SchemeResult`].

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SchemeResult<T> = Result<T, SchemeError>;

/// Errors produced by the geometric reconstruction core.
#[derive(Error, Debug)]
pub enum SchemeError {
    /// A region or primitive failed geometric validation, e.g. a zero-area
    /// rectangle, inverted bounds, or an arrow without a usable contour.
    #[error("invalid geometry: {message}")]
    InvalidGeometry {
        /// Description of the failed validation.
        message: String,
    },

    /// An input collection or parameter was unusable for the requested
    /// computation.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the offending input.
        message: String,
    },

    /// The requested operation is not defined for the given data, e.g.
    /// exporting a multi-path scheme graph as a single linear string.
    #[error("unsupported operation: {message}")]
    Unsupported {
        /// Description of why the operation cannot be performed.
        message: String,
    },

    /// A graph traversal revisited a node, i.e. the adjacency contains a
    /// cycle where a linear chain was required.
    #[error("cycle detected at node {node} during graph traversal")]
    CycleDetected {
        /// Id of the node that was reached twice.
        node: usize,
    },

    /// Serialization of an export document failed.
    #[error("serialization")]
    Serialization(#[from] serde_json::Error),
}

impl SchemeError {
    /// Creates an invalid-geometry error with the given message.
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        SchemeError::InvalidGeometry {
            message: message.into(),
        }
    }

    /// Creates an invalid-input error with the given message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        SchemeError::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an unsupported-operation error with the given message.
    pub fn unsupported(message: impl Into<String>) -> Self {
        SchemeError::Unsupported {
            message: message.into(),
        }
    }
}

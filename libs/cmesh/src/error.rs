//! # Mesh Errors
//!
//! Error types for mesh construction, editing and queries.
//!
//! ## Error Policy
//!
//! - Bad input (unknown ids, degenerate elements) is a domain-data error.
//! - A broken `opp`/`nnxt` link is a topology error and is never repaired
//!   silently.

use thiserror::Error;

use crate::ids::{ElementId, NodeId};

/// Errors raised by mesh operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MeshError {
    /// Node id out of range or deleted.
    #[error("Invalid node: {0:?}")]
    InvalidNode(NodeId),

    /// Element id out of range or deleted.
    #[error("Invalid element: {0:?}")]
    InvalidElement(ElementId),

    /// Element area or volume is at or below tolerance.
    #[error("Degenerate element with nodes {nodes:?}")]
    DegenerateElement {
        /// Nodes of the rejected element.
        nodes: Vec<NodeId>,
    },

    /// Broken adjacency, a disk that does not close, or a failed
    /// consistency check.
    #[error("Topology error: {message}")]
    Topology {
        /// What was found broken.
        message: String,
    },

    /// Point lies outside the mesh.
    #[error("No element contains the point")]
    NotFound,

    /// A position buffer does not match the node arena.
    #[error("Expected {expected} positions, found {found}")]
    PositionCount {
        /// Node arena size.
        expected: usize,
        /// Supplied positions.
        found: usize,
    },

    /// The mesh has no valid elements.
    #[error("Mesh has no elements")]
    EmptyMesh,

    /// An edge or face would be shared by more than two elements, or
    /// shared with inconsistent orientation.
    #[error("Non-manifold {what} at nodes {nodes:?}")]
    NonManifold {
        /// `"edge"` or `"face"`.
        what: &'static str,
        /// Nodes of the offending edge or face.
        nodes: Vec<NodeId>,
    },
}

impl MeshError {
    /// Creates a topology error.
    pub fn topology(message: impl Into<String>) -> Self {
        Self::Topology {
            message: message.into(),
        }
    }
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

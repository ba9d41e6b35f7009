//! Error types for distance computation.

use cmesh::MeshError;
use thiserror::Error;

/// Result type for the fast marching solver.
pub type MarchResult<T> = Result<T, MarchError>;

/// Errors raised while computing distances on a mesh.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarchError {
    /// The mesh has no live elements.
    #[error("mesh has no elements")]
    EmptyMesh,

    /// No seeds were given and the mesh has no boundary nodes to start from.
    #[error("mesh has no boundary nodes")]
    NoBoundary,

    /// A seed point is not inside any element.
    #[error("seed {index} lies outside the mesh")]
    SeedOutsideMesh {
        /// Position of the seed in the caller's list.
        index: usize,
    },

    /// The mesh topology could not be walked.
    #[error("mesh error: {0}")]
    Topology(#[from] MeshError),

    /// A working buffer could not be grown.
    #[error("allocation failed for {what}")]
    Allocation {
        /// The buffer that failed to grow.
        what: &'static str,
    },
}

/// Allocates a vector of `len` copies of `value`, reporting failure as
/// [`MarchError::Allocation`].
pub(crate) fn filled<T: Clone>(len: usize, value: T, what: &'static str) -> MarchResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| MarchError::Allocation { what })?;
    v.resize(len, value);
    Ok(v)
}

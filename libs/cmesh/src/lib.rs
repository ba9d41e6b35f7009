//! # CMesh
//!
//! Conforming simplicial meshes: triangles in the plane ([`Mesh2D`]) and
//! tetrahedra in space ([`Mesh3D`]).
//!
//! Nodes, edge uses, faces and elements live in flat arenas addressed by
//! typed ids. Adjacency is kept by index links:
//!
//! - `next` cycles the edge uses of one triangle or face
//! - `opp` pairs an edge use or face with its partner in the adjacent element
//! - `nnxt` threads every edge use leaving a node into that node's disk
//!
//! Every disk walk is bounded by the arena size, so a corrupted ring is
//! reported as [`MeshError::Topology`] instead of looping.
//!
//! ## Example
//!
//! ```rust
//! use cmesh::{Mesh2D, SimplicialMesh};
//! use glam::DVec2;
//!
//! let positions = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y];
//! let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//! let e = mesh.locate_enclosing_element(DVec2::new(0.75, 0.25)).unwrap();
//! assert_eq!(mesh.element_nodes(e).len(), 3);
//! ```

mod arena;
pub mod error;
pub mod grid;
pub mod ids;
pub mod mesh;
pub mod mesh2d;
pub mod mesh3d;

pub use arena::{Coord, EdgeUse, Element, Node, SqueezeMap};
pub use error::{MeshError, MeshResult};
pub use grid::{CellCount, CellStats, SpatialGrid};
pub use ids::{EdgeUseId, ElementId, FaceId, NodeId};
pub use mesh::SimplicialMesh;
pub use mesh2d::Mesh2D;
pub use mesh3d::{Face, Mesh3D, FACE_NODES};

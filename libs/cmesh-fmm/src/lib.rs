//! # CMesh Fast Marching
//!
//! Approximate geodesic distances through a conforming simplicial mesh
//! ([`cmesh::Mesh2D`] or [`cmesh::Mesh3D`]) by the fast marching method.
//!
//! Seeds get exact Euclidean distances on the nodes they can see in a
//! straight line. The front then advances node by node in order of
//! distance, solving a local plane wave problem in each triangle or
//! tetrahedron it crosses.
//!
//! ## Example
//!
//! ```rust
//! use cmesh::Mesh2D;
//! use cmesh_fmm::compute_distances;
//! use glam::DVec2;
//!
//! let positions = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y];
//! let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//! let seeds = [DVec2::new(0.0, 0.0)];
//! let field = compute_distances(&mesh, Some(&seeds[..])).unwrap();
//! assert_eq!(field.as_slice()[1], 1.0);
//! ```

pub mod distance;
pub mod error;
pub mod flags;
pub mod queue;
mod seed;
pub mod solver;
pub mod update2d;
pub mod update3d;

pub use distance::DistanceField;
pub use error::{MarchError, MarchResult};
pub use flags::{MarchState, NodeFlags};
pub use queue::PriorityQueue;
pub use solver::{compute_distances, compute_distances_with, Marchable, Marcher};
pub use update2d::solve_triangle;
pub use update3d::solve_tetrahedron;

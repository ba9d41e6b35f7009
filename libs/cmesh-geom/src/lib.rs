//! # CMesh Geometry
//!
//! Leaf geometry utilities used by the conforming mesh (`cmesh`) and the
//! fast-marching solver (`cmesh-fmm`). All computations are in `f64` using
//! `glam::DVec2` and `glam::DVec3`. Orientation signs that decide
//! topology (segment crossing, containment) use the adaptive predicates of
//! the `robust` crate.
//!
//! ## Modules
//!
//! - [`predicates`]: signed areas/volumes and orientation signs
//! - [`intersect`]: segment and ray intersection tests
//! - [`plane`]: triangle flattening
//! - [`contain`]: point-in-simplex tests
//! - [`bounds`]: axis aligned bounding boxes

pub mod bounds;
pub mod contain;
pub mod intersect;
pub mod plane;
pub mod predicates;

pub use bounds::{Aabb2, Aabb3};
pub use contain::{point_in_tetrahedron, point_in_triangle_2d};
pub use glam::{DVec2, DVec3};
pub use intersect::{
    ray_triangle_intersect_3d, segment_triangle_intersect_3d, segments_intersect_2d, RayHit,
    SegmentIntersection,
};
pub use plane::map_triangle_to_plane;
pub use predicates::{orient_2d, orient_3d, tetrahedron_signed_volume6, triangle_signed_area2};

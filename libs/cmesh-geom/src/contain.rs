//! Tolerant point-in-simplex tests.
//!
//! Points on an edge or face count as inside, so a seed that sits exactly on
//! a shared edge or node is located in one of the elements that use it.

use glam::{DVec2, DVec3};

use crate::predicates::{tetrahedron_signed_volume6, triangle_signed_area2};

/// Whether `p` lies inside or on the triangle `(a, b, c)`.
///
/// `tol` is relative to the triangle's area. Degenerate triangles contain
/// nothing.
///
/// # Example
///
/// ```rust
/// use cmesh_geom::{point_in_triangle_2d, DVec2};
/// let (a, b, c) = (DVec2::ZERO, DVec2::X, DVec2::Y);
/// assert!(point_in_triangle_2d(DVec2::new(0.2, 0.2), a, b, c, 1e-9));
/// assert!(point_in_triangle_2d(DVec2::new(0.5, 0.5), a, b, c, 1e-9));
/// assert!(!point_in_triangle_2d(DVec2::new(0.6, 0.6), a, b, c, 1e-9));
/// ```
pub fn point_in_triangle_2d(p: DVec2, a: DVec2, b: DVec2, c: DVec2, tol: f64) -> bool {
    let area = triangle_signed_area2(a, b, c);
    if area == 0.0 {
        return false;
    }
    let sign = area.signum();
    let slack = -tol * area.abs();
    [
        triangle_signed_area2(p, b, c),
        triangle_signed_area2(a, p, c),
        triangle_signed_area2(a, b, p),
    ]
    .iter()
    .all(|&w| w * sign >= slack)
}

/// Whether `p` lies inside or on the tetrahedron `(a, b, c, d)`.
///
/// `tol` is relative to the tetrahedron's volume.
pub fn point_in_tetrahedron(p: DVec3, a: DVec3, b: DVec3, c: DVec3, d: DVec3, tol: f64) -> bool {
    let vol = tetrahedron_signed_volume6(a, b, c, d);
    if vol == 0.0 {
        return false;
    }
    let sign = vol.signum();
    let slack = -tol * vol.abs();
    [
        tetrahedron_signed_volume6(p, b, c, d),
        tetrahedron_signed_volume6(a, p, c, d),
        tetrahedron_signed_volume6(a, b, p, d),
        tetrahedron_signed_volume6(a, b, c, p),
    ]
    .iter()
    .all(|&w| w * sign >= slack)
}

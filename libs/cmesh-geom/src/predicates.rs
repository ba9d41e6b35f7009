//! Signed areas, volumes and orientation predicates.
//!
//! The plain `triangle_signed_area2` / `tetrahedron_signed_volume6` are fast
//! floating point evaluations used for magnitudes (degeneracy checks,
//! barycentric weights). `orient_2d` / `orient_3d` return values with the
//! same sign convention but are evaluated with adaptive precision, so their
//! sign is exact.

use glam::{DVec2, DVec3};
use robust::{Coord, Coord3D};

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive when the vertices are in counter-clockwise order.
///
/// # Example
///
/// ```rust
/// use cmesh_geom::{triangle_signed_area2, DVec2};
/// let a2 = triangle_signed_area2(DVec2::ZERO, DVec2::X, DVec2::Y);
/// assert_eq!(a2, 1.0);
/// ```
#[inline]
pub fn triangle_signed_area2(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Six times the signed volume of the tetrahedron `(a, b, c, d)`.
///
/// Positive when `(b - a) . ((c - a) x (d - a)) > 0`.
///
/// # Example
///
/// ```rust
/// use cmesh_geom::{tetrahedron_signed_volume6, DVec3};
/// let v6 = tetrahedron_signed_volume6(DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z);
/// assert_eq!(v6, 1.0);
/// ```
#[inline]
pub fn tetrahedron_signed_volume6(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> f64 {
    (b - a).dot((c - a).cross(d - a))
}

/// Robust 2D orientation: same sign as [`triangle_signed_area2`].
#[inline]
pub fn orient_2d(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    robust::orient2d(coord(a), coord(b), coord(c))
}

/// Robust 3D orientation: same sign as [`tetrahedron_signed_volume6`].
///
/// `robust::orient3d` is positive when `d` lies below the plane of
/// `(a, b, c)`, which is the opposite of the signed volume convention.
#[inline]
pub fn orient_3d(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> f64 {
    -robust::orient3d(coord3(a), coord3(b), coord3(c), coord3(d))
}

#[inline]
fn coord(p: DVec2) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

#[inline]
fn coord3(p: DVec3) -> Coord3D<f64> {
    Coord3D {
        x: p.x,
        y: p.y,
        z: p.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn area_sign_follows_winding() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(2.0, 0.0);
        let c = DVec2::new(0.0, 3.0);
        assert_relative_eq!(triangle_signed_area2(a, b, c), 6.0);
        assert_relative_eq!(triangle_signed_area2(a, c, b), -6.0);
    }

    #[test]
    fn robust_orientation_agrees_with_area() {
        let a = DVec2::new(0.1, 0.2);
        let b = DVec2::new(1.3, -0.4);
        let c = DVec2::new(0.7, 2.2);
        let fast = triangle_signed_area2(a, b, c);
        let exact = orient_2d(a, b, c);
        assert_eq!(fast.signum(), exact.signum());

        let (p, q) = (DVec2::ZERO, DVec2::new(2.0, 2.0));
        assert_eq!(orient_2d(p, q, DVec2::ONE), 0.0);
        assert!(orient_2d(p, q, DVec2::new(1.0, 1.5)) > 0.0);
    }

    #[test]
    fn robust_orientation_agrees_with_volume() {
        let a = DVec3::new(0.0, 0.0, 0.0);
        let b = DVec3::new(1.0, 0.0, 0.0);
        let c = DVec3::new(0.0, 1.0, 0.0);
        let d = DVec3::new(0.2, 0.3, 1.0);
        assert!(tetrahedron_signed_volume6(a, b, c, d) > 0.0);
        assert!(orient_3d(a, b, c, d) > 0.0);
        assert!(orient_3d(b, a, c, d) < 0.0);
        assert_eq!(orient_3d(a, b, c, DVec3::new(0.5, 0.5, 0.0)), 0.0);
    }

    #[test]
    fn unit_tetrahedron_volume() {
        let v6 = tetrahedron_signed_volume6(
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(2.0, 1.0, 1.0),
            DVec3::new(1.0, 2.0, 1.0),
            DVec3::new(1.0, 1.0, 2.0),
        );
        assert_relative_eq!(v6, 1.0);
    }
}

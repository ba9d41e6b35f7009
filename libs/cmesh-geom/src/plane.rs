//! Flattening of 3D triangles into the plane.

use glam::{DVec2, DVec3};

/// Maps the 3D triangle `(p0, p1, p2)` into the plane, preserving its edge
/// lengths. `p0` maps to the origin, `p1` onto the positive x axis and `p2`
/// into the upper half plane. Returns the images of `p1` and `p2`.
///
/// When `p0` and `p1` coincide the triangle has no defined orientation;
/// `p2` is then placed on the x axis at its distance from `p0`.
///
/// # Example
///
/// ```rust
/// use cmesh_geom::{map_triangle_to_plane, DVec3};
/// let (q1, q2) = map_triangle_to_plane(
///     DVec3::new(1.0, 1.0, 1.0),
///     DVec3::new(1.0, 1.0, 3.0),
///     DVec3::new(1.0, 2.0, 1.0),
/// );
/// assert_eq!(q1.x, 2.0);
/// assert!((q2.length() - 1.0).abs() < 1e-12);
/// ```
pub fn map_triangle_to_plane(p0: DVec3, p1: DVec3, p2: DVec3) -> (DVec2, DVec2) {
    let e = p1 - p0;
    let w = p2 - p0;
    let len = e.length();
    if len <= f64::MIN_POSITIVE {
        return (DVec2::ZERO, DVec2::new(w.length(), 0.0));
    }
    let axis = e / len;
    let x = w.dot(axis);
    let y = (w - axis * x).length();
    (DVec2::new(len, 0.0), DVec2::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flattening_preserves_edge_lengths() {
        let p0 = DVec3::new(0.3, -1.2, 2.0);
        let p1 = DVec3::new(1.7, 0.4, 2.5);
        let p2 = DVec3::new(-0.6, 0.9, 3.1);
        let (q1, q2) = map_triangle_to_plane(p0, p1, p2);
        assert_relative_eq!(q1.y, 0.0);
        assert!(q2.y >= 0.0);
        assert_relative_eq!(q1.length(), p0.distance(p1), epsilon = 1e-12);
        assert_relative_eq!(q2.length(), p0.distance(p2), epsilon = 1e-12);
        assert_relative_eq!(q1.distance(q2), p1.distance(p2), epsilon = 1e-12);
    }

    #[test]
    fn coincident_base_keeps_distance() {
        let p = DVec3::new(1.0, 2.0, 3.0);
        let (q1, q2) = map_triangle_to_plane(p, p, p + DVec3::Z * 2.0);
        assert_eq!(q1, DVec2::ZERO);
        assert_relative_eq!(q2.x, 2.0);
    }
}

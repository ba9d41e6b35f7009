//! Segment and ray intersection tests.
//!
//! The 2D segment test is decided entirely by exact orientation signs, so a
//! segment that only touches an endpoint or runs along an edge is reported as
//! [`SegmentIntersection::Touching`] rather than missed. The 3D tests use
//! Möller-Trumbore with a barycentric tolerance.

use glam::{DVec2, DVec3};

use crate::predicates::orient_2d;

/// Result of intersecting two closed 2D line segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentIntersection {
    /// The segments share no point.
    Disjoint,
    /// The segments share a point that is an endpoint of at least one of
    /// them, or they overlap collinearly.
    Touching,
    /// The segments cross at a single interior point of both.
    Crossing,
}

impl SegmentIntersection {
    /// True for both touching and crossing segments.
    #[inline]
    pub fn intersects(self) -> bool {
        !matches!(self, SegmentIntersection::Disjoint)
    }
}

/// Intersects the closed segments `p0 p1` and `q0 q1`.
///
/// # Example
///
/// ```rust
/// use cmesh_geom::{segments_intersect_2d, DVec2, SegmentIntersection};
/// let hit = segments_intersect_2d(
///     DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0),
///     DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0),
/// );
/// assert_eq!(hit, SegmentIntersection::Crossing);
/// ```
pub fn segments_intersect_2d(p0: DVec2, p1: DVec2, q0: DVec2, q1: DVec2) -> SegmentIntersection {
    let o0 = orient_2d(p0, p1, q0);
    let o1 = orient_2d(p0, p1, q1);
    let o2 = orient_2d(q0, q1, p0);
    let o3 = orient_2d(q0, q1, p1);

    if o0 * o1 < 0.0 && o2 * o3 < 0.0 {
        return SegmentIntersection::Crossing;
    }
    let touching = (o0 == 0.0 && on_segment(p0, p1, q0))
        || (o1 == 0.0 && on_segment(p0, p1, q1))
        || (o2 == 0.0 && on_segment(q0, q1, p0))
        || (o3 == 0.0 && on_segment(q0, q1, p1));
    if touching {
        SegmentIntersection::Touching
    } else {
        SegmentIntersection::Disjoint
    }
}

/// For a point `p` already known to be collinear with `a b`, whether it lies
/// within the segment's extent.
#[inline]
fn on_segment(a: DVec2, b: DVec2, p: DVec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Result of a ray/triangle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    /// The ray misses the triangle.
    Miss,
    /// The ray is parallel to the triangle's plane (or the triangle is
    /// degenerate), so no single intersection point exists.
    Parallel,
    /// The ray hits the triangle at `origin + t * dir`, with barycentric
    /// coordinates `(1 - u - v, u, v)`.
    Hit {
        /// Ray parameter of the hit, `t >= 0`.
        t: f64,
        /// Barycentric weight of the second vertex.
        u: f64,
        /// Barycentric weight of the third vertex.
        v: f64,
    },
}

/// Intersects the ray `origin + t * dir` (`t >= 0`) with the triangle
/// `(t0, t1, t2)`. `tol` widens the triangle in barycentric units and
/// also gates the parallel test.
///
/// # Example
///
/// ```rust
/// use cmesh_geom::{ray_triangle_intersect_3d, DVec3, RayHit};
/// let hit = ray_triangle_intersect_3d(
///     DVec3::new(0.2, 0.2, 1.0), -DVec3::Z,
///     DVec3::ZERO, DVec3::X, DVec3::Y, 1.0e-9,
/// );
/// assert!(matches!(hit, RayHit::Hit { .. }));
/// ```
pub fn ray_triangle_intersect_3d(
    origin: DVec3,
    dir: DVec3,
    t0: DVec3,
    t1: DVec3,
    t2: DVec3,
    tol: f64,
) -> RayHit {
    let e1 = t1 - t0;
    let e2 = t2 - t0;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    let scale = e1.length() * e2.length() * dir.length();
    if scale == 0.0 || det.abs() <= tol * scale {
        return RayHit::Parallel;
    }
    let inv = 1.0 / det;
    let s = origin - t0;
    let u = s.dot(p) * inv;
    if u < -tol || u > 1.0 + tol {
        return RayHit::Miss;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv;
    if v < -tol || u + v > 1.0 + tol {
        return RayHit::Miss;
    }
    let t = e2.dot(q) * inv;
    if t < -tol {
        return RayHit::Miss;
    }
    RayHit::Hit { t, u, v }
}

/// Whether the closed segment `p0 p1` meets the triangle `(t0, t1, t2)`.
///
/// A segment lying in the triangle's plane is reported as not meeting it.
pub fn segment_triangle_intersect_3d(
    p0: DVec3,
    p1: DVec3,
    t0: DVec3,
    t1: DVec3,
    t2: DVec3,
    tol: f64,
) -> bool {
    match ray_triangle_intersect_3d(p0, p1 - p0, t0, t1, t2, tol) {
        RayHit::Hit { t, .. } => t <= 1.0 + tol,
        RayHit::Miss | RayHit::Parallel => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn crossing_diagonals() {
        let r = segments_intersect_2d(
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.0, 2.0),
        );
        assert_eq!(r, SegmentIntersection::Crossing);
    }

    #[test]
    fn shared_endpoint_is_touching() {
        let r = segments_intersect_2d(
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 1.0),
        );
        assert_eq!(r, SegmentIntersection::Touching);
        assert!(r.intersects());
    }

    #[test]
    fn collinear_overlap_is_touching() {
        let r = segments_intersect_2d(
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(3.0, 0.0),
        );
        assert_eq!(r, SegmentIntersection::Touching);
    }

    #[test]
    fn separated_segments_are_disjoint() {
        let r = segments_intersect_2d(
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        );
        assert_eq!(r, SegmentIntersection::Disjoint);
        let r = segments_intersect_2d(
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(3.0, 0.0),
        );
        assert_eq!(r, SegmentIntersection::Disjoint);
    }

    #[test]
    fn ray_hits_triangle_interior() {
        let hit = ray_triangle_intersect_3d(
            DVec3::new(0.25, 0.25, 2.0),
            DVec3::new(0.0, 0.0, -1.0),
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            1.0e-9,
        );
        match hit {
            RayHit::Hit { t, u, v } => {
                assert_relative_eq!(t, 2.0);
                assert_relative_eq!(u, 0.25);
                assert_relative_eq!(v, 0.25);
            }
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn ray_misses_outside_and_behind() {
        let outside = ray_triangle_intersect_3d(
            DVec3::new(2.0, 2.0, 1.0),
            -DVec3::Z,
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            1.0e-9,
        );
        assert_eq!(outside, RayHit::Miss);
        let behind = ray_triangle_intersect_3d(
            DVec3::new(0.2, 0.2, 1.0),
            DVec3::Z,
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            1.0e-9,
        );
        assert_eq!(behind, RayHit::Miss);
    }

    #[test]
    fn ray_in_plane_is_parallel() {
        let hit = ray_triangle_intersect_3d(
            DVec3::new(-1.0, 0.2, 0.0),
            DVec3::X,
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            1.0e-9,
        );
        assert_eq!(hit, RayHit::Parallel);
    }

    #[test]
    fn segment_must_reach_triangle() {
        let t = [DVec3::ZERO, DVec3::X, DVec3::Y];
        assert!(segment_triangle_intersect_3d(
            DVec3::new(0.2, 0.2, 1.0),
            DVec3::new(0.2, 0.2, -1.0),
            t[0],
            t[1],
            t[2],
            1.0e-9
        ));
        assert!(!segment_triangle_intersect_3d(
            DVec3::new(0.2, 0.2, 1.0),
            DVec3::new(0.2, 0.2, 0.5),
            t[0],
            t[1],
            t[2],
            1.0e-9
        ));
    }
}

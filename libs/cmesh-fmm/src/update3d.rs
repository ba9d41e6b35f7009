//! Wavefront update across a tetrahedron.

use cmesh::ids::{ElementId, NodeId};
use cmesh::{Mesh3D, SimplicialMesh};
use cmesh_geom::{
    map_triangle_to_plane, ray_triangle_intersect_3d, segment_triangle_intersect_3d, RayHit,
};
use glam::{DVec2, DVec3};

use crate::flags::NodeFlags;
use crate::solver::Marchable;
use crate::update2d::solve_triangle;

/// Unit front normal `n` with `n . l1 = d1` and `n . l2 = d2`, picking the
/// root on the side of `toward`. `None` if the edges are parallel or no
/// unit vector satisfies both constraints.
fn front_normal(l1: DVec3, l2: DVec3, d1: f64, d2: f64, toward: DVec3) -> Option<DVec3> {
    let m = l1.cross(l2);
    let mm = m.length_squared();
    let (g11, g12, g22) = (l1.dot(l1), l1.dot(l2), l2.dot(l2));
    if mm <= f64::EPSILON * g11 * g22 {
        return None;
    }
    let alpha = (d1 * g22 - d2 * g12) / mm;
    let beta = (d2 * g11 - d1 * g12) / mm;
    let p = l1 * alpha + l2 * beta;
    let rest = 1.0 - p.length_squared();
    if rest < 0.0 {
        return None;
    }
    let gamma = (rest / mm).sqrt();
    Some(if m.dot(toward) >= 0.0 {
        p + m * gamma
    } else {
        p - m * gamma
    })
}

/// Arrival at `u` through the triangle `(a, b, u)` flattened into the
/// plane.
fn flattened(a: (DVec3, f64), b: (DVec3, f64), u: DVec3, tol: f64) -> f64 {
    let (q1, q2) = map_triangle_to_plane(a.0, b.0, u);
    solve_triangle(DVec2::ZERO, q1, q2, a.1, b.1, tol)
}

/// Arrival at `u` from the three finalized nodes of a tetrahedron, given as
/// `(position, distance)` pairs. Returns the new distance only if it is
/// below `current`.
///
/// A planar front through the three nodes is tried first. If it is not
/// causal, or its ray back from `u` misses the known face, each face
/// `(k_i, k_j, u)` is flattened and solved as a triangle. Straight edges
/// are the last resort.
///
/// # Example
///
/// ```rust
/// use cmesh_fmm::solve_tetrahedron;
/// use glam::DVec3;
///
/// let base = [(DVec3::ZERO, 0.0), (DVec3::X, 0.0), (DVec3::Y, 0.0)];
/// let d = solve_tetrahedron(base, DVec3::new(0.25, 0.25, 1.0), f64::INFINITY, 1.0e-9);
/// assert!((d.unwrap() - 1.0).abs() < 1.0e-12);
/// ```
pub fn solve_tetrahedron(
    mut known: [(DVec3, f64); 3],
    u: DVec3,
    current: f64,
    tol: f64,
) -> Option<f64> {
    known.sort_by(|a, b| a.1.total_cmp(&b.1));
    let [k0, k1, k2] = known;
    let l1 = k1.0 - k0.0;
    let l2 = k2.0 - k0.0;
    let d1 = k1.1 - k0.1;
    let d2 = k2.1 - k0.1;

    if l1.length() > d1 && l2.length() > d2 {
        let centroid = (k0.0 + k1.0 + k2.0) / 3.0;
        if let Some(n) = front_normal(l1, l2, d1, d2, u - centroid) {
            if let RayHit::Hit { .. } = ray_triangle_intersect_3d(u, -n, k0.0, k1.0, k2.0, tol) {
                let h = n.dot(u - k0.0);
                if h > 0.0 {
                    let d = k0.1 + h;
                    return (d < current).then_some(d);
                }
            }
        }
    }

    let faces = [(k0, k1), (k1, k2), (k2, k0)]
        .into_iter()
        .map(|(a, b)| flattened(a, b, u, tol))
        .fold(f64::INFINITY, f64::min);
    if faces < current {
        return Some(faces);
    }

    let edges = known
        .iter()
        .map(|&(p, d)| d + p.distance(u))
        .fold(f64::INFINITY, f64::min);
    (edges < current).then_some(edges)
}

impl Marchable for Mesh3D {
    fn segment_crosses_side(
        &self,
        e: ElementId,
        side: usize,
        from: DVec3,
        to: DVec3,
        tol: f64,
    ) -> bool {
        let [a, b, c] = self.face_nodes(e, side).map(|n| self.position(n));
        segment_triangle_intersect_3d(from, to, a, b, c, tol)
    }

    fn update_element(
        &self,
        e: ElementId,
        current: NodeId,
        distances: &[f64],
        flags: &[NodeFlags],
        tol: f64,
        out: &mut Vec<(NodeId, f64)>,
    ) {
        let mut known = [NodeId(0); 4];
        let mut unknown = [NodeId(0); 4];
        let (mut nk, mut nu) = (0, 0);
        for &n in self.element_nodes(e) {
            if flags[n.index()].is_finalized() {
                known[nk] = n;
                nk += 1;
            } else {
                unknown[nu] = n;
                nu += 1;
            }
        }
        let sample = |n: NodeId| (self.position(n), distances[n.index()]);

        match nk {
            1 => {
                let (origin, base) = sample(current);
                for &u in &unknown[..nu] {
                    out.push((u, base + origin.distance(self.position(u))));
                }
            }
            2 => {
                let (a, b) = (sample(known[0]), sample(known[1]));
                for &u in &unknown[..nu] {
                    out.push((u, flattened(a, b, self.position(u), tol)));
                }
            }
            3 => {
                let u = unknown[0];
                let ks = [sample(known[0]), sample(known[1]), sample(known[2])];
                if let Some(d) = solve_tetrahedron(ks, self.position(u), distances[u.index()], tol)
                {
                    out.push((u, d));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: f64 = 1.0e-9;

    fn base() -> [(DVec3, f64); 3] {
        [(DVec3::ZERO, 0.0), (DVec3::X, 0.0), (DVec3::Y, 0.0)]
    }

    #[test]
    fn apex_over_base_uses_normal() {
        let d = solve_tetrahedron(base(), DVec3::new(0.25, 0.25, 1.0), f64::INFINITY, TOL);
        assert_relative_eq!(d.unwrap(), 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn oblique_plane_wave_is_exact() {
        let k = DVec3::ONE.normalize();
        let ks = [DVec3::ZERO, DVec3::X, DVec3::Y].map(|p| (p, k.dot(p)));
        let u = DVec3::new(0.25, 0.25, 0.0) + k;
        let d = solve_tetrahedron(ks, u, f64::INFINITY, TOL).unwrap();
        assert_relative_eq!(d, k.dot(u), epsilon = 1.0e-10);
    }

    #[test]
    fn known_order_does_not_matter() {
        let k = DVec3::new(0.0, 0.6, 0.8);
        let u = DVec3::new(0.2, 0.8, 0.8);
        let mut ks = [DVec3::ZERO, DVec3::X, DVec3::Y].map(|p| (p, k.dot(p)));
        let a = solve_tetrahedron(ks, u, f64::INFINITY, TOL).unwrap();
        ks.reverse();
        let b = solve_tetrahedron(ks, u, f64::INFINITY, TOL).unwrap();
        assert_relative_eq!(a, b, epsilon = 1.0e-12);
        assert_relative_eq!(a, k.dot(u), epsilon = 1.0e-12);
    }

    #[test]
    fn missed_normal_falls_back_to_faces() {
        let d = solve_tetrahedron(base(), DVec3::new(2.0, 2.0, 1.0), f64::INFINITY, TOL);
        assert_relative_eq!(d.unwrap(), 5.5_f64.sqrt(), epsilon = 1.0e-9);
    }

    #[test]
    fn distant_apex_matches_straight_edges() {
        let u = DVec3::new(3.0, -2.0, 1.0);
        let d = solve_tetrahedron(base(), u, f64::INFINITY, TOL).unwrap();
        assert_relative_eq!(d, 3.0, epsilon = 1.0e-9);
    }

    #[test]
    fn non_causal_front_uses_faces() {
        // d1 exceeds |l1|: the front cannot pass through all three nodes.
        let ks = [(DVec3::ZERO, 0.0), (DVec3::X, 5.0), (DVec3::Y, 0.0)];
        let u = DVec3::new(0.0, 0.0, 1.0);
        let d = solve_tetrahedron(ks, u, f64::INFINITY, TOL).unwrap();
        assert!(d <= 1.0 + 1.0e-12);
        assert!(d > 0.0);
    }

    #[test]
    fn no_improvement_returns_none() {
        let u = DVec3::new(3.0, -2.0, 1.0);
        assert_eq!(solve_tetrahedron(base(), u, 2.5, TOL), None);
        let u = DVec3::new(0.25, 0.25, 1.0);
        assert_eq!(solve_tetrahedron(base(), u, 1.0, TOL), None);
    }

    fn unit_tet() -> Mesh3D {
        let positions = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
        Mesh3D::from_tetrahedra(&positions, &[[0, 1, 2, 3]]).unwrap()
    }

    #[test]
    fn one_known_propagates_edges() {
        let mesh = unit_tet();
        let distances = [0.5, f64::INFINITY, f64::INFINITY, f64::INFINITY];
        let flags = [NodeFlags::KNOWN, NodeFlags::NONE, NodeFlags::NONE, NodeFlags::NONE];
        let mut out = Vec::new();
        mesh.update_element(ElementId(0), NodeId(0), &distances, &flags, TOL, &mut out);
        assert_eq!(out.len(), 3);
        for (_, d) in out {
            assert_relative_eq!(d, 1.5, epsilon = 1.0e-12);
        }
    }

    #[test]
    fn two_known_solve_flattened_faces() {
        let mesh = unit_tet();
        // Plane wave along +z does not touch nodes 0 and 1 differently.
        let distances = [0.0, 0.0, f64::INFINITY, f64::INFINITY];
        let flags = [NodeFlags::KNOWN, NodeFlags::UPWIND, NodeFlags::NONE, NodeFlags::NONE];
        let mut out = Vec::new();
        mesh.update_element(ElementId(0), NodeId(1), &distances, &flags, TOL, &mut out);
        out.sort_by_key(|(n, _)| *n);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, NodeId(2));
        assert_relative_eq!(out[0].1, 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(out[1].1, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn three_known_uses_tetrahedron_solver() {
        let mesh = unit_tet();
        let distances = [0.0, 0.0, 0.0, f64::INFINITY];
        let flags = [NodeFlags::KNOWN; 3]
            .into_iter()
            .chain([NodeFlags::ACTIVE])
            .collect::<Vec<_>>();
        let mut out = Vec::new();
        mesh.update_element(ElementId(0), NodeId(2), &distances, &flags, TOL, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, NodeId(3));
        assert_relative_eq!(out[0].1, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn face_crossing() {
        let mesh = unit_tet();
        // Face 3 is opposite node 3, the z = 0 face.
        let side = Mesh3D::side_opposite(3);
        assert!(mesh.segment_crosses_side(
            ElementId(0),
            side,
            DVec3::new(0.2, 0.2, 1.0),
            DVec3::new(0.2, 0.2, -1.0),
            TOL
        ));
        assert!(!mesh.segment_crosses_side(
            ElementId(0),
            side,
            DVec3::new(0.2, 0.2, 1.0),
            DVec3::new(0.2, 0.2, 0.5),
            TOL
        ));
    }
}

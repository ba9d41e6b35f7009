//! Wavefront update across a triangle.

use std::f64::consts::FRAC_PI_2;

use cmesh::ids::{ElementId, NodeId};
use cmesh::{Mesh2D, SimplicialMesh};
use cmesh_geom::segments_intersect_2d;
use config::constants::{ANGLE_TOLERANCE, NEIGHBOR_MAX_COS};
use glam::DVec2;

use crate::flags::NodeFlags;
use crate::solver::Marchable;

/// Interior angle opposite the side of length `opposite`, between sides
/// `adj0` and `adj1`.
fn angle(opposite: f64, adj0: f64, adj1: f64) -> f64 {
    let cos = (adj0 * adj0 + adj1 * adj1 - opposite * opposite) / (2.0 * adj0 * adj1);
    cos.clamp(-1.0, 1.0).acos()
}

/// Arrival time at `p2` of a front that reached `p0` at `d0` and `p1` at
/// `d1`, assuming unit speed.
///
/// The front is treated as locally planar. When the plane wave would not
/// enter the triangle through the side `p0 p1` the smaller of the two
/// straight edge arrivals is returned. An obtuse angle at `p2` is handled by
/// moving `p1` to the midpoint of `p0 p1` with the averaged distance.
///
/// # Example
///
/// ```rust
/// use cmesh_fmm::solve_triangle;
/// use glam::DVec2;
///
/// // A front moving along +y reaches the apex one unit later.
/// let d = solve_triangle(DVec2::ZERO, DVec2::X, DVec2::new(0.5, 1.0), 0.0, 0.0, 1.0e-9);
/// assert!((d - 1.0).abs() < 1.0e-12);
/// ```
pub fn solve_triangle(p0: DVec2, p1: DVec2, p2: DVec2, d0: f64, d1: f64, tol: f64) -> f64 {
    let (p0, mut p1, d0, mut d1) = if d1 < d0 {
        (p1, p0, d1, d0)
    } else {
        (p0, p1, d0, d1)
    };
    let b = p2.distance(p0);
    let mut a = p1.distance(p2);
    let mut c = p0.distance(p1);
    if c < tol || a < tol || b < tol {
        return (d0 + b).min(d1 + a);
    }

    if angle(c, a, b) > FRAC_PI_2 {
        p1 = (p0 + p1) * 0.5;
        d1 = 0.5 * (d0 + d1);
        c = p0.distance(p1);
        a = p1.distance(p2);
    }

    let delta = d1 - d0;
    if c > delta {
        let theta = (delta / c).asin();
        let phi0 = angle(a, b, c);
        let phi1 = angle(b, c, a);
        if theta >= -ANGLE_TOLERANCE && theta > phi1 - FRAC_PI_2 && FRAC_PI_2 - phi0 > theta {
            let h0 = a * (phi1 - theta).sin();
            let h1 = b * (phi0 + theta).sin();
            return 0.5 * ((h0 + d0) + (h1 + d1));
        }
    }
    (d0 + b).min(d1 + a)
}

/// Replaces `far` by the apex of an edge-adjacent triangle when that apex
/// is finalized, has a smaller distance and is not nearly in line with
/// `near` and `u`.
fn nearer_neighbor_node(
    mesh: &Mesh2D,
    e: ElementId,
    near: NodeId,
    mut far: NodeId,
    u: NodeId,
    distances: &[f64],
    flags: &[NodeFlags],
) -> NodeId {
    let own = mesh.element_nodes(e);
    let origin = mesh.position(near);
    let toward = mesh.position(u) - origin;
    for side in 0..3 {
        let Some(f) = mesh.neighbors_of(e, side) else {
            continue;
        };
        let Some(&apex) = mesh.element_nodes(f).iter().find(|&&n| !own.contains(&n)) else {
            continue;
        };
        if !flags[apex.index()].is_finalized()
            || distances[apex.index()] >= distances[far.index()]
        {
            continue;
        }
        let offset = mesh.position(apex) - origin;
        let lengths = offset.length() * toward.length();
        if lengths > 0.0 && offset.dot(toward) / lengths < NEIGHBOR_MAX_COS {
            far = apex;
        }
    }
    far
}

impl Marchable for Mesh2D {
    fn segment_crosses_side(
        &self,
        e: ElementId,
        side: usize,
        from: DVec2,
        to: DVec2,
        _tol: f64,
    ) -> bool {
        let nodes = self.element_nodes(e);
        let a = self.position(nodes[side]);
        let b = self.position(nodes[(side + 1) % 3]);
        segments_intersect_2d(from, to, a, b).intersects()
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
        let mut known = [NodeId(0); 3];
        let mut unknown = [NodeId(0); 3];
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
        match nu {
            1 => {
                let u = unknown[0];
                let (mut near, mut far) = (known[0], known[1]);
                if distances[far.index()] < distances[near.index()] {
                    std::mem::swap(&mut near, &mut far);
                }
                let far = nearer_neighbor_node(self, e, near, far, u, distances, flags);
                let d = solve_triangle(
                    self.position(near),
                    self.position(far),
                    self.position(u),
                    distances[near.index()],
                    distances[far.index()],
                    tol,
                );
                out.push((u, d));
            }
            2 => {
                let origin = self.position(current);
                let base = distances[current.index()];
                for &u in &unknown[..2] {
                    out.push((u, base + origin.distance(self.position(u))));
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

    #[test]
    fn plane_wave_is_exact() {
        // Front direction k = (0.6, 0.8): d(p) = k . p.
        let k = DVec2::new(0.6, 0.8);
        let p0 = DVec2::new(0.0, 0.0);
        let p1 = DVec2::new(1.0, 0.0);
        let p2 = DVec2::new(0.8, 1.0);
        let d = solve_triangle(p0, p1, p2, k.dot(p0), k.dot(p1), TOL);
        assert_relative_eq!(d, k.dot(p2), epsilon = 1.0e-12);
        assert_relative_eq!(d, 1.28, epsilon = 1.0e-12);
    }

    #[test]
    fn argument_order_does_not_matter() {
        let p0 = DVec2::new(0.0, 0.0);
        let p1 = DVec2::new(1.0, 0.0);
        let p2 = DVec2::new(0.4, 0.9);
        let a = solve_triangle(p0, p1, p2, 0.2, 0.7, TOL);
        let b = solve_triangle(p1, p0, p2, 0.7, 0.2, TOL);
        assert_relative_eq!(a, b, epsilon = 1.0e-12);
    }

    #[test]
    fn steep_front_falls_back_to_edges() {
        // d1 - d0 exceeds the side length: no plane wave fits.
        let p0 = DVec2::new(0.0, 0.0);
        let p1 = DVec2::new(1.0, 0.0);
        let p2 = DVec2::new(0.5, 1.0);
        let d = solve_triangle(p0, p1, p2, 0.0, 3.0, TOL);
        assert_relative_eq!(d, p2.length(), epsilon = 1.0e-12);
    }

    #[test]
    fn front_outside_triangle_falls_back_to_edges() {
        // Apex beyond p1: the wave from side p0 p1 would arrive from outside.
        let p0 = DVec2::new(0.0, 0.0);
        let p1 = DVec2::new(1.0, 0.0);
        let p2 = DVec2::new(2.0, 2.0);
        let d = solve_triangle(p0, p1, p2, 0.0, 0.0, TOL);
        let expected = (p2.distance(p0)).min(p2.distance(p1));
        assert_relative_eq!(d, expected, epsilon = 1.0e-12);
    }

    #[test]
    fn coincident_nodes_use_edge_length() {
        let p = DVec2::new(0.3, 0.3);
        let apex = DVec2::new(0.3, 1.3);
        let d = solve_triangle(p, p, apex, 0.5, 0.5, TOL);
        assert_relative_eq!(d, 1.5, epsilon = 1.0e-12);
    }

    #[test]
    fn obtuse_apex_is_bounded_by_edges() {
        let p0 = DVec2::new(0.0, 0.0);
        let p1 = DVec2::new(2.0, 0.0);
        let p2 = DVec2::new(1.0, 0.2);
        let d = solve_triangle(p0, p1, p2, 0.0, 0.1, TOL);
        assert!(d > 0.0);
        assert!(d <= p2.distance(p0) + 1.0e-12);
    }

    #[test]
    fn update_with_one_unknown_uses_both_known_nodes() {
        let positions = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.8, 1.0),
        ];
        let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 2]]).unwrap();
        let distances = [0.0, 0.6, f64::INFINITY];
        let flags = [NodeFlags::KNOWN, NodeFlags::KNOWN, NodeFlags::NONE];
        let mut out = Vec::new();
        mesh.update_element(ElementId(0), NodeId(1), &distances, &flags, TOL, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, NodeId(2));
        assert_relative_eq!(out[0].1, 1.28, epsilon = 1.0e-12);
    }

    #[test]
    fn update_with_two_unknowns_propagates_edges() {
        let positions = [
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(0.0, 4.0),
        ];
        let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 2]]).unwrap();
        let distances = [1.0, f64::INFINITY, f64::INFINITY];
        let flags = [NodeFlags::KNOWN, NodeFlags::NONE, NodeFlags::ACTIVE];
        let mut out = Vec::new();
        mesh.update_element(ElementId(0), NodeId(0), &distances, &flags, TOL, &mut out);
        out.sort_by_key(|(n, _)| *n);
        assert_eq!(out, vec![(NodeId(1), 4.0), (NodeId(2), 5.0)]);
    }

    #[test]
    fn equal_distances_take_the_plane_wave() {
        // A front parallel to p0 p1 arrives at the apex one height later,
        // below either straight edge.
        let p0 = DVec2::new(0.0, 0.0);
        let p1 = DVec2::new(1.0, 0.0);
        let p2 = DVec2::new(0.5, 1.0);
        let d = solve_triangle(p0, p1, p2, 0.25, 0.25, TOL);
        assert_relative_eq!(d, 1.25, epsilon = 1.0e-12);
        assert!(d < 0.25 + p2.distance(p0));
    }

    /// Triangle (0, 2, 1) with the unknown node 2, sharing edge 0-2 with
    /// triangle (0, 3, 2). Node 1 is known with an overestimate; node 3
    /// lies on the plane front `d = y`.
    fn wedge() -> Mesh2D {
        let positions = [
            DVec2::new(0.0, 0.0),
            DVec2::new(-1.0, 0.0),
            DVec2::new(0.5, 1.0),
            DVec2::new(1.0, 0.5),
        ];
        Mesh2D::from_triangles(&positions, &[[0, 2, 1], [0, 3, 2]]).unwrap()
    }

    #[test]
    fn finalized_neighbor_apex_replaces_the_far_node() {
        let mesh = wedge();
        let distances = [0.0, 1.0, f64::INFINITY, 0.5];
        let flags = [NodeFlags::KNOWN, NodeFlags::KNOWN, NodeFlags::NONE, NodeFlags::KNOWN];
        let mut out = Vec::new();
        mesh.update_element(ElementId(0), NodeId(1), &distances, &flags, TOL, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, NodeId(2));
        assert_relative_eq!(out[0].1, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn unfinalized_neighbor_apex_is_ignored() {
        let mesh = wedge();
        let distances = [0.0, 1.0, f64::INFINITY, 0.5];
        let flags = [NodeFlags::KNOWN, NodeFlags::KNOWN, NodeFlags::NONE, NodeFlags::ACTIVE];
        let mut out = Vec::new();
        mesh.update_element(ElementId(0), NodeId(1), &distances, &flags, TOL, &mut out);
        assert_eq!(out.len(), 1);
        // Only the straight edge from node 0 is left.
        assert_relative_eq!(out[0].1, 1.25_f64.sqrt(), epsilon = 1.0e-12);
    }

    #[test]
    fn side_crossing() {
        let positions = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 2]]).unwrap();
        // Side 1 runs from node 1 to node 2, facing node 0.
        let side = Mesh2D::side_opposite(0);
        assert!(mesh.segment_crosses_side(
            ElementId(0),
            side,
            DVec2::new(1.0, 1.0),
            DVec2::ZERO,
            TOL
        ));
        assert!(!mesh.segment_crosses_side(
            ElementId(0),
            side,
            DVec2::new(0.1, 0.1),
            DVec2::ZERO,
            TOL
        ));
    }
}

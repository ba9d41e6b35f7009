//! # Triangle Mesh
//!
//! Planar conforming triangle mesh. Element `e` owns edge uses
//! `3e, 3e+1, 3e+2`; edge use `k` runs from node `k` to node `k+1`, so the
//! side facing node `i` is edge use `i+1`.
//!
//! ## Example
//!
//! ```rust
//! use cmesh::{Mesh2D, SimplicialMesh};
//! use glam::DVec2;
//!
//! let positions = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y];
//! let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//! assert_eq!(mesh.element_count(), 2);
//! assert_eq!(mesh.count_boundary_nodes().unwrap(), 4);
//! ```

use cmesh_geom::{orient_2d, point_in_triangle_2d, triangle_signed_area2, Aabb2, Aabb3, DVec2};
use config::constants::CONTAINMENT_TOLERANCE;
use config::MeshConfig;
use tracing::{debug, warn};

use crate::arena::{Arena, Coord, EdgeUse, Element, Node, SqueezeMap};
use crate::error::{MeshError, MeshResult};
use crate::grid::SpatialGrid;
use crate::ids::{EdgeUseId, ElementId, NodeId};
use crate::mesh::SimplicialMesh;

#[cfg(test)]
mod tests;

type Arena2 = Arena<DVec2, 3, 3>;

/// Conforming triangle mesh.
#[derive(Debug, Clone)]
pub struct Mesh2D {
    arena: Arena2,
    config: MeshConfig,
    bbox: Aabb2,
    /// `None` once an insertion or move has made the buckets stale.
    grid: Option<SpatialGrid>,
}

impl Default for Mesh2D {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh2D {
    /// Creates an empty mesh with default settings.
    pub fn new() -> Self {
        Self::with_config(MeshConfig::default())
    }

    /// Creates an empty mesh.
    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            arena: Arena::new(),
            config,
            bbox: Aabb2::EMPTY,
            grid: None,
        }
    }

    /// Builds a mesh from positions and triangles given as position indices,
    /// then indexes it.
    ///
    /// Negatively oriented triangles are reordered.
    ///
    /// # Errors
    ///
    /// `InvalidNode` for an index past `positions`, `DegenerateElement` for a
    /// flat triangle and `NonManifold` for an edge shared by more than two
    /// triangles.
    pub fn from_triangles(positions: &[DVec2], triangles: &[[usize; 3]]) -> MeshResult<Self> {
        Self::from_triangles_with_config(MeshConfig::default(), positions, triangles)
    }

    /// [`Mesh2D::from_triangles`] with explicit settings.
    pub fn from_triangles_with_config(
        config: MeshConfig,
        positions: &[DVec2],
        triangles: &[[usize; 3]],
    ) -> MeshResult<Self> {
        let mut mesh = Self::with_config(config);
        for &p in positions {
            mesh.add_node(p);
        }
        for t in triangles {
            let [a, b, c] = t.map(|i| NodeId(i as u32));
            mesh.add_element(a, b, c)?;
        }
        mesh.rebuild_grid();
        debug!(
            nodes = mesh.node_count(),
            elements = mesh.element_count(),
            "built triangle mesh"
        );
        Ok(mesh)
    }

    /// Adds an isolated node.
    pub fn add_node(&mut self, position: DVec2) -> NodeId {
        self.bbox.expand(position);
        self.grid = None;
        self.arena.add_node(position)
    }

    /// Adds a triangle and links it to its neighbors.
    ///
    /// # Errors
    ///
    /// See [`Mesh2D::from_triangles`]. The mesh is unchanged on error.
    pub fn add_element(&mut self, n0: NodeId, n1: NodeId, n2: NodeId) -> MeshResult<ElementId> {
        for n in [n0, n1, n2] {
            self.arena.check_node(n)?;
        }
        let degenerate = || MeshError::DegenerateElement {
            nodes: vec![n0, n1, n2],
        };
        if n0 == n1 || n1 == n2 || n0 == n2 {
            return Err(degenerate());
        }
        let area = triangle_signed_area2(self.position(n0), self.position(n1), self.position(n2));
        if area.abs() <= self.config.tolerance_sq() {
            return Err(degenerate());
        }
        let nodes = if area < 0.0 { [n0, n2, n1] } else { [n0, n1, n2] };
        let e = self.arena.push_element(nodes);
        if let Err(err) = self.link_element(e) {
            self.arena.pop_element();
            return Err(err);
        }
        self.grid = None;
        Ok(e)
    }

    /// Threads the edge uses of `e` into their disks and pairs them with
    /// the reversed edges of existing triangles.
    fn link_element(&mut self, e: ElementId) -> MeshResult<()> {
        let nodes = self.arena.elements[e.index()].nodes;
        let mut partners = [None; 3];
        for (k, partner) in partners.iter_mut().enumerate() {
            let (a, b) = (nodes[k], nodes[(k + 1) % 3]);
            let non_manifold = || MeshError::NonManifold {
                what: "edge",
                nodes: vec![a, b],
            };
            if self.arena.find_directed_edge(a, b)?.is_some() {
                return Err(non_manifold());
            }
            if let Some(o) = self.arena.find_directed_edge(b, a)? {
                if self.arena.edge_uses[o.index()].opp.is_some() {
                    return Err(non_manifold());
                }
                *partner = Some(o);
            }
        }
        for (k, partner) in partners.into_iter().enumerate() {
            let eu = Arena2::edge_use(e, k);
            self.arena.edge_uses[eu.index()] = EdgeUse {
                node: nodes[k],
                next: Arena2::edge_use(e, (k + 1) % 3),
                nnxt: eu,
                opp: partner,
            };
            if let Some(o) = partner {
                self.arena.edge_uses[o.index()].opp = Some(eu);
            }
            self.arena.insert_into_disk(eu);
        }
        Ok(())
    }

    /// Removes a triangle, leaving its nodes in place. Former neighbors
    /// become boundary along the shared edges.
    pub fn delete_element(&mut self, e: ElementId) -> MeshResult<()> {
        self.arena.check_element(e)?;
        self.arena.unlink_edge_uses(e)?;
        self.arena.mark_element_deleted(e);
        Ok(())
    }

    /// Removes a node together with every triangle that uses it.
    pub fn delete_node(&mut self, n: NodeId) -> MeshResult<()> {
        for e in self.incident_elements(n)? {
            self.delete_element(e)?;
        }
        self.arena.mark_node_deleted(n);
        Ok(())
    }

    /// Compacts the arenas, dropping deleted slots, and rebuilds the grid.
    ///
    /// Returns the old to new id maps.
    pub fn squeeze(&mut self) -> MeshResult<SqueezeMap> {
        let compacted = self.arena.compacted();
        let mut mesh = Self::with_config(self.config);
        for p in compacted.positions {
            mesh.add_node(p);
        }
        for nodes in compacted.elements {
            let e = mesh.arena.push_element(nodes);
            mesh.link_element(e)?;
        }
        mesh.rebuild_grid();
        *self = mesh;
        Ok(compacted.map)
    }

    /// Reorders the nodes of every negatively oriented triangle and relinks
    /// them. Returns the number of triangles fixed.
    ///
    /// # Errors
    ///
    /// `DegenerateElement` if a triangle is flat. `NonManifold` if the
    /// flipped triangles no longer match their neighbors. The mesh is
    /// unchanged on error.
    pub fn fix_negative_elements(&mut self) -> MeshResult<usize> {
        let tol = self.config.tolerance_sq();
        let mut negative = Vec::new();
        for e in self.arena.live_element_ids() {
            let area = self.signed_area2(e);
            if area.abs() <= tol {
                return Err(MeshError::DegenerateElement {
                    nodes: self.element_nodes(e).to_vec(),
                });
            }
            if area < 0.0 {
                negative.push(e);
            }
        }
        if negative.is_empty() {
            return Ok(0);
        }
        let mut work = self.clone();
        for &e in &negative {
            work.arena.unlink_edge_uses(e)?;
        }
        for &e in &negative {
            let [a, b, c] = work.arena.elements[e.index()].nodes;
            work.arena.elements[e.index()].nodes = [a, c, b];
            work.link_element(e)?;
        }
        *self = work;
        debug!(fixed = negative.len(), "reoriented triangles");
        Ok(negative.len())
    }

    /// Replaces every node position, one per node slot, then refreshes the
    /// bounding box and grid.
    pub fn set_positions(&mut self, positions: &[DVec2]) -> MeshResult<()> {
        if positions.len() != self.arena.nodes.len() {
            return Err(MeshError::PositionCount {
                expected: self.arena.nodes.len(),
                found: positions.len(),
            });
        }
        for (node, &p) in self.arena.nodes.iter_mut().zip(positions) {
            node.position = p;
        }
        self.bbox = Aabb2::from_points(self.arena.live_node_ids().map(|n| self.position(n)));
        self.rebuild_grid();
        Ok(())
    }

    /// Rebuilds the spatial grid from the live nodes and triangles.
    pub fn rebuild_grid(&mut self) {
        let nodes: Vec<_> = self
            .arena
            .live_node_ids()
            .map(|n| (n, self.position(n).to_3d()))
            .collect();
        let elements: Vec<_> = self
            .arena
            .live_element_ids()
            .map(|e| {
                let bb = Aabb3::from_points(
                    self.element_nodes(e).iter().map(|&n| self.position(n).to_3d()),
                );
                (e, bb)
            })
            .collect();
        self.grid = Some(SpatialGrid::build(
            self.bbox.into(),
            2,
            self.config.grid_cell_factor,
            nodes,
            elements.into_iter(),
        ));
    }

    /// The spatial grid, `None` while stale.
    pub fn grid(&self) -> Option<&SpatialGrid> {
        self.grid.as_ref()
    }

    /// Node slot, including deleted ones.
    pub fn node(&self, n: NodeId) -> Option<&Node<DVec2>> {
        self.arena.nodes.get(n.index())
    }

    /// Element slot, including deleted ones.
    pub fn element(&self, e: ElementId) -> Option<&Element<3>> {
        self.arena.elements.get(e.index())
    }

    /// Edge-use slot.
    pub fn edge_use(&self, eu: EdgeUseId) -> Option<&EdgeUse> {
        self.arena.edge_uses.get(eu.index())
    }

    /// The three edge uses of `e`.
    pub fn element_edge_uses(&self, e: ElementId) -> [EdgeUseId; 3] {
        [0, 1, 2].map(|k| Arena2::edge_use(e, k))
    }

    /// Triangle owning an edge use.
    pub fn edge_use_element(eu: EdgeUseId) -> ElementId {
        Arena2::element_of(eu)
    }

    /// Edge uses starting at `n`, in disk order.
    ///
    /// # Errors
    ///
    /// `Topology` if the disk does not close.
    pub fn disk_walk(&self, n: NodeId) -> MeshResult<Vec<EdgeUseId>> {
        self.arena.disk_walk(n)
    }

    /// Nodes sharing a triangle with `n`.
    pub fn node_ring(&self, n: NodeId) -> MeshResult<Vec<NodeId>> {
        self.arena.node_ring(n)
    }

    /// Twice the signed area of `e`.
    pub fn signed_area2(&self, e: ElementId) -> f64 {
        let [a, b, c] = self.arena.elements[e.index()].nodes;
        triangle_signed_area2(self.position(a), self.position(b), self.position(c))
    }

    /// Whether any edge of `e` lies on the boundary.
    pub fn is_boundary_element(&self, e: ElementId) -> bool {
        self.element_edge_uses(e)
            .iter()
            .any(|eu| self.arena.edge_uses[eu.index()].opp.is_none())
    }

    /// Stores the boundary flag of every live node. Returns the number of
    /// boundary nodes.
    pub fn set_boundary_flags(&mut self) -> MeshResult<usize> {
        let mut count = 0;
        for i in 0..self.arena.nodes.len() {
            let n = NodeId(i as u32);
            let boundary = self.is_node_valid(n) && self.is_boundary(n)?;
            self.arena.nodes[i].boundary = boundary;
            count += usize::from(boundary);
        }
        Ok(count)
    }

    /// Bounding box of the nodes.
    pub fn bounding_box(&self) -> Aabb2 {
        self.bbox
    }

    /// Squared length of the longest edge.
    pub fn max_sq_edge_length(&self) -> f64 {
        self.arena.max_sq_edge_length()
    }

    /// A live node within tolerance of `p`.
    pub fn find_node(&self, p: DVec2) -> Option<NodeId> {
        let tol = self.config.tolerance;
        let near = |n: &NodeId| self.is_node_valid(*n) && self.position(*n).distance_sq(p) <= tol * tol;
        match &self.grid {
            Some(grid) => grid.nodes_near(p.to_3d(), tol).into_iter().find(near),
            None => self.arena.live_node_ids().find(near),
        }
    }

    /// Checks every link invariant and element orientation.
    ///
    /// # Errors
    ///
    /// The first violation found, as `Topology`.
    pub fn verify(&self) -> MeshResult<()> {
        self.arena.verify_disks()?;
        let tol = self.config.tolerance_sq();
        for e in self.arena.live_element_ids() {
            let nodes = self.arena.elements[e.index()].nodes;
            for k in 0..3 {
                let eu = Arena2::edge_use(e, k);
                let link = self.arena.edge_uses[eu.index()];
                if link.node != nodes[k] || link.next != Arena2::edge_use(e, (k + 1) % 3) {
                    return Err(MeshError::topology(format!(
                        "edge use {eu:?} does not match element {e:?}"
                    )));
                }
                let dest = nodes[(k + 1) % 3];
                match link.opp {
                    Some(o) => {
                        let other = self.arena.edge_uses[o.index()];
                        let other_dest = self.arena.edge_uses[other.next.index()].node;
                        if !self.arena.is_element_valid(Arena2::element_of(o)) {
                            return Err(MeshError::topology(format!(
                                "{eu:?} is paired with deleted edge use {o:?}"
                            )));
                        }
                        if other.opp != Some(eu) {
                            return Err(MeshError::topology(format!(
                                "{eu:?} -> {o:?} is not mutual"
                            )));
                        }
                        if other.node != dest || other_dest != nodes[k] {
                            return Err(MeshError::topology(format!(
                                "{eu:?} and {o:?} do not share an edge"
                            )));
                        }
                    }
                    None => {
                        if self.arena.find_directed_edge(dest, nodes[k])?.is_some() {
                            return Err(MeshError::topology(format!(
                                "shared edge at {eu:?} is not paired"
                            )));
                        }
                    }
                }
            }
            if self.signed_area2(e) <= tol {
                return Err(MeshError::topology(format!(
                    "element {e:?} is not positively oriented"
                )));
            }
        }
        Ok(())
    }

    fn element_contains(&self, e: ElementId, p: DVec2) -> bool {
        let [a, b, c] = self.arena.elements[e.index()].nodes;
        point_in_triangle_2d(
            p,
            self.position(a),
            self.position(b),
            self.position(c),
            CONTAINMENT_TOLERANCE,
        )
    }

    /// Steps across the first edge that separates `p` from the current
    /// triangle. `None` when the walk leaves the mesh or fails to settle.
    fn walk_towards(&self, start: ElementId, p: DVec2) -> Option<ElementId> {
        let mut e = start;
        for _ in 0..=self.arena.elements.len() {
            if self.element_contains(e, p) {
                return Some(e);
            }
            let nodes = self.arena.elements[e.index()].nodes;
            let side = (0..3).find(|&k| {
                orient_2d(self.position(nodes[k]), self.position(nodes[(k + 1) % 3]), p) < 0.0
            })?;
            e = self.neighbors_of(e, side)?;
        }
        None
    }
}

impl SimplicialMesh for Mesh2D {
    type Point = DVec2;

    const NODES_PER_ELEMENT: usize = 3;

    fn config(&self) -> &MeshConfig {
        &self.config
    }

    fn max_node_index(&self) -> usize {
        self.arena.nodes.len()
    }

    fn max_element_index(&self) -> usize {
        self.arena.elements.len()
    }

    fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    fn element_count(&self) -> usize {
        self.arena.element_count()
    }

    fn is_node_valid(&self, n: NodeId) -> bool {
        self.arena.is_node_valid(n)
    }

    fn is_element_valid(&self, e: ElementId) -> bool {
        self.arena.is_element_valid(e)
    }

    #[inline]
    fn position(&self, n: NodeId) -> DVec2 {
        self.arena.nodes[n.index()].position
    }

    #[inline]
    fn element_nodes(&self, e: ElementId) -> &[NodeId] {
        &self.arena.elements[e.index()].nodes
    }

    fn incident_elements_into(&self, n: NodeId, out: &mut Vec<ElementId>) -> MeshResult<()> {
        self.arena.incident_elements_into(n, out)
    }

    fn neighbors_of(&self, e: ElementId, side: usize) -> Option<ElementId> {
        if side >= 3 || !self.arena.is_element_valid(e) {
            return None;
        }
        self.arena.edge_uses[Arena2::edge_use(e, side).index()]
            .opp
            .map(Arena2::element_of)
    }

    fn side_opposite(local: usize) -> usize {
        (local + 1) % 3
    }

    fn is_boundary(&self, n: NodeId) -> MeshResult<bool> {
        let mut boundary = false;
        self.arena.try_for_each_disk(n, |eu| {
            let k = eu.index() % 3;
            let prev = Arena2::edge_use(Arena2::element_of(eu), (k + 2) % 3);
            boundary |= self.arena.edge_uses[eu.index()].opp.is_none()
                || self.arena.edge_uses[prev.index()].opp.is_none();
            Ok(())
        })?;
        Ok(boundary)
    }

    fn locate_enclosing_element(&self, p: DVec2) -> MeshResult<ElementId> {
        if self.arena.element_count() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if !self.bbox.contains(p, self.config.tolerance) {
            return Err(MeshError::NotFound);
        }
        let Some(grid) = &self.grid else {
            warn!("spatial grid is stale, scanning all triangles");
            return self
                .arena
                .live_element_ids()
                .find(|&e| self.element_contains(e, p))
                .ok_or(MeshError::NotFound);
        };
        let candidates: Vec<_> = grid
            .elements_near(p.to_3d(), self.config.tolerance)
            .into_iter()
            .filter(|&e| self.arena.is_element_valid(e))
            .collect();
        if let Some(&start) = candidates.first() {
            if let Some(e) = self.walk_towards(start, p) {
                return Ok(e);
            }
        }
        candidates
            .into_iter()
            .find(|&e| self.element_contains(e, p))
            .ok_or(MeshError::NotFound)
    }
}

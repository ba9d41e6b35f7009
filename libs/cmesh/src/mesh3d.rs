//! # Tetrahedral Mesh
//!
//! Conforming tetrahedral mesh. Element `e` owns faces `4e..4e+4`, face `f`
//! facing away from node `f`, and edge uses `12e..12e+12`, three per face.
//! Face node cycles are outward for a positively oriented tetrahedron.
//!
//! Faces of adjacent tetrahedra pair through face `opp` links; the edge uses
//! of paired faces pair as well.

use cmesh_geom::{
    orient_3d, point_in_tetrahedron, tetrahedron_signed_volume6, Aabb3, DVec3,
};
use config::constants::CONTAINMENT_TOLERANCE;
use config::MeshConfig;
use tracing::{debug, warn};

use crate::arena::{Arena, Coord, EdgeUse, Element, Node, SqueezeMap};
use crate::error::{MeshError, MeshResult};
use crate::grid::SpatialGrid;
use crate::ids::{EdgeUseId, ElementId, FaceId, NodeId};
use crate::mesh::SimplicialMesh;

type Arena3 = Arena<DVec3, 4, 12>;

/// Local node cycle of each face.
pub const FACE_NODES: [[usize; 3]; 4] = [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]];

/// Tetrahedron face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Face {
    /// Matching face of the adjacent tetrahedron, `None` on the boundary.
    pub opp: Option<FaceId>,
}

#[inline]
fn face_id(e: ElementId, f: usize) -> FaceId {
    FaceId((e.index() * 4 + f) as u32)
}

#[inline]
fn face_of(eu: EdgeUseId) -> FaceId {
    FaceId((eu.index() / 3) as u32)
}

#[inline]
fn face_element(face: FaceId) -> ElementId {
    ElementId((face.index() / 4) as u32)
}

/// Conforming tetrahedral mesh.
#[derive(Debug, Clone)]
pub struct Mesh3D {
    arena: Arena3,
    faces: Vec<Face>,
    config: MeshConfig,
    bbox: Aabb3,
    grid: Option<SpatialGrid>,
}

impl Default for Mesh3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh3D {
    /// Creates an empty mesh with default settings.
    pub fn new() -> Self {
        Self::with_config(MeshConfig::default())
    }

    /// Creates an empty mesh.
    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            arena: Arena::new(),
            faces: Vec::new(),
            config,
            bbox: Aabb3::EMPTY,
            grid: None,
        }
    }

    /// Builds a mesh from positions and tetrahedra given as position indices,
    /// then indexes it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cmesh::{Mesh3D, SimplicialMesh};
    /// use glam::DVec3;
    ///
    /// let positions = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
    /// let mesh = Mesh3D::from_tetrahedra(&positions, &[[0, 1, 2, 3]]).unwrap();
    /// assert_eq!(mesh.count_boundary_nodes().unwrap(), 4);
    /// ```
    pub fn from_tetrahedra(positions: &[DVec3], tetrahedra: &[[usize; 4]]) -> MeshResult<Self> {
        Self::from_tetrahedra_with_config(MeshConfig::default(), positions, tetrahedra)
    }

    /// [`Mesh3D::from_tetrahedra`] with explicit settings.
    pub fn from_tetrahedra_with_config(
        config: MeshConfig,
        positions: &[DVec3],
        tetrahedra: &[[usize; 4]],
    ) -> MeshResult<Self> {
        let mut mesh = Self::with_config(config);
        for &p in positions {
            mesh.add_node(p);
        }
        for t in tetrahedra {
            mesh.add_element(t.map(|i| NodeId(i as u32)))?;
        }
        mesh.rebuild_grid();
        debug!(
            nodes = mesh.node_count(),
            elements = mesh.element_count(),
            "built tetrahedral mesh"
        );
        Ok(mesh)
    }

    /// Adds an isolated node.
    pub fn add_node(&mut self, position: DVec3) -> NodeId {
        self.bbox.expand(position);
        self.grid = None;
        self.arena.add_node(position)
    }

    /// Adds a tetrahedron and links its faces to its neighbors.
    ///
    /// Negatively oriented input swaps its last two nodes.
    ///
    /// # Errors
    ///
    /// `InvalidNode`, `DegenerateElement` for a flat tetrahedron and
    /// `NonManifold` for a face that is already shared. The mesh is
    /// unchanged on error.
    pub fn add_element(&mut self, nodes: [NodeId; 4]) -> MeshResult<ElementId> {
        for n in nodes {
            self.arena.check_node(n)?;
        }
        let degenerate = || MeshError::DegenerateElement {
            nodes: nodes.to_vec(),
        };
        for i in 0..4 {
            if nodes[i + 1..].contains(&nodes[i]) {
                return Err(degenerate());
            }
        }
        let [a, b, c, d] = nodes.map(|n| self.position(n));
        let volume = tetrahedron_signed_volume6(a, b, c, d);
        if volume.abs() <= self.config.tolerance_sq() {
            return Err(degenerate());
        }
        let [n0, n1, n2, n3] = nodes;
        let ordered = if volume < 0.0 { [n0, n1, n3, n2] } else { nodes };
        let e = self.push_element(ordered);
        if let Err(err) = self.link_element(e) {
            self.pop_element();
            return Err(err);
        }
        self.grid = None;
        Ok(e)
    }

    fn push_element(&mut self, nodes: [NodeId; 4]) -> ElementId {
        self.faces.extend([Face::default(); 4]);
        self.arena.push_element(nodes)
    }

    fn pop_element(&mut self) {
        self.arena.pop_element();
        self.faces.truncate(self.arena.elements.len() * 4);
    }

    /// Finds a live face whose node cycle is `(a, b, c)` up to rotation.
    fn find_face(&self, a: NodeId, b: NodeId, c: NodeId) -> MeshResult<Option<FaceId>> {
        let mut found = None;
        self.arena.try_for_each_disk(a, |eu| {
            let next = self.arena.edge_uses[eu.index()].next;
            let last = self.arena.edge_uses[next.index()].next;
            if found.is_none()
                && self.arena.edge_uses[next.index()].node == b
                && self.arena.edge_uses[last.index()].node == c
            {
                found = Some(face_of(eu));
            }
            Ok(())
        })?;
        Ok(found)
    }

    fn link_element(&mut self, e: ElementId) -> MeshResult<()> {
        let nodes = self.arena.elements[e.index()].nodes;
        let mut partners = [None; 4];
        for (f, partner) in partners.iter_mut().enumerate() {
            let [a, b, c] = FACE_NODES[f].map(|i| nodes[i]);
            let non_manifold = || MeshError::NonManifold {
                what: "face",
                nodes: vec![a, b, c],
            };
            if self.find_face(a, b, c)?.is_some() {
                return Err(non_manifold());
            }
            if let Some(p) = self.find_face(a, c, b)? {
                if self.faces[p.index()].opp.is_some() {
                    return Err(non_manifold());
                }
                *partner = Some(p);
            }
        }
        for (f, partner) in partners.into_iter().enumerate() {
            let cycle = FACE_NODES[f].map(|i| nodes[i]);
            for (k, &node) in cycle.iter().enumerate() {
                let eu = Arena3::edge_use(e, 3 * f + k);
                self.arena.edge_uses[eu.index()] = EdgeUse {
                    node,
                    next: Arena3::edge_use(e, 3 * f + (k + 1) % 3),
                    nnxt: eu,
                    opp: None,
                };
                self.arena.insert_into_disk(eu);
            }
            let Some(p) = partner else {
                continue;
            };
            let face = face_id(e, f);
            self.faces[face.index()].opp = Some(p);
            self.faces[p.index()].opp = Some(face);
            for k in 0..3 {
                let eu = Arena3::edge_use(e, 3 * f + k);
                let (origin, dest) = (cycle[k], cycle[(k + 1) % 3]);
                for j in 0..3 {
                    let o = EdgeUseId((p.index() * 3 + j) as u32);
                    let other = self.arena.edge_uses[o.index()];
                    if other.node == dest && self.arena.edge_uses[other.next.index()].node == origin
                    {
                        self.arena.edge_uses[eu.index()].opp = Some(o);
                        self.arena.edge_uses[o.index()].opp = Some(eu);
                    }
                }
            }
        }
        Ok(())
    }

    fn unlink_element(&mut self, e: ElementId) -> MeshResult<()> {
        for f in 0..4 {
            let face = face_id(e, f);
            if let Some(p) = self.faces[face.index()].opp.take() {
                self.faces[p.index()].opp = None;
            }
        }
        self.arena.unlink_edge_uses(e)
    }

    /// Removes a tetrahedron, leaving its nodes in place.
    pub fn delete_element(&mut self, e: ElementId) -> MeshResult<()> {
        self.arena.check_element(e)?;
        self.unlink_element(e)?;
        self.arena.mark_element_deleted(e);
        Ok(())
    }

    /// Removes a node together with every tetrahedron that uses it.
    pub fn delete_node(&mut self, n: NodeId) -> MeshResult<()> {
        for e in self.incident_elements(n)? {
            self.delete_element(e)?;
        }
        self.arena.mark_node_deleted(n);
        Ok(())
    }

    /// Compacts the arenas and rebuilds the grid. Returns the old to new id
    /// maps.
    pub fn squeeze(&mut self) -> MeshResult<SqueezeMap> {
        let compacted = self.arena.compacted();
        let mut mesh = Self::with_config(self.config);
        for p in compacted.positions {
            mesh.add_node(p);
        }
        for nodes in compacted.elements {
            let e = mesh.push_element(nodes);
            mesh.link_element(e)?;
        }
        mesh.rebuild_grid();
        *self = mesh;
        Ok(compacted.map)
    }

    /// Swaps the last two nodes of every negatively oriented tetrahedron and
    /// relinks it. Returns the number fixed; the mesh is unchanged on error.
    pub fn fix_negative_elements(&mut self) -> MeshResult<usize> {
        let tol = self.config.tolerance_sq();
        let mut negative = Vec::new();
        for e in self.arena.live_element_ids() {
            let volume = self.signed_volume6(e);
            if volume.abs() <= tol {
                return Err(MeshError::DegenerateElement {
                    nodes: self.element_nodes(e).to_vec(),
                });
            }
            if volume < 0.0 {
                negative.push(e);
            }
        }
        if negative.is_empty() {
            return Ok(0);
        }
        let mut work = self.clone();
        for &e in &negative {
            work.unlink_element(e)?;
        }
        for &e in &negative {
            let nodes = &mut work.arena.elements[e.index()].nodes;
            nodes.swap(2, 3);
            work.link_element(e)?;
        }
        *self = work;
        debug!(fixed = negative.len(), "reoriented tetrahedra");
        Ok(negative.len())
    }

    /// Replaces every node position, one per node slot, then refreshes the
    /// bounding box and grid.
    pub fn set_positions(&mut self, positions: &[DVec3]) -> MeshResult<()> {
        if positions.len() != self.arena.nodes.len() {
            return Err(MeshError::PositionCount {
                expected: self.arena.nodes.len(),
                found: positions.len(),
            });
        }
        for (node, &p) in self.arena.nodes.iter_mut().zip(positions) {
            node.position = p;
        }
        self.bbox = Aabb3::from_points(self.arena.live_node_ids().map(|n| self.position(n)));
        self.rebuild_grid();
        Ok(())
    }

    /// Rebuilds the spatial grid from the live nodes and tetrahedra.
    pub fn rebuild_grid(&mut self) {
        let nodes: Vec<_> = self
            .arena
            .live_node_ids()
            .map(|n| (n, self.position(n)))
            .collect();
        let elements: Vec<_> = self
            .arena
            .live_element_ids()
            .map(|e| {
                let bb = Aabb3::from_points(self.element_nodes(e).iter().map(|&n| self.position(n)));
                (e, bb)
            })
            .collect();
        self.grid = Some(SpatialGrid::build(
            self.bbox,
            3,
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
    pub fn node(&self, n: NodeId) -> Option<&Node<DVec3>> {
        self.arena.nodes.get(n.index())
    }

    /// Element slot, including deleted ones.
    pub fn element(&self, e: ElementId) -> Option<&Element<4>> {
        self.arena.elements.get(e.index())
    }

    /// Face slot.
    pub fn face(&self, face: FaceId) -> Option<&Face> {
        self.faces.get(face.index())
    }

    /// Edge-use slot.
    pub fn edge_use(&self, eu: EdgeUseId) -> Option<&EdgeUse> {
        self.arena.edge_uses.get(eu.index())
    }

    /// Face `f` of element `e`.
    pub fn element_face(e: ElementId, f: usize) -> FaceId {
        face_id(e, f)
    }

    /// Nodes of face `f` of `e`, outward cycle.
    pub fn face_nodes(&self, e: ElementId, f: usize) -> [NodeId; 3] {
        let nodes = self.arena.elements[e.index()].nodes;
        FACE_NODES[f].map(|i| nodes[i])
    }

    /// Edge uses starting at `n`, in disk order.
    pub fn disk_walk(&self, n: NodeId) -> MeshResult<Vec<EdgeUseId>> {
        self.arena.disk_walk(n)
    }

    /// Nodes sharing a tetrahedron with `n`.
    pub fn node_ring(&self, n: NodeId) -> MeshResult<Vec<NodeId>> {
        self.arena.node_ring(n)
    }

    /// Six times the signed volume of `e`.
    pub fn signed_volume6(&self, e: ElementId) -> f64 {
        let [a, b, c, d] = self.arena.elements[e.index()].nodes.map(|n| self.position(n));
        tetrahedron_signed_volume6(a, b, c, d)
    }

    /// Whether any face of `e` lies on the boundary.
    pub fn is_boundary_element(&self, e: ElementId) -> bool {
        (0..4).any(|f| self.faces[face_id(e, f).index()].opp.is_none())
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
    pub fn bounding_box(&self) -> Aabb3 {
        self.bbox
    }

    /// Squared length of the longest edge.
    pub fn max_sq_edge_length(&self) -> f64 {
        self.arena.max_sq_edge_length()
    }

    /// A live node within tolerance of `p`.
    pub fn find_node(&self, p: DVec3) -> Option<NodeId> {
        let tol = self.config.tolerance;
        let near = |n: &NodeId| self.is_node_valid(*n) && self.position(*n).distance_sq(p) <= tol * tol;
        match &self.grid {
            Some(grid) => grid.nodes_near(p, tol).into_iter().find(near),
            None => self.arena.live_node_ids().find(near),
        }
    }

    /// Checks every link invariant and element orientation, returning the
    /// first violation as `Topology`.
    pub fn verify(&self) -> MeshResult<()> {
        self.arena.verify_disks()?;
        let tol = self.config.tolerance_sq();
        for e in self.arena.live_element_ids() {
            for f in 0..4 {
                let cycle = self.face_nodes(e, f);
                for (k, &node) in cycle.iter().enumerate() {
                    let eu = Arena3::edge_use(e, 3 * f + k);
                    let link = self.arena.edge_uses[eu.index()];
                    if link.node != node || link.next != Arena3::edge_use(e, 3 * f + (k + 1) % 3) {
                        return Err(MeshError::topology(format!(
                            "edge use {eu:?} does not match face {f} of {e:?}"
                        )));
                    }
                    if let Some(o) = link.opp {
                        if self.arena.edge_uses[o.index()].opp != Some(eu) {
                            return Err(MeshError::topology(format!(
                                "{eu:?} -> {o:?} is not mutual"
                            )));
                        }
                    }
                }
                let face = face_id(e, f);
                let [a, b, c] = cycle;
                match self.faces[face.index()].opp {
                    Some(p) => {
                        if !self.arena.is_element_valid(face_element(p)) {
                            return Err(MeshError::topology(format!(
                                "{face:?} is paired with deleted face {p:?}"
                            )));
                        }
                        if self.faces[p.index()].opp != Some(face) {
                            return Err(MeshError::topology(format!(
                                "{face:?} -> {p:?} is not mutual"
                            )));
                        }
                        if self.find_face(a, c, b)? != Some(p) {
                            return Err(MeshError::topology(format!(
                                "{face:?} and {p:?} do not share reversed nodes"
                            )));
                        }
                    }
                    None => {
                        if self.find_face(a, c, b)?.is_some() {
                            return Err(MeshError::topology(format!(
                                "shared face {face:?} is not paired"
                            )));
                        }
                    }
                }
            }
            if self.signed_volume6(e) <= tol {
                return Err(MeshError::topology(format!(
                    "element {e:?} is not positively oriented"
                )));
            }
        }
        Ok(())
    }

    fn element_contains(&self, e: ElementId, p: DVec3) -> bool {
        let [a, b, c, d] = self.arena.elements[e.index()].nodes.map(|n| self.position(n));
        point_in_tetrahedron(p, a, b, c, d, CONTAINMENT_TOLERANCE)
    }

    fn walk_towards(&self, start: ElementId, p: DVec3) -> Option<ElementId> {
        let mut e = start;
        for _ in 0..=self.arena.elements.len() {
            if self.element_contains(e, p) {
                return Some(e);
            }
            let side = (0..4).find(|&f| {
                let [a, b, c] = self.face_nodes(e, f).map(|n| self.position(n));
                orient_3d(a, b, c, p) > 0.0
            })?;
            e = self.neighbors_of(e, side)?;
        }
        None
    }
}

impl SimplicialMesh for Mesh3D {
    type Point = DVec3;

    const NODES_PER_ELEMENT: usize = 4;

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
    fn position(&self, n: NodeId) -> DVec3 {
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
        if side >= 4 || !self.arena.is_element_valid(e) {
            return None;
        }
        self.faces[face_id(e, side).index()].opp.map(face_element)
    }

    fn side_opposite(local: usize) -> usize {
        local
    }

    fn is_boundary(&self, n: NodeId) -> MeshResult<bool> {
        let mut boundary = false;
        self.arena.try_for_each_disk(n, |eu| {
            boundary |= self.faces[face_of(eu).index()].opp.is_none();
            Ok(())
        })?;
        Ok(boundary)
    }

    fn locate_enclosing_element(&self, p: DVec3) -> MeshResult<ElementId> {
        if self.arena.element_count() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if !self.bbox.contains(p, self.config.tolerance) {
            return Err(MeshError::NotFound);
        }
        let Some(grid) = &self.grid else {
            warn!("spatial grid is stale, scanning all tetrahedra");
            return self
                .arena
                .live_element_ids()
                .find(|&e| self.element_contains(e, p))
                .ok_or(MeshError::NotFound);
        };
        let candidates: Vec<_> = grid
            .elements_near(p, self.config.tolerance)
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

//! Queries shared by the 2D and 3D meshes.

use config::MeshConfig;

use crate::arena::Coord;
use crate::error::{MeshError, MeshResult};
use crate::ids::{ElementId, NodeId};

/// A conforming simplicial mesh: triangles in 2D, tetrahedra in 3D.
///
/// Node and element ids index arenas that keep deleted slots, so
/// `max_node_index` can exceed `node_count`.
pub trait SimplicialMesh {
    /// Node position type.
    type Point: Coord;

    /// Nodes per element.
    const NODES_PER_ELEMENT: usize;

    /// Settings the mesh was built with.
    fn config(&self) -> &MeshConfig;

    /// Size of the node arena, including deleted slots.
    fn max_node_index(&self) -> usize;

    /// Size of the element arena, including deleted slots.
    fn max_element_index(&self) -> usize;

    /// Number of live nodes.
    fn node_count(&self) -> usize;

    /// Number of live elements.
    fn element_count(&self) -> usize;

    /// Whether `n` names a live node.
    fn is_node_valid(&self, n: NodeId) -> bool;

    /// Whether `e` names a live element.
    fn is_element_valid(&self, e: ElementId) -> bool;

    /// Position of node `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is outside the node arena.
    fn position(&self, n: NodeId) -> Self::Point;

    /// Nodes of element `e` in positive orientation.
    ///
    /// # Panics
    ///
    /// Panics if `e` is outside the element arena.
    fn element_nodes(&self, e: ElementId) -> &[NodeId];

    /// Appends the distinct elements around `n` to `out`, in disk order.
    fn incident_elements_into(&self, n: NodeId, out: &mut Vec<ElementId>) -> MeshResult<()>;

    /// The element across `side` of `e`, or `None` on the boundary.
    fn neighbors_of(&self, e: ElementId, side: usize) -> Option<ElementId>;

    /// The side of an element facing away from its `local`-th node.
    fn side_opposite(local: usize) -> usize;

    /// Whether any edge or face incident to `n` has no partner.
    fn is_boundary(&self, n: NodeId) -> MeshResult<bool>;

    /// An element whose closure contains `p`.
    fn locate_enclosing_element(&self, p: Self::Point) -> MeshResult<ElementId>;

    /// Distinct elements around `n`, in disk order.
    fn incident_elements(&self, n: NodeId) -> MeshResult<Vec<ElementId>> {
        let mut out = Vec::new();
        self.incident_elements_into(n, &mut out)?;
        Ok(out)
    }

    /// All live boundary nodes in id order.
    fn boundary_nodes(&self) -> MeshResult<Vec<NodeId>> {
        let mut out = Vec::new();
        for i in 0..self.max_node_index() {
            let n = NodeId(i as u32);
            if self.is_node_valid(n) && self.is_boundary(n)? {
                out.push(n);
            }
        }
        Ok(out)
    }

    /// Number of live boundary nodes.
    fn count_boundary_nodes(&self) -> MeshResult<usize> {
        Ok(self.boundary_nodes()?.len())
    }

    /// Nodes of `e` in element order, followed by every other node sharing
    /// an element with one of them. No duplicates.
    fn element_ring_nodes(&self, e: ElementId) -> MeshResult<Vec<NodeId>> {
        if !self.is_element_valid(e) {
            return Err(MeshError::InvalidElement(e));
        }
        let own = self.element_nodes(e);
        let mut ring = own.to_vec();
        let mut around = Vec::new();
        for &n in own {
            around.clear();
            self.incident_elements_into(n, &mut around)?;
            for &other in &around {
                for &m in self.element_nodes(other) {
                    if !ring.contains(&m) {
                        ring.push(m);
                    }
                }
            }
        }
        Ok(ring)
    }

    /// `e` itself, then its side neighbors in side order, then the elements
    /// that touch it only at nodes or edges. No duplicates.
    fn element_ring_elements(&self, e: ElementId) -> MeshResult<Vec<ElementId>> {
        if !self.is_element_valid(e) {
            return Err(MeshError::InvalidElement(e));
        }
        let mut ring = vec![e];
        for side in 0..Self::NODES_PER_ELEMENT {
            if let Some(f) = self.neighbors_of(e, side) {
                ring.push(f);
            }
        }
        let mut around = Vec::new();
        for &n in self.element_nodes(e) {
            around.clear();
            self.incident_elements_into(n, &mut around)?;
            for &other in &around {
                if !ring.contains(&other) {
                    ring.push(other);
                }
            }
        }
        Ok(ring)
    }
}

//! # Arena Storage
//!
//! Flat node, edge-use and element arenas shared by the 2D and 3D meshes.
//!
//! Element `e` owns edge uses `U*e .. U*e + U`, so the owner of an edge use
//! is found by division. Every edge use is threaded into the `nnxt` disk of
//! its origin node; the node's `rotor` is the disk head.
//!
//! Deleted nodes and elements keep their slots until [`squeeze`] style
//! compaction rebuilds the arenas.
//!
//! [`squeeze`]: crate::Mesh2D::squeeze

use config::constants::DISK_WALK_SLACK;
use glam::{DVec2, DVec3};

use crate::error::{MeshError, MeshResult};
use crate::ids::{EdgeUseId, ElementId, NodeId};

/// Position type of a mesh node.
pub trait Coord: Copy + std::fmt::Debug + PartialEq {
    /// Squared Euclidean distance.
    fn distance_sq(self, other: Self) -> f64;
    /// The point in 3D, with `z = 0` for planar points.
    fn to_3d(self) -> DVec3;
}

impl Coord for DVec2 {
    #[inline]
    fn distance_sq(self, other: Self) -> f64 {
        self.distance_squared(other)
    }

    #[inline]
    fn to_3d(self) -> DVec3 {
        self.extend(0.0)
    }
}

impl Coord for DVec3 {
    #[inline]
    fn distance_sq(self, other: Self) -> f64 {
        self.distance_squared(other)
    }

    #[inline]
    fn to_3d(self) -> DVec3 {
        self
    }
}

/// Mesh node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node<P> {
    /// Node position.
    pub position: P,
    /// Head of the node's disk, `None` for an isolated node.
    pub rotor: Option<EdgeUseId>,
    /// Cached boundary flag, see `set_boundary_flags`.
    pub boundary: bool,
    pub(crate) deleted: bool,
}

impl<P> Node<P> {
    /// Creates an isolated node.
    pub fn new(position: P) -> Self {
        Self {
            position,
            rotor: None,
            boundary: false,
            deleted: false,
        }
    }

    /// Whether the slot has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// A directed edge of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeUse {
    /// Origin node.
    pub node: NodeId,
    /// Following edge use around the same triangle or face.
    pub next: EdgeUseId,
    /// Next edge use in the origin node's disk.
    pub nnxt: EdgeUseId,
    /// Matching edge use of the adjacent element, `None` on the boundary.
    pub opp: Option<EdgeUseId>,
}

/// Element slot holding its `N` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<const N: usize> {
    /// Nodes in positive orientation.
    pub nodes: [NodeId; N],
    pub(crate) deleted: bool,
}

impl<const N: usize> Element<N> {
    /// Whether the slot has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Node, edge-use and element arenas for elements with `N` nodes and `U`
/// edge uses each.
#[derive(Debug, Clone)]
pub(crate) struct Arena<P, const N: usize, const U: usize> {
    pub(crate) nodes: Vec<Node<P>>,
    pub(crate) edge_uses: Vec<EdgeUse>,
    pub(crate) elements: Vec<Element<N>>,
    live_nodes: usize,
    live_elements: usize,
}

impl<P: Coord, const N: usize, const U: usize> Arena<P, N, U> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edge_uses: Vec::new(),
            elements: Vec::new(),
            live_nodes: 0,
            live_elements: 0,
        }
    }

    pub(crate) fn add_node(&mut self, position: P) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(position));
        self.live_nodes += 1;
        id
    }

    /// Appends an unlinked element slot and its edge-use block.
    pub(crate) fn push_element(&mut self, nodes: [NodeId; N]) -> ElementId {
        let id = ElementId::from_index(self.elements.len());
        self.elements.push(Element {
            nodes,
            deleted: false,
        });
        let base = self.edge_uses.len();
        self.edge_uses.extend((0..U).map(|k| {
            let eu = EdgeUseId::from_index(base + k);
            EdgeUse {
                node: nodes[0],
                next: eu,
                nnxt: eu,
                opp: None,
            }
        }));
        self.live_elements += 1;
        id
    }

    /// Removes the last element slot, used to roll back a failed insert.
    pub(crate) fn pop_element(&mut self) {
        if self.elements.pop().is_some() {
            self.edge_uses.truncate(self.elements.len() * U);
            self.live_elements -= 1;
        }
    }

    pub(crate) fn mark_element_deleted(&mut self, e: ElementId) {
        self.elements[e.index()].deleted = true;
        self.live_elements -= 1;
    }

    pub(crate) fn mark_node_deleted(&mut self, n: NodeId) {
        self.nodes[n.index()].deleted = true;
        self.live_nodes -= 1;
    }

    pub(crate) fn node_count(&self) -> usize {
        self.live_nodes
    }

    pub(crate) fn element_count(&self) -> usize {
        self.live_elements
    }

    #[inline]
    pub(crate) fn is_node_valid(&self, n: NodeId) -> bool {
        self.nodes.get(n.index()).is_some_and(|node| !node.deleted)
    }

    #[inline]
    pub(crate) fn is_element_valid(&self, e: ElementId) -> bool {
        self.elements.get(e.index()).is_some_and(|el| !el.deleted)
    }

    pub(crate) fn check_node(&self, n: NodeId) -> MeshResult<()> {
        if self.is_node_valid(n) {
            Ok(())
        } else {
            Err(MeshError::InvalidNode(n))
        }
    }

    pub(crate) fn check_element(&self, e: ElementId) -> MeshResult<()> {
        if self.is_element_valid(e) {
            Ok(())
        } else {
            Err(MeshError::InvalidElement(e))
        }
    }

    #[inline]
    pub(crate) fn element_of(eu: EdgeUseId) -> ElementId {
        ElementId::from_index(eu.index() / U)
    }

    #[inline]
    pub(crate) fn edge_use(e: ElementId, k: usize) -> EdgeUseId {
        EdgeUseId::from_index(e.index() * U + k)
    }

    pub(crate) fn live_element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| !el.deleted)
            .map(|(i, _)| ElementId::from_index(i))
    }

    pub(crate) fn live_node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.deleted)
            .map(|(i, _)| NodeId::from_index(i))
    }

    fn walk_bound(&self) -> usize {
        self.edge_uses.len() + DISK_WALK_SLACK
    }

    /// Visits every edge use in the disk of `node`, starting at its rotor.
    ///
    /// Fails with a topology error if the `nnxt` ring leaves the node or
    /// does not close within the arena size.
    pub(crate) fn try_for_each_disk<F>(&self, node: NodeId, mut f: F) -> MeshResult<()>
    where
        F: FnMut(EdgeUseId) -> MeshResult<()>,
    {
        self.check_node(node)?;
        let Some(head) = self.nodes[node.index()].rotor else {
            return Ok(());
        };
        let bound = self.walk_bound();
        let mut eu = head;
        for _ in 0..bound {
            let link = self
                .edge_uses
                .get(eu.index())
                .ok_or_else(|| MeshError::topology(format!("edge use {eu:?} out of range")))?;
            if link.node != node {
                return Err(MeshError::topology(format!(
                    "edge use {eu:?} in disk of {node:?} starts at {:?}",
                    link.node
                )));
            }
            f(eu)?;
            eu = link.nnxt;
            if eu == head {
                return Ok(());
            }
        }
        Err(MeshError::topology(format!(
            "disk of {node:?} does not close within {bound} steps"
        )))
    }

    pub(crate) fn disk_walk(&self, node: NodeId) -> MeshResult<Vec<EdgeUseId>> {
        let mut out = Vec::new();
        self.try_for_each_disk(node, |eu| {
            out.push(eu);
            Ok(())
        })?;
        Ok(out)
    }

    /// Distinct elements around `node` in disk order, appended to `out`.
    pub(crate) fn incident_elements_into(
        &self,
        node: NodeId,
        out: &mut Vec<ElementId>,
    ) -> MeshResult<()> {
        let start = out.len();
        self.try_for_each_disk(node, |eu| {
            let e = Self::element_of(eu);
            if !out[start..].contains(&e) {
                out.push(e);
            }
            Ok(())
        })
    }

    /// Distinct nodes sharing an element with `node`.
    pub(crate) fn node_ring(&self, node: NodeId) -> MeshResult<Vec<NodeId>> {
        let mut elements = Vec::new();
        self.incident_elements_into(node, &mut elements)?;
        let mut ring = Vec::new();
        for e in elements {
            for &m in &self.elements[e.index()].nodes {
                if m != node && !ring.contains(&m) {
                    ring.push(m);
                }
            }
        }
        Ok(ring)
    }

    /// Threads `eu` into the disk of its origin node, after the rotor.
    pub(crate) fn insert_into_disk(&mut self, eu: EdgeUseId) {
        let node = self.edge_uses[eu.index()].node;
        match self.nodes[node.index()].rotor {
            None => {
                self.edge_uses[eu.index()].nnxt = eu;
                self.nodes[node.index()].rotor = Some(eu);
            }
            Some(head) => {
                self.edge_uses[eu.index()].nnxt = self.edge_uses[head.index()].nnxt;
                self.edge_uses[head.index()].nnxt = eu;
            }
        }
    }

    /// Unthreads `eu` from its origin node's disk.
    pub(crate) fn remove_from_disk(&mut self, eu: EdgeUseId) -> MeshResult<()> {
        let node = self.edge_uses[eu.index()].node;
        let mut prev = None;
        self.try_for_each_disk(node, |d| {
            if self.edge_uses[d.index()].nnxt == eu {
                prev = Some(d);
            }
            Ok(())
        })?;
        let prev = prev.ok_or_else(|| {
            MeshError::topology(format!("edge use {eu:?} missing from disk of {node:?}"))
        })?;
        let after = self.edge_uses[eu.index()].nnxt;
        let rotor = &mut self.nodes[node.index()].rotor;
        if prev == eu {
            *rotor = None;
        } else {
            self.edge_uses[prev.index()].nnxt = after;
            if *rotor == Some(eu) {
                *rotor = Some(after);
            }
        }
        self.edge_uses[eu.index()].nnxt = eu;
        Ok(())
    }

    /// Unthreads every edge use of `e` and clears their `opp` partners.
    pub(crate) fn unlink_edge_uses(&mut self, e: ElementId) -> MeshResult<()> {
        for k in 0..U {
            let eu = Self::edge_use(e, k);
            self.remove_from_disk(eu)?;
            if let Some(o) = self.edge_uses[eu.index()].opp.take() {
                self.edge_uses[o.index()].opp = None;
            }
        }
        Ok(())
    }

    /// Searches the disk of `origin` for an edge use running to `dest`.
    pub(crate) fn find_directed_edge(
        &self,
        origin: NodeId,
        dest: NodeId,
    ) -> MeshResult<Option<EdgeUseId>> {
        let mut found = None;
        self.try_for_each_disk(origin, |eu| {
            let next = self.edge_uses[eu.index()].next;
            if found.is_none() && self.edge_uses[next.index()].node == dest {
                found = Some(eu);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// Checks ring membership: every disk closes, holds only edge uses of
    /// live elements starting at its node, and holds all of them.
    pub(crate) fn verify_disks(&self) -> MeshResult<()> {
        let mut expected = vec![0usize; self.nodes.len()];
        for e in self.live_element_ids() {
            for k in 0..U {
                let n = self.edge_uses[Self::edge_use(e, k).index()].node;
                self.check_node(n).map_err(|_| {
                    MeshError::topology(format!("element {e:?} uses deleted node {n:?}"))
                })?;
                expected[n.index()] += 1;
            }
        }
        for n in self.live_node_ids() {
            let mut count = 0usize;
            self.try_for_each_disk(n, |eu| {
                let e = Self::element_of(eu);
                if !self.is_element_valid(e) {
                    return Err(MeshError::topology(format!(
                        "disk of {n:?} holds {eu:?} of deleted element {e:?}"
                    )));
                }
                count += 1;
                Ok(())
            })?;
            if count != expected[n.index()] {
                return Err(MeshError::topology(format!(
                    "disk of {n:?} holds {count} edge uses, expected {}",
                    expected[n.index()]
                )));
            }
        }
        Ok(())
    }

    /// Squared length of the longest element edge.
    pub(crate) fn max_sq_edge_length(&self) -> f64 {
        let mut max = 0.0f64;
        for e in self.live_element_ids() {
            let nodes = &self.elements[e.index()].nodes;
            for i in 0..N {
                for j in (i + 1)..N {
                    let d = self.nodes[nodes[i].index()]
                        .position
                        .distance_sq(self.nodes[nodes[j].index()].position);
                    max = max.max(d);
                }
            }
        }
        max
    }

    /// Compacts the arenas into fresh node positions and element node
    /// lists, with the id maps from old to new slots.
    pub(crate) fn compacted(&self) -> Compacted<P, N> {
        let mut map = SqueezeMap {
            nodes: vec![None; self.nodes.len()],
            elements: vec![None; self.elements.len()],
        };
        let mut positions = Vec::with_capacity(self.live_nodes);
        for n in self.live_node_ids() {
            map.nodes[n.index()] = Some(NodeId::from_index(positions.len()));
            positions.push(self.nodes[n.index()].position);
        }
        let mut elements = Vec::with_capacity(self.live_elements);
        for e in self.live_element_ids() {
            let mut nodes = self.elements[e.index()].nodes;
            for n in nodes.iter_mut() {
                // Live elements only reference live nodes.
                if let Some(m) = map.nodes[n.index()] {
                    *n = m;
                }
            }
            map.elements[e.index()] = Some(ElementId::from_index(elements.len()));
            elements.push(nodes);
        }
        Compacted {
            map,
            positions,
            elements,
        }
    }
}

pub(crate) struct Compacted<P, const N: usize> {
    pub(crate) map: SqueezeMap,
    pub(crate) positions: Vec<P>,
    pub(crate) elements: Vec<[NodeId; N]>,
}

/// Old to new id maps produced by compaction. Deleted slots map to `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqueezeMap {
    /// Indexed by old node slot.
    pub nodes: Vec<Option<NodeId>>,
    /// Indexed by old element slot.
    pub elements: Vec<Option<ElementId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fan() -> Arena<DVec2, 3, 3> {
        let mut a = Arena::new();
        let n0 = a.add_node(DVec2::ZERO);
        let n1 = a.add_node(DVec2::X);
        let n2 = a.add_node(DVec2::Y);
        let e = a.push_element([n0, n1, n2]);
        for k in 0..3 {
            let eu = Arena::<DVec2, 3, 3>::edge_use(e, k);
            a.edge_uses[eu.index()].node = [n0, n1, n2][k];
            a.edge_uses[eu.index()].next = Arena::<DVec2, 3, 3>::edge_use(e, (k + 1) % 3);
            a.insert_into_disk(eu);
        }
        a
    }

    #[test]
    fn disk_insert_and_remove() {
        let mut a = fan();
        let n0 = NodeId(0);
        assert_eq!(a.disk_walk(n0).unwrap(), vec![EdgeUseId(0)]);
        a.remove_from_disk(EdgeUseId(0)).unwrap();
        assert_eq!(a.nodes[0].rotor, None);
        assert!(a.disk_walk(n0).unwrap().is_empty());
    }

    #[test]
    fn cut_ring_is_a_topology_error() {
        let mut a = fan();
        // Point node 1's disk at node 2's edge use.
        a.edge_uses[1].nnxt = EdgeUseId(2);
        let err = a.disk_walk(NodeId(1)).unwrap_err();
        assert!(matches!(err, MeshError::Topology { .. }));
    }

    #[test]
    fn unclosed_ring_is_bounded() {
        let mut a = fan();
        // A self loop that never returns to the head.
        a.edge_uses.push(EdgeUse {
            node: NodeId(0),
            next: EdgeUseId(3),
            nnxt: EdgeUseId(3),
            opp: None,
        });
        a.edge_uses[0].nnxt = EdgeUseId(3);
        let err = a.disk_walk(NodeId(0)).unwrap_err();
        assert!(matches!(err, MeshError::Topology { .. }));
    }

    #[test]
    fn ring_and_counts() {
        let a = fan();
        assert_eq!(a.node_count(), 3);
        assert_eq!(a.element_count(), 1);
        assert_eq!(a.node_ring(NodeId(0)).unwrap(), vec![NodeId(1), NodeId(2)]);
        assert_eq!(a.max_sq_edge_length(), 2.0);
        a.verify_disks().unwrap();
    }
}

//! Initial distances from seed points.
//!
//! Each seed sets exact Euclidean distances on the nodes of its enclosing
//! element. With line of sight enabled the Euclidean region then grows
//! element by element while the straight segment from the seed to the next
//! node stays inside the mesh. Overlapping seeds keep the minimum.

use cmesh::ids::{ElementId, NodeId};
use cmesh::{Coord, MeshError};
use config::MarchConfig;
use tracing::trace;

use crate::error::{filled, MarchError, MarchResult};
use crate::queue::PriorityQueue;
use crate::solver::Marchable;

/// Scratch state reused across seeds.
pub(crate) struct Seeder {
    seed_dist: Vec<f64>,
    visited: Vec<bool>,
    queue: PriorityQueue<ElementId>,
    incident: Vec<ElementId>,
}

impl Seeder {
    pub(crate) fn new(nodes: usize, elements: usize) -> MarchResult<Self> {
        Ok(Self {
            seed_dist: filled(nodes, f64::INFINITY, "seed distances")?,
            visited: filled(elements, false, "visited elements")?,
            queue: PriorityQueue::new(),
            incident: Vec::new(),
        })
    }

    /// Lowers `distances` to the Euclidean distance from `seed` wherever the
    /// seed can see. Returns the number of nodes reached.
    pub(crate) fn add_seed<M: Marchable>(
        &mut self,
        mesh: &M,
        seed: M::Point,
        index: usize,
        distances: &mut [f64],
        config: &MarchConfig,
    ) -> MarchResult<usize> {
        let start = mesh.locate_enclosing_element(seed).map_err(|err| match err {
            MeshError::NotFound => MarchError::SeedOutsideMesh { index },
            other => MarchError::from(other),
        })?;

        self.seed_dist.fill(f64::INFINITY);
        self.visited.fill(false);
        self.queue.clear();

        let mut reached = 0;
        for &n in mesh.element_nodes(start) {
            self.reach(mesh, n, seed, distances);
            reached += 1;
        }
        self.visited[start.index()] = true;
        self.push_neighbors(mesh, start, seed)?;

        if config.line_of_sight {
            while let Some((_, e)) = self.queue.pop_min() {
                if self.visited[e.index()] {
                    continue;
                }
                let nodes = mesh.element_nodes(e);
                let mut unknown = nodes
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| !self.seed_dist[n.index()].is_finite())
                    .map(|(i, _)| i);
                // Queued elements share a side with a resolved one.
                if let Some(local) = unknown.next() {
                    debug_assert!(unknown.next().is_none());
                    if !self.is_visible(mesh, e, local, seed, config.tolerance)? {
                        continue;
                    }
                    self.reach(mesh, nodes[local], seed, distances);
                    reached += 1;
                }
                self.visited[e.index()] = true;
                self.push_neighbors(mesh, e, seed)?;
            }
        }
        trace!(index, start = start.0, reached, "seed expanded");
        Ok(reached)
    }

    fn reach<M: Marchable>(&mut self, mesh: &M, n: NodeId, seed: M::Point, distances: &mut [f64]) {
        let d = seed.distance_sq(mesh.position(n)).sqrt();
        self.seed_dist[n.index()] = d;
        if d < distances[n.index()] {
            distances[n.index()] = d;
        }
    }

    /// Queues the unvisited neighbors of `e`, nearest unresolved node first.
    fn push_neighbors<M: Marchable>(
        &mut self,
        mesh: &M,
        e: ElementId,
        seed: M::Point,
    ) -> MarchResult<()> {
        for side in 0..M::NODES_PER_ELEMENT {
            let Some(nb) = mesh.neighbors_of(e, side) else {
                continue;
            };
            if self.visited[nb.index()] {
                continue;
            }
            let priority = mesh
                .element_nodes(nb)
                .iter()
                .filter(|n| !self.seed_dist[n.index()].is_finite())
                .map(|&n| seed.distance_sq(mesh.position(n)).sqrt())
                .fold(0.0, f64::max);
            self.queue.insert(priority, nb)?;
        }
        Ok(())
    }

    /// Whether the `local`-th node of `e` can be seen from `seed` through
    /// already resolved elements.
    fn is_visible<M: Marchable>(
        &mut self,
        mesh: &M,
        e: ElementId,
        local: usize,
        seed: M::Point,
        tol: f64,
    ) -> MarchResult<bool> {
        let u = mesh.element_nodes(e)[local];
        let target = mesh.position(u);
        if self.sees_through(mesh, e, local, seed, target, tol) {
            return Ok(true);
        }
        self.incident.clear();
        mesh.incident_elements_into(u, &mut self.incident)?;
        Ok(self.incident.iter().filter(|&&f| f != e).any(|&f| {
            mesh.element_nodes(f)
                .iter()
                .position(|&n| n == u)
                .is_some_and(|l| self.sees_through(mesh, f, l, seed, target, tol))
        }))
    }

    /// The segment `seed -> target` enters `f` through the side opposite its
    /// `local`-th node, and the element behind that side is fully resolved.
    fn sees_through<M: Marchable>(
        &self,
        mesh: &M,
        f: ElementId,
        local: usize,
        seed: M::Point,
        target: M::Point,
        tol: f64,
    ) -> bool {
        let side = M::side_opposite(local);
        mesh.segment_crosses_side(f, side, seed, target, tol)
            && mesh.neighbors_of(f, side).is_some_and(|nb| {
                mesh.element_nodes(nb)
                    .iter()
                    .all(|n| self.seed_dist[n.index()].is_finite())
            })
    }
}

//! The fast marching loop.
//!
//! Nodes leave a min queue in order of tentative distance. Each popped node
//! is frozen and the elements around it are revisited, most resolved first,
//! to lower the distances of their unfrozen nodes.

use cmesh::ids::{ElementId, NodeId};
use cmesh::SimplicialMesh;
use config::constants::DEFAULT_QUEUE_CAPACITY;
use config::MarchConfig;
use tracing::{debug, info};

use crate::distance::DistanceField;
use crate::error::{filled, MarchError, MarchResult};
use crate::flags::{MarchState, NodeFlags};
use crate::queue::PriorityQueue;
use crate::seed::Seeder;

/// A mesh the solver can march through.
///
/// Implemented for [`cmesh::Mesh2D`] and [`cmesh::Mesh3D`].
pub trait Marchable: SimplicialMesh {
    /// Whether the segment `from -> to` meets side `side` of `e`.
    fn segment_crosses_side(
        &self,
        e: ElementId,
        side: usize,
        from: Self::Point,
        to: Self::Point,
        tol: f64,
    ) -> bool;

    /// Pushes candidate distances for the unfrozen nodes of `e` onto `out`,
    /// using the frozen ones. `current` is the node just frozen.
    fn update_element(
        &self,
        e: ElementId,
        current: NodeId,
        distances: &[f64],
        flags: &[NodeFlags],
        tol: f64,
        out: &mut Vec<(NodeId, f64)>,
    );
}

/// Incremental fast marching over a mesh.
///
/// [`Marcher::step`] freezes one node at a time, which lets callers watch
/// the front advance; [`Marcher::run`] drives it to completion.
///
/// # Example
///
/// ```rust
/// use cmesh::Mesh2D;
/// use cmesh_fmm::Marcher;
/// use config::MarchConfig;
/// use glam::DVec2;
///
/// let positions = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y];
/// let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap();
/// let seeds = [DVec2::ZERO];
/// let config = MarchConfig::new(1.0e-6, false).unwrap();
/// let mut marcher = Marcher::new(&mesh, Some(&seeds[..]), &config).unwrap();
/// while let Some(_node) = marcher.step().unwrap() {}
/// assert!(marcher.distances().iter().all(|d| d.is_finite()));
/// ```
pub struct Marcher<'m, M: Marchable> {
    mesh: &'m M,
    config: MarchConfig,
    distances: Vec<f64>,
    flags: Vec<NodeFlags>,
    queue: PriorityQueue<NodeId>,
    elements: PriorityQueue<ElementId>,
    incident: Vec<ElementId>,
    updates: Vec<(NodeId, f64)>,
    frozen: usize,
}

impl<'m, M: Marchable> Marcher<'m, M> {
    /// Seeds the front and prepares the queue.
    ///
    /// With `seeds` absent or empty every boundary node starts at distance
    /// zero.
    ///
    /// # Errors
    ///
    /// [`MarchError::EmptyMesh`] for a mesh without elements,
    /// [`MarchError::SeedOutsideMesh`] for a seed no element contains and
    /// [`MarchError::NoBoundary`] when boundary seeding finds nothing.
    pub fn new(mesh: &'m M, seeds: Option<&[M::Point]>, config: &MarchConfig) -> MarchResult<Self> {
        if mesh.element_count() == 0 {
            return Err(MarchError::EmptyMesh);
        }
        let nodes = mesh.max_node_index();
        let mut distances = filled(nodes, f64::INFINITY, "distances")?;

        match seeds {
            Some(seeds) if !seeds.is_empty() => {
                let mut seeder = Seeder::new(nodes, mesh.max_element_index())?;
                let mut reached = 0;
                for (index, &seed) in seeds.iter().enumerate() {
                    reached += seeder.add_seed(mesh, seed, index, &mut distances, config)?;
                }
                debug!(seeds = seeds.len(), reached, "seeded from points");
            }
            _ => {
                let boundary = mesh.boundary_nodes()?;
                if boundary.is_empty() {
                    return Err(MarchError::NoBoundary);
                }
                for n in &boundary {
                    distances[n.index()] = 0.0;
                }
                debug!(nodes = boundary.len(), "seeded from boundary");
            }
        }

        let mut marcher = Self {
            mesh,
            config: *config,
            distances,
            flags: filled(nodes, NodeFlags::NONE, "node flags")?,
            queue: PriorityQueue::with_capacity(DEFAULT_QUEUE_CAPACITY),
            elements: PriorityQueue::new(),
            incident: Vec::new(),
            updates: Vec::new(),
            frozen: 0,
        };
        marcher.freeze_seeded()?;
        Ok(marcher)
    }

    /// Marks every seeded node known. Nodes whose whole neighborhood is
    /// seeded are done; the rest start the queue.
    fn freeze_seeded(&mut self) -> MarchResult<()> {
        for i in 0..self.distances.len() {
            if self.distances[i].is_finite() && self.mesh.is_node_valid(NodeId(i as u32)) {
                self.flags[i] = NodeFlags::KNOWN;
            }
        }
        let mut settled = 0;
        for i in 0..self.flags.len() {
            if !self.flags[i].contains(NodeFlags::KNOWN) {
                continue;
            }
            let n = NodeId(i as u32);
            self.incident.clear();
            self.mesh.incident_elements_into(n, &mut self.incident)?;
            let surrounded = self.incident.iter().all(|&e| {
                self.mesh
                    .element_nodes(e)
                    .iter()
                    .all(|m| self.distances[m.index()].is_finite())
            });
            if surrounded {
                self.flags[i].insert(NodeFlags::UPWIND);
                settled += 1;
            } else {
                self.queue.insert(self.distances[i], n)?;
            }
        }
        self.frozen = settled;
        debug!(settled, queued = self.queue.len(), "initial front");
        Ok(())
    }

    /// Lower is more resolved. Zero means nothing is left to update.
    fn element_priority(&self, e: ElementId, current: NodeId) -> usize {
        let nodes = self.mesh.element_nodes(e);
        let resolved: usize = nodes
            .iter()
            .map(|&n| {
                let f = self.flags[n.index()];
                usize::from(f.is_finalized())
                    + usize::from(n == current || f.contains(NodeFlags::UPWIND))
            })
            .sum();
        2 * nodes.len() - resolved
    }

    fn lower(&mut self, n: NodeId, d: f64) -> MarchResult<()> {
        let i = n.index();
        if self.flags[i].is_finalized() || d.is_nan() || d >= self.distances[i] {
            return Ok(());
        }
        self.distances[i] = d;
        self.flags[i].insert(NodeFlags::ACTIVE);
        self.queue.insert(d, n)
    }

    /// Freezes the nearest queued node and updates its neighborhood.
    /// Returns `None` once the queue is exhausted.
    pub fn step(&mut self) -> MarchResult<Option<NodeId>> {
        while let Some((_, n)) = self.queue.pop_min() {
            let i = n.index();
            if self.flags[i].contains(NodeFlags::UPWIND) {
                continue;
            }
            self.flags[i].insert(NodeFlags::KNOWN);

            self.incident.clear();
            self.mesh.incident_elements_into(n, &mut self.incident)?;
            self.elements.clear();
            for k in 0..self.incident.len() {
                let e = self.incident[k];
                let priority = self.element_priority(e, n);
                if priority > 0 {
                    self.elements.insert(priority as f64, e)?;
                }
            }

            let mut updates = std::mem::take(&mut self.updates);
            while let Some((_, e)) = self.elements.pop_min() {
                updates.clear();
                self.mesh.update_element(
                    e,
                    n,
                    &self.distances,
                    &self.flags,
                    self.config.tolerance,
                    &mut updates,
                );
                for &(m, d) in &updates {
                    self.lower(m, d)?;
                }
            }
            self.updates = updates;

            self.flags[i].insert(NodeFlags::UPWIND);
            self.frozen += 1;
            return Ok(Some(n));
        }
        Ok(None)
    }

    /// Marches until every reachable node is frozen.
    pub fn run(mut self) -> MarchResult<DistanceField> {
        while self.step()?.is_some() {}
        let frozen = self.frozen;
        let field = DistanceField::from_vec(self.distances);
        info!(
            frozen,
            max_distance = ?field.max_finite(),
            "fast marching complete"
        );
        Ok(field)
    }

    /// Current distances, infinite where the front has not arrived.
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn flags(&self) -> &[NodeFlags] {
        &self.flags
    }

    pub fn state(&self, n: NodeId) -> MarchState {
        self.flags
            .get(n.index())
            .map_or(MarchState::Unknown, |f| f.state())
    }

    /// Queue entries still pending, stale ones included.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn mesh(&self) -> &'m M {
        self.mesh
    }
}

/// Geodesic distance from the nearest seed to every node of `mesh`.
///
/// Without seeds, distances are measured from the mesh boundary.
///
/// # Example
///
/// ```rust
/// use cmesh::Mesh2D;
/// use cmesh_fmm::compute_distances;
/// use glam::DVec2;
///
/// let positions = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y];
/// let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap();
/// let field = compute_distances(&mesh, Some(&[DVec2::ZERO][..])).unwrap();
/// assert_eq!(field.as_slice()[0], 0.0);
/// assert!((field.as_slice()[2] - 2.0_f64.sqrt()).abs() < 1.0e-12);
/// ```
pub fn compute_distances<M: Marchable>(
    mesh: &M,
    seeds: Option<&[M::Point]>,
) -> MarchResult<DistanceField> {
    compute_distances_with(mesh, seeds, &MarchConfig::default())
}

/// [`compute_distances`] with explicit settings.
pub fn compute_distances_with<M: Marchable>(
    mesh: &M,
    seeds: Option<&[M::Point]>,
    config: &MarchConfig,
) -> MarchResult<DistanceField> {
    Marcher::new(mesh, seeds, config)?.run()
}

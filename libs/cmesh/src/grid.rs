//! # Spatial Grid
//!
//! Uniform bucket grid over the mesh bounding box. Each cell lists the nodes
//! inside it and the elements whose bounding box overlaps it. Used only to
//! accelerate point location; it holds no topology.
//!
//! Planar meshes use a grid one cell deep in `z`.

use cmesh_geom::{Aabb3, DVec3};
use config::constants::{MAX_GRID_CELLS_PER_AXIS, MIN_GRID_CELL_SIZE};
use tracing::debug;

use crate::ids::{ElementId, NodeId};

/// Occupancy of the non-empty cells of one bucket kind.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellCount {
    /// Cells holding at least one entry.
    pub occupied: usize,
    /// Fewest entries in an occupied cell.
    pub min: usize,
    /// Most entries in a cell.
    pub max: usize,
    /// Mean entries per occupied cell.
    pub mean: f64,
}

impl CellCount {
    fn from_buckets<T>(buckets: &[Vec<T>]) -> Self {
        let mut count = Self::default();
        let mut sum = 0;
        for len in buckets.iter().map(Vec::len).filter(|&len| len > 0) {
            count.min = if count.occupied == 0 { len } else { count.min.min(len) };
            count.max = count.max.max(len);
            count.occupied += 1;
            sum += len;
        }
        if count.occupied > 0 {
            count.mean = sum as f64 / count.occupied as f64;
        }
        count
    }
}

/// Per-cell load of a [`SpatialGrid`], for tuning `grid_cell_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellStats {
    /// Total number of cells.
    pub cells: usize,
    /// Node buckets.
    pub nodes: CellCount,
    /// Element buckets.
    pub elements: CellCount,
}

/// Bucket grid of node and element ids.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    origin: DVec3,
    cell_size: f64,
    dims: [usize; 3],
    nodes: Vec<Vec<NodeId>>,
    elements: Vec<Vec<ElementId>>,
}

impl SpatialGrid {
    /// Builds a grid over `bounds`.
    ///
    /// The cell size is the mean element extent scaled by `cell_factor`,
    /// where the mean extent assumes `element_count` elements evenly filling
    /// the box in `dim` dimensions.
    pub fn build<N, E>(bounds: Aabb3, dim: usize, cell_factor: f64, nodes: N, elements: E) -> Self
    where
        N: IntoIterator<Item = (NodeId, DVec3)>,
        E: ExactSizeIterator<Item = (ElementId, Aabb3)>,
    {
        let extent = bounds.extent();
        let axes = dim.clamp(1, 3);
        let mean_extent = extent.to_array()[..axes].iter().sum::<f64>() / axes as f64;
        let count = elements.len().max(1) as f64;
        let mut cell_size =
            (mean_extent / count.powf(1.0 / axes as f64) * cell_factor).max(MIN_GRID_CELL_SIZE);
        let longest = extent.max_element();
        cell_size = cell_size.max(longest / MAX_GRID_CELLS_PER_AXIS as f64);

        let mut dims = [1usize; 3];
        for (d, e) in dims.iter_mut().zip(extent.to_array()) {
            *d = ((e / cell_size).floor() as usize + 1).min(MAX_GRID_CELLS_PER_AXIS);
        }
        let cells = dims[0] * dims[1] * dims[2];
        let mut grid = Self {
            origin: if bounds.is_empty() { DVec3::ZERO } else { bounds.min },
            cell_size,
            dims,
            nodes: vec![Vec::new(); cells],
            elements: vec![Vec::new(); cells],
        };

        for (id, p) in nodes {
            let cell = grid.cell_index(grid.clamped_coord(p));
            grid.nodes[cell].push(id);
        }
        for (id, bb) in elements {
            let lo = grid.clamped_coord(bb.min);
            let hi = grid.clamped_coord(bb.max);
            for z in lo[2]..=hi[2] {
                for y in lo[1]..=hi[1] {
                    for x in lo[0]..=hi[0] {
                        let cell = grid.cell_index([x, y, z]);
                        grid.elements[cell].push(id);
                    }
                }
            }
        }
        debug!(
            cells,
            cell_size,
            dims = ?grid.dims,
            "spatial grid built"
        );
        grid
    }

    /// Cell edge length.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell counts along each axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Node and element load of the occupied cells. Empty cells only count
    /// towards `cells`.
    pub fn cell_stats(&self) -> CellStats {
        CellStats {
            cells: self.nodes.len(),
            nodes: CellCount::from_buckets(&self.nodes),
            elements: CellCount::from_buckets(&self.elements),
        }
    }

    /// Visits the distinct elements listed in cells overlapping the box
    /// `p ± tol`.
    pub fn elements_near(&self, p: DVec3, tol: f64) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.for_each_cell(p, tol, |cell| {
            for &e in &self.elements[cell] {
                if !out.contains(&e) {
                    out.push(e);
                }
            }
        });
        out
    }

    /// Nodes in cells overlapping the box `p ± tol`.
    pub fn nodes_near(&self, p: DVec3, tol: f64) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.for_each_cell(p, tol, |cell| out.extend_from_slice(&self.nodes[cell]));
        out
    }

    fn for_each_cell(&self, p: DVec3, tol: f64, mut f: impl FnMut(usize)) {
        let lo = self.clamped_coord(p - DVec3::splat(tol));
        let hi = self.clamped_coord(p + DVec3::splat(tol));
        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    f(self.cell_index([x, y, z]));
                }
            }
        }
    }

    fn clamped_coord(&self, p: DVec3) -> [usize; 3] {
        let rel = (p - self.origin) / self.cell_size;
        let mut c = [0usize; 3];
        for ((c, r), d) in c.iter_mut().zip(rel.to_array()).zip(self.dims) {
            *c = if r.is_nan() || r <= 0.0 {
                0
            } else {
                (r.floor() as usize).min(d - 1)
            };
        }
        c
    }

    #[inline]
    fn cell_index(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }
}

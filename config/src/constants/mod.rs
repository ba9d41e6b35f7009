//! # Configuration Constants
//!
//! Centralized constants for the mesh toolkit. Geometric tolerances, spatial
//! grid sizing and iteration bounds are defined here, together with the
//! validated configuration snapshots handed to the mesh and solver crates.
//!
//! ## Categories
//!
//! - **Precision**: Length, area/volume and angle tolerances
//! - **Spatial Grid**: Bucket grid sizing
//! - **Limits**: Bounds on cyclic walks and queue growth

use thiserror::Error;

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Length tolerance for mesh geometry.
///
/// Edges shorter than this are treated as zero length, and the wavefront
/// update rules fall back to straight edge propagation.
///
/// # Example
///
/// ```rust
/// use config::constants::MESH_TOLERANCE;
///
/// fn is_degenerate_edge(len: f64) -> bool {
///     len < MESH_TOLERANCE
/// }
///
/// assert!(is_degenerate_edge(1.0e-9));
/// assert!(!is_degenerate_edge(0.5));
/// ```
pub const MESH_TOLERANCE: f64 = 1.0e-6;

/// Squared length tolerance.
///
/// Used for twice the signed area of triangles and six times the signed
/// volume of tetrahedra: elements at or below this value are degenerate.
///
/// # Example
///
/// ```rust
/// use config::constants::MESH_TOLERANCE_SQ;
///
/// let twice_area = 1.0e-14;
/// assert!(twice_area < MESH_TOLERANCE_SQ);
/// ```
pub const MESH_TOLERANCE_SQ: f64 = MESH_TOLERANCE * MESH_TOLERANCE;

/// Tolerance used for barycentric containment tests, relative to the
/// element's own area or volume.
///
/// # Example
///
/// ```rust
/// use config::constants::CONTAINMENT_TOLERANCE;
/// assert!(CONTAINMENT_TOLERANCE < 1.0e-3);
/// ```
pub const CONTAINMENT_TOLERANCE: f64 = 1.0e-9;

/// Lower bound on the wavefront offset angle used by the 2D update rule.
///
/// Angles below `-ANGLE_TOLERANCE` are rejected as invalid.
///
/// # Example
///
/// ```rust
/// use config::constants::ANGLE_TOLERANCE;
/// assert!(ANGLE_TOLERANCE > 0.0);
/// ```
pub const ANGLE_TOLERANCE: f64 = f64::EPSILON;

/// Cosine of 5 degrees.
///
/// A finalized node of an edge-adjacent triangle may stand in for the
/// second known node of the 2D update only if it lies more than this angle
/// off the line from the first known node to the unknown one.
///
/// # Example
///
/// ```rust
/// use config::constants::NEIGHBOR_MAX_COS;
/// assert!((NEIGHBOR_MAX_COS - 5.0_f64.to_radians().cos()).abs() < 1.0e-6);
/// ```
pub const NEIGHBOR_MAX_COS: f64 = 0.996195;

// =============================================================================
// SPATIAL GRID CONSTANTS
// =============================================================================

/// Multiplier applied to the mean element size to obtain the grid cell size.
///
/// Larger values give fewer cells with more elements per cell.
///
/// # Example
///
/// ```rust
/// use config::constants::GRID_CELL_FACTOR;
/// let mean_element_size = 0.25;
/// let cell = mean_element_size * GRID_CELL_FACTOR;
/// assert!(cell > mean_element_size);
/// ```
pub const GRID_CELL_FACTOR: f64 = 2.0;

/// Minimum grid cell edge length.
///
/// # Example
///
/// ```rust
/// use config::constants::{MIN_GRID_CELL_SIZE, MESH_TOLERANCE};
/// assert!(MIN_GRID_CELL_SIZE > MESH_TOLERANCE);
/// ```
pub const MIN_GRID_CELL_SIZE: f64 = 1.0e-3;

/// Maximum number of cells along any one grid axis.
///
/// # Example
///
/// ```rust
/// use config::constants::MAX_GRID_CELLS_PER_AXIS;
/// assert!(MAX_GRID_CELLS_PER_AXIS >= 1);
/// ```
pub const MAX_GRID_CELLS_PER_AXIS: usize = 1024;

// =============================================================================
// LIMIT CONSTANTS
// =============================================================================

/// Slack added to the arena size when bounding cyclic walks.
///
/// A disk or adjacency walk that takes more than `arena_len + DISK_WALK_SLACK`
/// steps is reported as a topology error.
///
/// # Example
///
/// ```rust
/// use config::constants::DISK_WALK_SLACK;
/// let edge_uses = 12;
/// let bound = edge_uses + DISK_WALK_SLACK;
/// assert!(bound > edge_uses);
/// ```
pub const DISK_WALK_SLACK: usize = 8;

/// Initial capacity of the reusable local work queues.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_QUEUE_CAPACITY;
/// assert!(DEFAULT_QUEUE_CAPACITY.is_power_of_two());
/// ```
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

// =============================================================================
// CONFIGURATION SNAPSHOTS
// =============================================================================

/// Immutable settings for building and querying a conforming mesh.
///
/// # Examples
/// ```
/// use config::MeshConfig;
/// let config = MeshConfig::default();
/// assert!(config.tolerance > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshConfig {
    /// Length tolerance; areas and volumes use its square.
    pub tolerance: f64,
    /// Spatial grid cell size multiplier.
    pub grid_cell_factor: f64,
}

impl MeshConfig {
    /// Builds a mesh configuration, rejecting non-positive values.
    ///
    /// # Examples
    /// ```
    /// use config::MeshConfig;
    /// let cfg = MeshConfig::new(1.0e-8, 3.0).expect("valid config");
    /// assert_eq!(cfg.grid_cell_factor, 3.0);
    /// assert!(MeshConfig::new(0.0, 3.0).is_err());
    /// ```
    pub fn new(tolerance: f64, grid_cell_factor: f64) -> Result<Self, ConfigError> {
        check_tolerance(tolerance)?;
        if !(grid_cell_factor.is_finite() && grid_cell_factor > 0.0) {
            return Err(ConfigError::InvalidGridFactor(grid_cell_factor));
        }
        Ok(Self {
            tolerance,
            grid_cell_factor,
        })
    }

    /// Squared tolerance used for area and volume checks.
    pub fn tolerance_sq(&self) -> f64 {
        self.tolerance * self.tolerance
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            tolerance: MESH_TOLERANCE,
            grid_cell_factor: GRID_CELL_FACTOR,
        }
    }
}

/// Settings for a fast-marching distance computation.
///
/// # Examples
/// ```
/// use config::MarchConfig;
/// let config = MarchConfig::default();
/// assert!(config.line_of_sight);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchConfig {
    /// Length tolerance for the local update rules.
    pub tolerance: f64,
    /// Expand each seed's Euclidean region by line of sight through the
    /// mesh. When false only the enclosing element's nodes are seeded.
    pub line_of_sight: bool,
}

impl MarchConfig {
    /// Builds a solver configuration, rejecting a non-positive tolerance.
    ///
    /// # Examples
    /// ```
    /// use config::MarchConfig;
    /// let cfg = MarchConfig::new(1.0e-6, false).expect("valid config");
    /// assert!(!cfg.line_of_sight);
    /// ```
    pub fn new(tolerance: f64, line_of_sight: bool) -> Result<Self, ConfigError> {
        check_tolerance(tolerance)?;
        Ok(Self {
            tolerance,
            line_of_sight,
        })
    }
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            tolerance: MESH_TOLERANCE,
            line_of_sight: true,
        }
    }
}

fn check_tolerance(tolerance: f64) -> Result<(), ConfigError> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTolerance(tolerance))
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Raised when tolerance is zero, negative or not finite.
    #[error("tolerance must be positive and finite: {0}")]
    InvalidTolerance(f64),
    /// Raised when the grid cell factor is zero, negative or not finite.
    #[error("grid cell factor must be positive and finite: {0}")]
    InvalidGridFactor(f64),
}

//! # Config Crate
//!
//! Centralized configuration constants for the conforming mesh toolkit.
//! All tolerances and tunable parameters used by the geometry, mesh and
//! fast-marching crates are defined here so that they agree with each other.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{MESH_TOLERANCE, MESH_TOLERANCE_SQ};
//!
//! // Edge lengths below MESH_TOLERANCE are treated as zero.
//! let len: f64 = 1.0e-7;
//! assert!(len < MESH_TOLERANCE);
//!
//! // Twice-areas and six-volumes are compared against the squared tolerance.
//! assert_eq!(MESH_TOLERANCE_SQ, MESH_TOLERANCE * MESH_TOLERANCE);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Validated Overrides**: Runtime snapshots are built through checked
//!   constructors
//! - **Well-Documented**: Every constant has clear documentation

pub mod constants;

pub use constants::{ConfigError, MarchConfig, MeshConfig};

//! Per-node distance output.

use cmesh::ids::NodeId;

/// Geodesic distances indexed by node id.
///
/// Unreached nodes and deleted node slots hold `f64::INFINITY`.
///
/// # Example
///
/// ```rust
/// use cmesh::ids::NodeId;
/// use cmesh_fmm::DistanceField;
///
/// let field = DistanceField::from_vec(vec![0.0, 1.5, f64::INFINITY]);
/// assert_eq!(field.get(NodeId(1)), 1.5);
/// assert!(!field.is_reachable(NodeId(2)));
/// assert_eq!(field.max_finite(), Some(1.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceField {
    values: Vec<f64>,
}

impl DistanceField {
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Distance of `n`, infinite for ids outside the field.
    pub fn get(&self, n: NodeId) -> f64 {
        self.values.get(n.index()).copied().unwrap_or(f64::INFINITY)
    }

    pub fn is_reachable(&self, n: NodeId) -> bool {
        self.get(n).is_finite()
    }

    /// Largest finite distance, if any node was reached.
    pub fn max_finite(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .reduce(f64::max)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

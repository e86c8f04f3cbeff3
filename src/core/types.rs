//! Core type definitions for kernel SVR evaluation

use crate::core::{GkmError, Result};

/// Class labels derived from the positive/negative block sizes of a kernel matrix
///
/// The first `n_pos` entries are positives (1.0), the remaining `n_neg` are
/// negatives (0.0). Only the two counts are stored; labels are always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelVector {
    n_pos: usize,
    n_neg: usize,
}

impl LabelVector {
    /// Create a label vector for `n_pos` positives followed by `n_neg` negatives
    pub fn new(n_pos: usize, n_neg: usize) -> Self {
        Self { n_pos, n_neg }
    }

    /// Number of positive entries
    pub fn n_pos(&self) -> usize {
        self.n_pos
    }

    /// Number of negative entries
    pub fn n_neg(&self) -> usize {
        self.n_neg
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.n_pos + self.n_neg
    }

    /// Check if the vector is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether index `i` is a positive
    pub fn is_positive(&self, i: usize) -> bool {
        i < self.n_pos
    }

    /// Label value at index `i` (1.0 or 0.0)
    ///
    /// # Panics
    /// Panics if `i >= len()`
    pub fn get(&self, i: usize) -> f64 {
        assert!(i < self.len(), "label index {i} out of range");
        if self.is_positive(i) {
            1.0
        } else {
            0.0
        }
    }

    /// Labels gathered at the given indices
    pub fn select(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&i| self.get(i)).collect()
    }

    /// All labels in order
    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    /// Fail unless both classes are present
    pub fn require_both_classes(&self) -> Result<()> {
        if self.n_pos == 0 || self.n_neg == 0 {
            return Err(GkmError::config(format!(
                "both classes are required, got {} positives and {} negatives",
                self.n_pos, self.n_neg
            )));
        }
        Ok(())
    }
}

/// Result of the SVR dual optimization
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Expansion coefficients per training point (alpha+ minus alpha-)
    pub coefficients: Vec<f64>,
    /// Offset subtracted from the kernel expansion
    pub rho: f64,
    /// Indices of support vectors (non-zero coefficients)
    pub support_vectors: Vec<usize>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final dual objective value
    pub objective_value: f64,
}

/// Hyperparameters for the precomputed-kernel epsilon-SVR
///
/// Defaults are the fixed values used by both evaluation modes.
#[derive(Debug, Clone, PartialEq)]
pub struct SvrParams {
    /// Regularization parameter (upper bound for each dual variable)
    pub c: f64,
    /// Width of the epsilon-insensitive tube
    pub epsilon: f64,
    /// Stopping tolerance on the maximal KKT violation
    pub tolerance: f64,
    /// Enable the shrinking heuristic
    pub shrinking: bool,
    /// Kernel width; recorded for parity, a precomputed kernel ignores it
    pub gamma: f64,
    /// Q-matrix row cache size in megabytes
    pub cache_size: usize,
    /// Hard cap on solver iterations
    pub max_iterations: usize,
    /// Fit a Platt sigmoid so the model can produce probabilities
    pub probability: bool,
}

impl Default for SvrParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 1e-3,
            tolerance: 1e-3,
            shrinking: false,
            gamma: 1.0,
            cache_size: 256,
            max_iterations: 10_000_000,
            probability: true,
        }
    }
}

impl SvrParams {
    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set the tube width
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the stopping tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable shrinking
    pub fn with_shrinking(mut self, shrinking: bool) -> Self {
        self.shrinking = shrinking;
        self
    }

    /// Set the row cache size in megabytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable or disable probability calibration
    pub fn with_probability(mut self, probability: bool) -> Self {
        self.probability = probability;
        self
    }

    /// Check that all values are usable by the solver
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(GkmError::config(format!("C must be positive, got {}", self.c)));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(GkmError::config(format!(
                "epsilon must be non-negative, got {}",
                self.epsilon
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(GkmError::config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(GkmError::config("max_iterations must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_vector_layout() {
        let labels = LabelVector::new(3, 2);
        assert_eq!(labels.len(), 5);
        assert_eq!(labels.to_vec(), vec![1.0, 1.0, 1.0, 0.0, 0.0]);
        assert!(labels.is_positive(2));
        assert!(!labels.is_positive(3));
    }

    #[test]
    fn test_label_vector_select() {
        let labels = LabelVector::new(2, 2);
        assert_eq!(labels.select(&[3, 0, 2]), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_label_vector_requires_both_classes() {
        assert!(LabelVector::new(4, 4).require_both_classes().is_ok());
        assert!(matches!(
            LabelVector::new(0, 4).require_both_classes(),
            Err(GkmError::Configuration(_))
        ));
        assert!(matches!(
            LabelVector::new(4, 0).require_both_classes(),
            Err(GkmError::Configuration(_))
        ));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_label_vector_out_of_range() {
        LabelVector::new(1, 1).get(2);
    }

    #[test]
    fn test_svr_params_default() {
        let params = SvrParams::default();
        assert_eq!(params.c, 1.0);
        assert_eq!(params.epsilon, 1e-3);
        assert!(!params.shrinking);
        assert_eq!(params.gamma, 1.0);
        assert_eq!(params.cache_size, 256);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_svr_params_validation() {
        assert!(SvrParams::default().with_c(0.0).validate().is_err());
        assert!(SvrParams::default().with_epsilon(-1.0).validate().is_err());
        assert!(SvrParams::default().with_tolerance(0.0).validate().is_err());
        assert!(SvrParams::default().with_max_iterations(0).validate().is_err());
    }
}

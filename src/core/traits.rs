//! Core traits for kernel SVR evaluation

/// A fitted regression model evaluated against a precomputed kernel
pub trait RegressionModel: Send + Sync {
    /// Decision values for the columns of a cross kernel `K[train, test]`
    ///
    /// Fails if the cross kernel does not have one row per training point.
    fn decision_values(
        &self,
        cross: &dyn crate::kernel::PrecomputedKernel,
    ) -> crate::core::Result<Vec<f64>>;

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Number of training points the model was fitted on
    fn n_training(&self) -> usize;

    /// Fraction of training points retained as support vectors
    fn nu(&self) -> f64 {
        if self.n_training() == 0 {
            0.0
        } else {
            self.n_support_vectors() as f64 / self.n_training() as f64
        }
    }
}

/// Maps the nu statistic of a single fit to an AUC estimate
///
/// Owned by the caller and only ever read by the evaluator.
pub trait SurrogateRegressor: Send + Sync {
    /// Estimated cross-validated AUC for a fit retaining `nu` of its points
    fn estimate_auc(&self, nu: f64) -> f64;
}

//! High-level SVR fitting on precomputed kernels
//!
//! `SvrOptimizer` runs the SMO solver and, when requested, calibrates the
//! fitted model's decision values into probabilities. The resulting
//! `TrainedSvr` scores new points through a cross kernel `K[train, test]`.

pub mod platt;

pub use self::platt::PlattScaling;

use crate::core::{GkmError, OptimizationResult, RegressionModel, Result, SvrParams};
use crate::kernel::PrecomputedKernel;
use crate::solver::SMOSolver;

/// Fits epsilon-SVR models with fixed hyperparameters
#[derive(Debug, Clone, Default)]
pub struct SvrOptimizer {
    params: SvrParams,
}

impl SvrOptimizer {
    /// Create an optimizer with the given hyperparameters
    pub fn new(params: SvrParams) -> Self {
        Self { params }
    }

    /// Create an optimizer with the default hyperparameters
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Get the hyperparameters
    pub fn params(&self) -> &SvrParams {
        &self.params
    }

    /// Fit on a square training kernel and its regression targets
    pub fn fit<K>(&self, kernel: &K, targets: &[f64]) -> Result<TrainedSvr>
    where
        K: PrecomputedKernel + ?Sized,
    {
        let solver = SMOSolver::new(self.params.clone());
        let result = solver.solve(kernel, targets)?;
        let mut model = TrainedSvr::new(result, targets.len());

        if self.params.probability {
            let training_decisions = model.decision_values_for(kernel)?;
            model.calibration = Some(PlattScaling::fit(&training_decisions, targets)?);
        }

        Ok(model)
    }
}

/// A fitted SVR model
#[derive(Debug, Clone)]
pub struct TrainedSvr {
    /// Coefficients of the support vectors, aligned with `support_indices`
    coefficients: Vec<f64>,
    support_indices: Vec<usize>,
    rho: f64,
    n_training: usize,
    calibration: Option<PlattScaling>,
    iterations: usize,
}

impl TrainedSvr {
    pub(crate) fn new(result: OptimizationResult, n_training: usize) -> Self {
        let coefficients = result
            .support_vectors
            .iter()
            .map(|&s| result.coefficients[s])
            .collect();

        Self {
            coefficients,
            support_indices: result.support_vectors,
            rho: result.rho,
            n_training,
            calibration: None,
            iterations: result.iterations,
        }
    }

    fn decision_values_for<K>(&self, cross: &K) -> Result<Vec<f64>>
    where
        K: PrecomputedKernel + ?Sized,
    {
        if cross.n_rows() != self.n_training {
            return Err(GkmError::config(format!(
                "cross kernel has {} rows but the model was fit on {} points",
                cross.n_rows(),
                self.n_training
            )));
        }

        Ok((0..cross.n_cols())
            .map(|col| {
                self.support_indices
                    .iter()
                    .zip(&self.coefficients)
                    .map(|(&s, beta)| beta * cross.value(s, col))
                    .sum::<f64>()
                    - self.rho
            })
            .collect())
    }

    /// Calibrated probability of the positive class for each column of `cross`
    pub fn predict_proba<K>(&self, cross: &K) -> Result<Vec<f64>>
    where
        K: PrecomputedKernel + ?Sized,
    {
        let platt = self.calibration.ok_or_else(|| {
            GkmError::config("model was fit without probability calibration")
        })?;
        Ok(self
            .decision_values_for(cross)?
            .into_iter()
            .map(|f| platt.probability(f))
            .collect())
    }

    /// Get the coefficients of the support vectors
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Get the indices of support vectors in the training set
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_indices
    }

    /// Offset subtracted from the kernel expansion
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Fitted sigmoid, if calibration was requested
    pub fn calibration(&self) -> Option<&PlattScaling> {
        self.calibration.as_ref()
    }

    /// Solver iterations used by the fit
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl RegressionModel for TrainedSvr {
    fn decision_values(&self, cross: &dyn PrecomputedKernel) -> Result<Vec<f64>> {
        self.decision_values_for(cross)
    }

    fn n_support_vectors(&self) -> usize {
        self.support_indices.len()
    }

    fn n_training(&self) -> usize {
        self.n_training
    }
}

//! Cross-validated AUC of a precomputed kernel
//!
//! Two modes are offered. `KFold` fits one SVR per fold, turns the held-out
//! probabilities into ROC curves, averages them on a fixed FPR grid and
//! integrates the mean curve. `Surrogate` fits once on everything and maps
//! the fraction of support vectors to an AUC through a caller-supplied model.

use crate::core::{GkmError, RegressionModel, Result, SurrogateRegressor, SvrParams};
use crate::evaluation::FoldPartition;
use crate::kernel::KernelMatrix;
use crate::metrics::{fpr_grid, mean_curve, trapezoid, RocCurve, GRID_POINTS};
use crate::optimizer::SvrOptimizer;
use log::{debug, info};
use rayon::prelude::*;

/// How the AUC is obtained
#[derive(Clone, Copy)]
pub enum EvaluationMode<'a> {
    /// Exact stratified k-fold cross-validation
    KFold { folds: usize },
    /// Single fit, AUC estimated from nu
    Surrogate(&'a dyn SurrogateRegressor),
}

impl std::fmt::Debug for EvaluationMode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationMode::KFold { folds } => {
                f.debug_struct("KFold").field("folds", folds).finish()
            }
            EvaluationMode::Surrogate(_) => f.write_str("Surrogate"),
        }
    }
}

/// Outcome of one held-out fold
#[derive(Debug, Clone)]
pub struct FoldResult {
    pub fold: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub n_support_vectors: usize,
    /// Area under this fold's own ROC curve
    pub auc: f64,
    /// TPR on the shared FPR grid, with the first point pinned to 0
    pub interpolated_tpr: Vec<f64>,
}

/// Full k-fold outcome
#[derive(Debug, Clone)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldResult>,
    pub mean_fpr: Vec<f64>,
    /// Pointwise mean of the fold curves, pinned to 1 at FPR = 1
    pub mean_tpr: Vec<f64>,
    /// Area under the mean curve
    pub auc: f64,
}

impl CrossValidationReport {
    /// Per-fold AUCs in fold order
    pub fn fold_aucs(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.auc).collect()
    }

    /// Population standard deviation of the per-fold AUCs
    pub fn auc_std(&self) -> f64 {
        let aucs = self.fold_aucs();
        if aucs.is_empty() {
            return 0.0;
        }
        let n = aucs.len() as f64;
        let mean = aucs.iter().sum::<f64>() / n;
        (aucs.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n).sqrt()
    }
}

/// Outcome of a surrogate estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurrogateEstimate {
    pub nu: f64,
    pub n_support_vectors: usize,
    pub n_training: usize,
    pub auc: f64,
}

/// Detailed result of either mode
#[derive(Debug, Clone)]
pub enum Evaluation {
    KFold(CrossValidationReport),
    Surrogate(SurrogateEstimate),
}

impl Evaluation {
    /// The reported AUC
    pub fn auc(&self) -> f64 {
        match self {
            Evaluation::KFold(report) => report.auc,
            Evaluation::Surrogate(estimate) => estimate.auc,
        }
    }
}

/// Evaluates kernel matrices with fixed SVR hyperparameters
#[derive(Debug, Clone)]
pub struct CrossValidator {
    params: SvrParams,
    parallel: bool,
}

impl Default for CrossValidator {
    fn default() -> Self {
        Self::new(SvrParams::default())
    }
}

impl CrossValidator {
    /// Create an evaluator; folds run in parallel by default
    pub fn new(params: SvrParams) -> Self {
        Self {
            params,
            parallel: true,
        }
    }

    /// Run folds on the rayon pool or one after another
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Get the SVR hyperparameters
    pub fn params(&self) -> &SvrParams {
        &self.params
    }

    /// AUC of `matrix` under `mode`
    pub fn evaluate(&self, matrix: &KernelMatrix, mode: EvaluationMode<'_>) -> Result<f64> {
        Ok(self.evaluate_detailed(matrix, mode)?.auc())
    }

    /// AUC of `matrix` under `mode`, with the intermediate results
    pub fn evaluate_detailed(
        &self,
        matrix: &KernelMatrix,
        mode: EvaluationMode<'_>,
    ) -> Result<Evaluation> {
        let labels = matrix.labels();
        labels.require_both_classes()?;

        match mode {
            EvaluationMode::KFold { folds } => {
                let partition = FoldPartition::stratified(labels, folds)?;
                self.k_fold(matrix, &partition).map(Evaluation::KFold)
            }
            EvaluationMode::Surrogate(surrogate) => self
                .surrogate_estimate(matrix, surrogate)
                .map(Evaluation::Surrogate),
        }
    }

    /// Cross-validate over an explicit partition
    pub fn k_fold(
        &self,
        matrix: &KernelMatrix,
        partition: &FoldPartition,
    ) -> Result<CrossValidationReport> {
        if partition.n_seqs() != matrix.n_seqs() {
            return Err(GkmError::config(format!(
                "partition covers {} sequences but the matrix has {}",
                partition.n_seqs(),
                matrix.n_seqs()
            )));
        }

        let grid = fpr_grid(GRID_POINTS);
        let folds: Vec<usize> = (0..partition.n_folds()).collect();

        let results: Vec<FoldResult> = if self.parallel {
            folds
                .par_iter()
                .map(|&f| self.run_fold(matrix, partition, f, &grid))
                .collect::<Result<Vec<_>>>()?
        } else {
            folds
                .iter()
                .map(|&f| self.run_fold(matrix, partition, f, &grid))
                .collect::<Result<Vec<_>>>()?
        };

        let curves: Vec<Vec<f64>> = results
            .iter()
            .map(|r| r.interpolated_tpr.clone())
            .collect();
        let mut mean_tpr = mean_curve(&curves);
        if let Some(last) = mean_tpr.last_mut() {
            *last = 1.0;
        }
        let auc = trapezoid(&grid, &mean_tpr);

        let report = CrossValidationReport {
            folds: results,
            mean_fpr: grid,
            mean_tpr,
            auc,
        };
        info!(
            "{}-fold cross-validated AUC: {:.6} (fold std {:.6})",
            partition.n_folds(),
            report.auc,
            report.auc_std()
        );
        Ok(report)
    }

    fn run_fold(
        &self,
        matrix: &KernelMatrix,
        partition: &FoldPartition,
        fold: usize,
        grid: &[f64],
    ) -> Result<FoldResult> {
        let labels = matrix.labels();
        let test = partition.test_indices(fold);
        let train = partition.train_indices(fold);

        let train_kernel = matrix.submatrix(&train, &train);
        let cross_kernel = matrix.submatrix(&train, test);

        let optimizer = SvrOptimizer::new(self.params.clone());
        let model = optimizer.fit(&train_kernel, &labels.select(&train))?;
        let probabilities = model.predict_proba(&cross_kernel)?;

        let roc = RocCurve::from_scores(&probabilities, &labels.select(test))?;
        let mut interpolated_tpr = roc.interpolate(grid);
        if let Some(first) = interpolated_tpr.first_mut() {
            *first = 0.0;
        }
        let auc = roc.auc();

        debug!(
            "Fold {fold}: {} train, {} test, {} support vectors, AUC {auc:.6}",
            train.len(),
            test.len(),
            model.n_support_vectors()
        );

        Ok(FoldResult {
            fold,
            n_train: train.len(),
            n_test: test.len(),
            n_support_vectors: model.n_support_vectors(),
            auc,
            interpolated_tpr,
        })
    }

    /// Fit once on the full matrix and map its nu through `surrogate`
    pub fn surrogate_estimate(
        &self,
        matrix: &KernelMatrix,
        surrogate: &dyn SurrogateRegressor,
    ) -> Result<SurrogateEstimate> {
        let labels = matrix.labels();
        labels.require_both_classes()?;

        // Probabilities are never read in this mode
        let params = self.params.clone().with_probability(false);
        let model = SvrOptimizer::new(params).fit(matrix, &labels.to_vec())?;

        let nu = model.nu();
        let auc = surrogate.estimate_auc(nu);
        if !auc.is_finite() {
            return Err(GkmError::config(format!(
                "surrogate returned a non-finite AUC for nu = {nu}"
            )));
        }

        info!(
            "Surrogate AUC estimate: {auc:.6} (nu = {nu:.4}, {} of {} support vectors)",
            model.n_support_vectors(),
            model.n_training()
        );
        Ok(SurrogateEstimate {
            nu,
            n_support_vectors: model.n_support_vectors(),
            n_training: model.n_training(),
            auc,
        })
    }
}

//! High-level API for kernel evaluation
//!
//! `GkmCv` ties the kernel adapter and the cross-validator together so that a
//! configuration goes in and an AUC comes out.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gkmcv::api::GkmCv;
//! use gkmcv::evaluation::EvaluationMode;
//! use gkmcv::kernel::KernelConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gkm = GkmCv::load_native("./GkmKernel.so")?;
//! let config = KernelConfig::new("pos.fa", "neg.fa").with_gkm(10, 6, 3);
//!
//! let auc = gkm.run(&config, EvaluationMode::KFold { folds: 5 })?;
//! println!("Cross-validated AUC: {auc:.4}");
//! # Ok(())
//! # }
//! ```

use crate::core::{Result, SvrParams};
use crate::data::read_matrix;
use crate::evaluation::{CrossValidator, Evaluation, EvaluationMode};
use crate::kernel::{KernelConfig, KernelEngine, KernelMatrix, KernelMatrixAdapter, NativeEngine};
use std::path::Path;

/// Kernel computation plus evaluation with builder-style settings
pub struct GkmCv<E: KernelEngine> {
    adapter: KernelMatrixAdapter<E>,
    params: SvrParams,
    parallel_folds: bool,
}

impl GkmCv<NativeEngine> {
    /// Use the native engine from the shared library at `path`
    pub fn load_native<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_engine(NativeEngine::load(path)?))
    }
}

impl<E: KernelEngine> GkmCv<E> {
    /// Use any kernel engine
    pub fn with_engine(engine: E) -> Self {
        Self {
            adapter: KernelMatrixAdapter::new(engine),
            params: SvrParams::default(),
            parallel_folds: true,
        }
    }

    /// Replace the SVR hyperparameters
    pub fn with_svr_params(mut self, params: SvrParams) -> Self {
        self.params = params;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = c;
        self
    }

    /// Set maximum number of solver iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.params.max_iterations = max_iterations;
        self
    }

    /// Run k-fold folds in parallel (the default) or sequentially
    pub fn with_parallel_folds(mut self, parallel: bool) -> Self {
        self.parallel_folds = parallel;
        self
    }

    /// Get the SVR hyperparameters
    pub fn svr_params(&self) -> &SvrParams {
        &self.params
    }

    /// Get the kernel engine
    pub fn engine(&self) -> &E {
        self.adapter.engine()
    }

    /// Compute the trimmed kernel matrix for `config`
    pub fn compute_matrix(&self, config: &KernelConfig) -> Result<KernelMatrix> {
        self.adapter.compute(config)
    }

    /// Compute the kernel and return its AUC under `mode`
    pub fn run(&self, config: &KernelConfig, mode: EvaluationMode<'_>) -> Result<f64> {
        Ok(self.run_detailed(config, mode)?.auc())
    }

    /// Compute the kernel and evaluate it, keeping intermediate results
    pub fn run_detailed(
        &self,
        config: &KernelConfig,
        mode: EvaluationMode<'_>,
    ) -> Result<Evaluation> {
        let matrix = self.compute_matrix(config)?;
        self.validator().evaluate_detailed(&matrix, mode)
    }

    /// Evaluate an already computed matrix with these settings
    pub fn evaluate_matrix(
        &self,
        matrix: &KernelMatrix,
        mode: EvaluationMode<'_>,
    ) -> Result<f64> {
        self.validator().evaluate(matrix, mode)
    }

    fn validator(&self) -> CrossValidator {
        CrossValidator::new(self.params.clone()).with_parallel(self.parallel_folds)
    }
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;
    use crate::persistence::SurrogateFile;

    /// k-fold AUC of a kernel matrix stored as text
    pub fn cross_validate_file<P: AsRef<Path>>(path: P, folds: usize) -> Result<f64> {
        let matrix = read_matrix(path)?;
        CrossValidator::default().evaluate(&matrix, EvaluationMode::KFold { folds })
    }

    /// Surrogate AUC estimate of a kernel matrix stored as text
    pub fn estimate_file<P1: AsRef<Path>, P2: AsRef<Path>>(
        matrix_path: P1,
        surrogate_path: P2,
    ) -> Result<f64> {
        let matrix = read_matrix(matrix_path)?;
        let surrogate = SurrogateFile::load_from_file(surrogate_path)?;
        let mode = EvaluationMode::Surrogate(surrogate.regressor());
        CrossValidator::default().evaluate(&matrix, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GkmError;
    use crate::data::write_matrix;
    use crate::evaluation::SurrogateModel;
    use crate::kernel::EngineOutput;
    use crate::persistence::SurrogateFile;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Engine producing a block-diagonal kernel for `n_pos` + `n_neg` sequences
    struct BlockEngine {
        n_pos: usize,
        n_neg: usize,
    }

    impl KernelEngine for BlockEngine {
        fn compute(&self, config: &KernelConfig) -> Result<EngineOutput> {
            let side = config.max_num_seq;
            let n = self.n_pos + self.n_neg;
            let mut data = vec![0.0; side * side];
            for i in 0..n.min(side) {
                for j in 0..n.min(side) {
                    if (i < self.n_pos) == (j < self.n_pos) {
                        data[i * side + j] = 1.0;
                    }
                }
            }
            Ok(EngineOutput {
                side,
                data,
                n_pos: self.n_pos,
                n_neg: self.n_neg,
            })
        }
    }

    fn sequence_files() -> (KernelConfig, NamedTempFile, NamedTempFile) {
        let mut pos = NamedTempFile::new().expect("Failed to create temp file");
        let mut neg = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(pos, ">p1\nACGTACGTACGTAC").expect("Failed to write");
        writeln!(neg, ">n1\nGGGGCCCCAAAATT").expect("Failed to write");
        let config = KernelConfig::new(pos.path(), neg.path()).with_capacity(100, 20);
        (config, pos, neg)
    }

    #[test]
    fn test_builder_pattern() {
        let gkm = GkmCv::with_engine(BlockEngine { n_pos: 4, n_neg: 4 })
            .with_c(2.0)
            .with_max_iterations(5000)
            .with_parallel_folds(false);

        assert_eq!(gkm.svr_params().c, 2.0);
        assert_eq!(gkm.svr_params().max_iterations, 5000);
        assert!(!gkm.parallel_folds);
        assert_eq!(gkm.engine().n_pos, 4);
    }

    #[test]
    fn test_run_k_fold() {
        let (config, _pos, _neg) = sequence_files();
        let gkm = GkmCv::with_engine(BlockEngine { n_pos: 4, n_neg: 4 });

        let auc = gkm
            .run(&config, EvaluationMode::KFold { folds: 2 })
            .expect("Should evaluate");
        assert!(auc > 0.99);
    }

    #[test]
    fn test_run_surrogate() {
        let (config, _pos, _neg) = sequence_files();
        let gkm = GkmCv::with_engine(BlockEngine { n_pos: 4, n_neg: 4 });
        let surrogate = SurrogateModel::Linear {
            slope: 0.0,
            intercept: 0.42,
        };

        let auc = gkm
            .run(&config, EvaluationMode::Surrogate(&surrogate))
            .expect("Should estimate");
        assert_eq!(auc, 0.42);
    }

    #[test]
    fn test_run_propagates_capacity_error() {
        let (config, _pos, _neg) = sequence_files();
        let gkm = GkmCv::with_engine(BlockEngine { n_pos: 15, n_neg: 15 });

        assert!(matches!(
            gkm.run(&config, EvaluationMode::KFold { folds: 2 }),
            Err(GkmError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_native_library() {
        assert!(matches!(
            GkmCv::load_native("/nonexistent/GkmKernel.so"),
            Err(GkmError::EngineLoad(_))
        ));
    }

    #[test]
    fn test_quick_file_helpers() {
        let (config, _pos, _neg) = sequence_files();
        let matrix = GkmCv::with_engine(BlockEngine { n_pos: 3, n_neg: 3 })
            .compute_matrix(&config)
            .expect("Should compute");

        let matrix_file = NamedTempFile::new().expect("Failed to create temp file");
        write_matrix(&matrix, matrix_file.path()).expect("Should write");

        let auc = quick::cross_validate_file(matrix_file.path(), 3).expect("Should evaluate");
        assert!((0.0..=1.0).contains(&auc));

        let surrogate_file = NamedTempFile::new().expect("Failed to create temp file");
        SurrogateFile::new(
            SurrogateModel::Linear {
                slope: 0.0,
                intercept: 0.7,
            },
            "",
        )
        .save_to_file(surrogate_file.path())
        .expect("Should save");

        let estimate = quick::estimate_file(matrix_file.path(), surrogate_file.path())
            .expect("Should estimate");
        assert_eq!(estimate, 0.7);
    }
}

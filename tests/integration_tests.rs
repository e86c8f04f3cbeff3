//! Integration tests for the gkmcv library
//!
//! These tests drive the public API end to end: engine output through the
//! adapter, evaluation in both modes, and the file formats.

use approx::assert_abs_diff_eq;
use gkmcv::api::{quick, GkmCv};
use gkmcv::data::{read_matrix, write_matrix};
use gkmcv::evaluation::{StepTree, SurrogatePoint};
use gkmcv::kernel::{trim, EngineOutput};
use gkmcv::metrics::GRID_POINTS;
use gkmcv::{
    CrossValidator, Evaluation, EvaluationMode, FoldPartition, GkmError, KernelConfig,
    KernelEngine, KernelMatrix, LabelVector, Result, SurrogateFile, SurrogateModel,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Kernel with two noisy clusters; `overlap` controls cross-cluster similarity
fn clustered_kernel(n_pos: usize, n_neg: usize, overlap: f64) -> KernelMatrix {
    let n = n_pos + n_neg;
    let rows = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        1.0
                    } else if (i < n_pos) == (j < n_pos) {
                        // Deterministic within-cluster variation
                        0.6 + 0.05 * (((i * 7 + j * 7) % 5) as f64)
                    } else {
                        overlap
                    }
                })
                .collect()
        })
        .collect();
    KernelMatrix::from_rows(rows, n_pos, n_neg).expect("valid kernel")
}

fn block_kernel(first_block: usize, n_pos: usize, n_neg: usize) -> KernelMatrix {
    let n = n_pos + n_neg;
    let rows = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if (i < first_block) == (j < first_block) {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();
    KernelMatrix::from_rows(rows, n_pos, n_neg).expect("valid kernel")
}

/// Engine that serves a fixed matrix inside a padded buffer
struct FixedEngine {
    matrix: KernelMatrix,
}

impl KernelEngine for FixedEngine {
    fn compute(&self, config: &KernelConfig) -> Result<EngineOutput> {
        let side = config.max_num_seq;
        let n = self.matrix.n_seqs();
        let mut data = vec![-1.0; side * side];
        for i in 0..n.min(side) {
            for j in 0..n.min(side) {
                data[i * side + j] = self.matrix.get(i, j);
            }
        }
        Ok(EngineOutput {
            side,
            data,
            n_pos: self.matrix.n_pos(),
            n_neg: self.matrix.n_neg(),
        })
    }
}

fn sequence_config(capacity: usize) -> (KernelConfig, NamedTempFile, NamedTempFile) {
    let mut pos = NamedTempFile::new().expect("Failed to create temp file");
    let mut neg = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(pos, ">p1\nACGTTGCAACGTTGCA").expect("Failed to write");
    writeln!(neg, ">n1\nTTTTAAAACCCCGGGG").expect("Failed to write");
    let config = KernelConfig::new(pos.path(), neg.path()).with_capacity(500, capacity);
    (config, pos, neg)
}

/// Test complete workflow: engine -> trimmed matrix -> k-fold AUC
#[test]
fn test_complete_workflow_k_fold() {
    let (config, _pos, _neg) = sequence_config(32);
    let gkm = GkmCv::with_engine(FixedEngine {
        matrix: clustered_kernel(8, 8, 0.1),
    });

    let matrix = gkm.compute_matrix(&config).expect("Should compute");
    assert_eq!(matrix.n_seqs(), 16);

    let auc = gkm
        .run(&config, EvaluationMode::KFold { folds: 4 })
        .expect("Should evaluate");
    assert!(auc > 0.95, "well separated clusters should score high, got {auc}");
    assert!(auc <= 1.0);
}

#[test]
fn test_toy_block_kernel_scores_perfectly() {
    let auc = CrossValidator::default()
        .evaluate(&block_kernel(4, 4, 4), EvaluationMode::KFold { folds: 2 })
        .expect("Should evaluate");

    // Perfect ranking; the pinned FPR=0 point costs half a grid cell
    assert_abs_diff_eq!(auc, 1.0 - 0.5 / (GRID_POINTS - 1) as f64, epsilon = 1e-12);
}

#[test]
fn test_k_fold_is_deterministic() {
    let matrix = clustered_kernel(7, 9, 0.4);
    let validator = CrossValidator::default();
    let mode = EvaluationMode::KFold { folds: 3 };

    let first = validator.evaluate(&matrix, mode).unwrap();
    let second = validator.evaluate(&matrix, mode).unwrap();
    let sequential = validator
        .clone()
        .with_parallel(false)
        .evaluate(&matrix, mode)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first, sequential);
}

#[test]
fn test_block_order_is_load_bearing() {
    let validator = CrossValidator::default();
    let mode = EvaluationMode::KFold { folds: 2 };

    let aligned = validator.evaluate(&block_kernel(4, 4, 6), mode).unwrap();
    let swapped = validator.evaluate(&block_kernel(6, 4, 6), mode).unwrap();
    assert!(swapped < aligned, "swapped {swapped} should score below aligned {aligned}");
}

#[test]
fn test_averaged_curve_boundaries() {
    let matrix = clustered_kernel(6, 6, 0.55);
    let report = match CrossValidator::default()
        .evaluate_detailed(&matrix, EvaluationMode::KFold { folds: 3 })
        .unwrap()
    {
        Evaluation::KFold(report) => report,
        Evaluation::Surrogate(_) => panic!("expected a k-fold report"),
    };

    assert_eq!(report.mean_tpr.first(), Some(&0.0));
    assert_eq!(report.mean_tpr.last(), Some(&1.0));
    assert!(report.mean_tpr.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(report.fold_aucs().len(), 3);
    assert!(report.fold_aucs().iter().all(|a| (0.0..=1.0).contains(a)));
}

#[test]
fn test_custom_partition() {
    let matrix = block_kernel(3, 3, 3);
    let partition =
        FoldPartition::from_folds(vec![vec![0, 3], vec![1, 4], vec![2, 5]], 6).unwrap();
    let report = CrossValidator::default().k_fold(&matrix, &partition).unwrap();
    assert_eq!(report.folds.len(), 3);
    assert!(report.folds.iter().all(|f| f.n_test == 2 && f.n_train == 4));
}

#[test]
fn test_stratified_partition_is_exposed() {
    let partition = FoldPartition::stratified(LabelVector::new(3, 3), 3).unwrap();
    assert_eq!(partition.test_indices(2), &[2, 5]);
}

#[test]
fn test_degenerate_classes_fail_in_both_modes() {
    let surrogate = SurrogateModel::Linear {
        slope: 1.0,
        intercept: 0.0,
    };
    let validator = CrossValidator::default();

    for matrix in [block_kernel(3, 3, 0), block_kernel(3, 0, 3)] {
        assert!(matches!(
            validator.evaluate(&matrix, EvaluationMode::KFold { folds: 2 }),
            Err(GkmError::Configuration(_))
        ));
        assert!(matches!(
            validator.evaluate(&matrix, EvaluationMode::Surrogate(&surrogate)),
            Err(GkmError::Configuration(_))
        ));
    }
}

#[test]
fn test_empty_matrix_is_rejected() {
    let matrix = KernelMatrix::new(vec![], 0, 0).unwrap();
    assert!(CrossValidator::default()
        .evaluate(&matrix, EvaluationMode::KFold { folds: 2 })
        .is_err());
}

#[test]
fn test_capacity_violation_returns_no_matrix() {
    let (config, _pos, _neg) = sequence_config(10);
    let gkm = GkmCv::with_engine(FixedEngine {
        matrix: clustered_kernel(6, 6, 0.2),
    });

    assert!(matches!(
        gkm.compute_matrix(&config),
        Err(GkmError::Configuration(_))
    ));
}

#[test]
fn test_trim_ignores_padding() {
    let mut data = vec![f64::NAN; 9];
    data[0] = 1.0;
    data[1] = 0.5;
    data[3] = 0.5;
    data[4] = 1.0;
    let output = EngineOutput {
        side: 3,
        data,
        n_pos: 1,
        n_neg: 1,
    };

    let matrix = trim(output, 3).expect("padding must not be read");
    assert_eq!(matrix.n_seqs(), 2);
    assert_eq!(matrix.get(1, 0), 0.5);
}

#[test]
fn test_surrogate_workflow() {
    let matrix = clustered_kernel(5, 5, 0.2);
    let surrogate = SurrogateModel::Piecewise {
        points: vec![
            SurrogatePoint { nu: 0.0, auc: 1.0 },
            SurrogatePoint { nu: 1.0, auc: 0.5 },
        ],
    };

    let validator = CrossValidator::default();
    let estimate = validator.surrogate_estimate(&matrix, &surrogate).unwrap();
    assert_abs_diff_eq!(estimate.auc, 1.0 - 0.5 * estimate.nu, epsilon = 1e-12);

    let again = validator
        .evaluate(&matrix, EvaluationMode::Surrogate(&surrogate))
        .unwrap();
    assert_eq!(estimate.auc, again);
}

#[test]
fn test_file_round_trip_and_quick_helpers() {
    let matrix = clustered_kernel(4, 4, 0.1);
    let matrix_file = NamedTempFile::new().expect("Failed to create temp file");
    write_matrix(&matrix, matrix_file.path()).unwrap();
    assert_eq!(read_matrix(matrix_file.path()).unwrap().as_gram(), matrix.as_gram());

    let direct = CrossValidator::default()
        .evaluate(&matrix, EvaluationMode::KFold { folds: 2 })
        .unwrap();
    let from_file = quick::cross_validate_file(matrix_file.path(), 2).unwrap();
    assert_eq!(direct, from_file);

    let surrogate_file = NamedTempFile::new().expect("Failed to create temp file");
    let model = SurrogateModel::StepEnsemble {
        init: 0.75,
        learning_rate: 0.5,
        trees: vec![StepTree {
            thresholds: vec![2.0],
            values: vec![0.2, 0.0],
        }],
    };
    SurrogateFile::new(model, "integration")
        .save_to_file(surrogate_file.path())
        .unwrap();

    // nu never exceeds 1, so the lower leaf always applies
    let estimate = quick::estimate_file(matrix_file.path(), surrogate_file.path()).unwrap();
    assert_abs_diff_eq!(estimate, 0.85, epsilon = 1e-12);
}

//! Cross-validated AUC estimation for gapped k-mer kernel SVMs
//!
//! A kernel engine turns a positive and a negative sequence set into one
//! similarity matrix. This crate trims that matrix to the sequences the engine
//! actually read and scores it either by exact k-fold cross-validation of a
//! precomputed-kernel epsilon-SVR or by a surrogate estimate from a single fit.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod evaluation;
pub mod kernel;
pub mod metrics;
pub mod optimizer;
pub mod persistence;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::GkmCv;
pub use crate::cache::{CacheStats, RowCache};
pub use crate::core::error::{GkmError, Result};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::evaluation::{
    CrossValidationReport, CrossValidator, Evaluation, EvaluationMode, FoldPartition, FoldResult,
    SurrogateModel,
};
pub use crate::kernel::{
    KernelConfig, KernelEngine, KernelMatrix, KernelMatrixAdapter, NativeEngine,
};
pub use crate::metrics::RocCurve;
pub use crate::optimizer::{SvrOptimizer, TrainedSvr};
pub use crate::persistence::SurrogateFile;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

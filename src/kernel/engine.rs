//! Kernel engine boundary and matrix adapter
//!
//! An engine fills an over-allocated square buffer sized to the configured
//! capacity and reports how many positive and negative sequences it actually
//! read. The adapter calls the engine once, checks the discovered counts
//! against the capacity, and copies out only the discovered region.

use crate::core::{GkmError, Result};
use crate::kernel::{KernelConfig, KernelMatrix};
use log::{debug, info};

/// Raw result of one engine invocation
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// Side length of the (possibly padded) square buffer
    pub side: usize,
    /// Row-major values, `side * side` long
    pub data: Vec<f64>,
    /// Positive sequences discovered
    pub n_pos: usize,
    /// Negative sequences discovered
    pub n_neg: usize,
}

/// Something that turns a kernel configuration into a similarity matrix
pub trait KernelEngine: Send + Sync {
    /// Run one synchronous kernel computation
    fn compute(&self, config: &KernelConfig) -> Result<EngineOutput>;
}

impl<E: KernelEngine + ?Sized> KernelEngine for &E {
    fn compute(&self, config: &KernelConfig) -> Result<EngineOutput> {
        (**self).compute(config)
    }
}

/// Produces trimmed kernel matrices from a kernel engine
pub struct KernelMatrixAdapter<E: KernelEngine> {
    engine: E,
}

impl<E: KernelEngine> KernelMatrixAdapter<E> {
    /// Wrap an engine
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Get the engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Compute the kernel matrix for `config`, trimmed to the discovered sequences
    pub fn compute(&self, config: &KernelConfig) -> Result<KernelMatrix> {
        config.validate()?;

        info!(
            "Computing gkm kernel (L={}, K={}, d={}) for {:?} vs {:?}",
            config.word_length,
            config.informative_columns,
            config.max_mismatch,
            config.pos_file,
            config.neg_file
        );

        let output = self.engine.compute(config)?;
        trim(output, config.max_num_seq)
    }
}

/// Keep only the leading `n_pos + n_neg` rows and columns of an engine buffer
pub fn trim(output: EngineOutput, capacity: usize) -> Result<KernelMatrix> {
    let EngineOutput {
        side,
        data,
        n_pos,
        n_neg,
    } = output;
    let n_seqs = n_pos + n_neg;

    if n_seqs > capacity {
        return Err(GkmError::config(format!(
            "engine discovered {n_seqs} sequences ({n_pos} positive, {n_neg} negative) \
             but capacity is {capacity}; raise max_num_seq"
        )));
    }
    if data.len() != side * side {
        return Err(GkmError::EngineFailure(format!(
            "engine buffer holds {} values, expected {side}x{side}",
            data.len()
        )));
    }
    if n_seqs > side {
        return Err(GkmError::EngineFailure(format!(
            "engine buffer side {side} is smaller than the {n_seqs} discovered sequences"
        )));
    }

    debug!("Trimming {side}x{side} engine buffer to {n_seqs}x{n_seqs}");

    let mut trimmed = Vec::with_capacity(n_seqs * n_seqs);
    if n_seqs > 0 {
        for row in data.chunks_exact(side).take(n_seqs) {
            trimmed.extend_from_slice(&row[..n_seqs]);
        }
    }

    KernelMatrix::new(trimmed, n_pos, n_neg)
}

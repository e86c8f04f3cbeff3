//! Gapped k-mer kernel configuration
//!
//! Named replacement for the positional option list handed to the kernel
//! engine. Defaults follow the usual gkm-SVM settings (L=10, K=6, d=3).

use crate::core::{GkmError, Result};
use std::path::{Path, PathBuf};

/// Hyperparameters and capacity bounds for one kernel computation
#[derive(Debug, Clone, PartialEq)]
pub struct KernelConfig {
    /// Length of the gapped k-mer window (L)
    pub word_length: usize,
    /// Number of informative (non-gap) positions in the window (K)
    pub informative_columns: usize,
    /// Maximum number of mismatches counted between windows (d)
    pub max_mismatch: usize,
    /// Longest sequence the engine will read
    pub max_seq_len: usize,
    /// Capacity of the kernel matrix, in sequences (positives plus negatives)
    pub max_num_seq: usize,
    /// Kernel variant code, forwarded verbatim to the engine
    pub kernel_variant: i32,
    /// Count reverse complements as matches
    pub add_reverse_complement: bool,
    /// Add a pseudocount to k-mer counts
    pub use_pseudocount: bool,
    /// Ask the engine for binary rather than text output of its own files
    pub output_binary: bool,
    /// Positive sequence set
    pub pos_file: PathBuf,
    /// Negative sequence set
    pub neg_file: PathBuf,
    /// Mismatch penalty for the wildcard kernel
    pub wildcard_lambda: f64,
    /// Maximum wildcard mismatches
    pub wildcard_mismatch: usize,
    /// Optional alphabet definition file
    pub alphabet_file: Option<PathBuf>,
    /// Worker threads inside the engine
    pub max_threads: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            word_length: 10,
            informative_columns: 6,
            max_mismatch: 3,
            max_seq_len: 10_000,
            max_num_seq: 15_000,
            kernel_variant: 0,
            add_reverse_complement: true,
            use_pseudocount: false,
            output_binary: false,
            pos_file: PathBuf::new(),
            neg_file: PathBuf::new(),
            wildcard_lambda: 1.0,
            wildcard_mismatch: 2,
            alphabet_file: None,
            max_threads: 1,
        }
    }
}

impl KernelConfig {
    /// Configuration for a positive/negative file pair with default hyperparameters
    pub fn new<P: AsRef<Path>, N: AsRef<Path>>(pos_file: P, neg_file: N) -> Self {
        Self {
            pos_file: pos_file.as_ref().to_path_buf(),
            neg_file: neg_file.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Set L, K and d together
    pub fn with_gkm(
        mut self,
        word_length: usize,
        informative_columns: usize,
        max_mismatch: usize,
    ) -> Self {
        self.word_length = word_length;
        self.informative_columns = informative_columns;
        self.max_mismatch = max_mismatch;
        self
    }

    /// Set the capacity bounds
    pub fn with_capacity(mut self, max_seq_len: usize, max_num_seq: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self.max_num_seq = max_num_seq;
        self
    }

    /// Set the engine thread count
    pub fn with_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the alphabet file
    pub fn with_alphabet<P: AsRef<Path>>(mut self, alphabet_file: P) -> Self {
        self.alphabet_file = Some(alphabet_file.as_ref().to_path_buf());
        self
    }

    /// Check hyperparameter ranges and that all input files exist
    pub fn validate(&self) -> Result<()> {
        if self.informative_columns == 0 {
            return Err(GkmError::config("K must be at least 1"));
        }
        if self.informative_columns > self.word_length {
            return Err(GkmError::config(format!(
                "K ({}) cannot exceed L ({})",
                self.informative_columns, self.word_length
            )));
        }
        if self.max_mismatch > self.word_length - self.informative_columns {
            return Err(GkmError::config(format!(
                "max mismatch ({}) cannot exceed L - K ({})",
                self.max_mismatch,
                self.word_length - self.informative_columns
            )));
        }
        if self.max_seq_len < self.word_length {
            return Err(GkmError::config(format!(
                "max sequence length ({}) is shorter than L ({})",
                self.max_seq_len, self.word_length
            )));
        }
        if self.max_num_seq == 0 {
            return Err(GkmError::config("max sequence count must be at least 1"));
        }
        if self.max_threads == 0 {
            return Err(GkmError::config("thread count must be at least 1"));
        }
        if !self.wildcard_lambda.is_finite() {
            return Err(GkmError::config("wildcard lambda must be finite"));
        }

        require_file("positive sequence", &self.pos_file)?;
        require_file("negative sequence", &self.neg_file)?;
        if let Some(alphabet) = &self.alphabet_file {
            require_file("alphabet", alphabet)?;
        }

        Ok(())
    }
}

fn require_file(what: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(GkmError::config(format!("{what} file is not set")));
    }
    if !path.is_file() {
        return Err(GkmError::config(format!(
            "{what} file not found: {}",
            path.display()
        )));
    }
    Ok(())
}

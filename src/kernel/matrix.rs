//! Dense kernel matrices
//!
//! `GramMatrix` is a plain row-major block used for training and cross
//! kernels. `KernelMatrix` is the full square similarity matrix over the
//! positive block followed by the negative block; it is the only place labels
//! are derived from.

use crate::core::{GkmError, LabelVector, Result};
use crate::kernel::PrecomputedKernel;

/// Relative tolerance for the symmetry check
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Row-major dense matrix of kernel values
#[derive(Debug, Clone, PartialEq)]
pub struct GramMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl GramMatrix {
    /// Create a matrix from row-major data
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(GkmError::config(format!(
                "expected {} values for a {rows}x{cols} matrix, got {}",
                rows * cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a matrix from a list of equally sized rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(GkmError::config(format!(
                    "row {i} has {} columns, expected {n_cols}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Self::new(n_rows, n_cols, data)
    }

    /// Get a single value
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// Borrow row `i`
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Raw row-major values
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl PrecomputedKernel for GramMatrix {
    fn n_rows(&self) -> usize {
        self.rows
    }

    fn n_cols(&self) -> usize {
        self.cols
    }

    fn value(&self, i: usize, j: usize) -> f64 {
        self.get(i, j)
    }
}

/// Square similarity matrix over `n_pos` positives followed by `n_neg` negatives
#[derive(Debug, Clone, PartialEq)]
pub struct KernelMatrix {
    gram: GramMatrix,
    n_pos: usize,
    n_neg: usize,
}

impl KernelMatrix {
    /// Create a kernel matrix from row-major data of side `n_pos + n_neg`
    ///
    /// Values must be finite and non-negative, and the matrix symmetric.
    pub fn new(data: Vec<f64>, n_pos: usize, n_neg: usize) -> Result<Self> {
        let n = n_pos + n_neg;
        let gram = GramMatrix::new(n, n, data)?;
        Self::check_entries(&gram)?;
        Ok(Self { gram, n_pos, n_neg })
    }

    /// Create a kernel matrix from explicit rows
    pub fn from_rows(rows: Vec<Vec<f64>>, n_pos: usize, n_neg: usize) -> Result<Self> {
        let gram = GramMatrix::from_rows(rows)?;
        if gram.rows() != n_pos + n_neg || !gram.is_square() {
            return Err(GkmError::config(format!(
                "kernel matrix is {}x{}, expected side {}",
                gram.rows(),
                gram.cols(),
                n_pos + n_neg
            )));
        }
        Self::check_entries(&gram)?;
        Ok(Self { gram, n_pos, n_neg })
    }

    fn check_entries(gram: &GramMatrix) -> Result<()> {
        let n = gram.rows();
        for i in 0..n {
            for j in i..n {
                let a = gram.get(i, j);
                let b = gram.get(j, i);
                if !a.is_finite() {
                    return Err(GkmError::config(format!(
                        "kernel value at ({i}, {j}) is not finite"
                    )));
                }
                if a < 0.0 || b < 0.0 {
                    return Err(GkmError::config(format!(
                        "kernel value at ({i}, {j}) is negative: {}",
                        a.min(b)
                    )));
                }
                let scale = a.abs().max(b.abs()).max(1.0);
                if (a - b).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(GkmError::config(format!(
                        "kernel matrix is not symmetric at ({i}, {j}): {a} vs {b}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of positive sequences
    pub fn n_pos(&self) -> usize {
        self.n_pos
    }

    /// Number of negative sequences
    pub fn n_neg(&self) -> usize {
        self.n_neg
    }

    /// Total number of sequences
    pub fn n_seqs(&self) -> usize {
        self.n_pos + self.n_neg
    }

    /// Labels implied by the block layout
    pub fn labels(&self) -> LabelVector {
        LabelVector::new(self.n_pos, self.n_neg)
    }

    /// Get a single value
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.gram.get(i, j)
    }

    /// Copy out `K[rows, cols]`
    pub fn submatrix(&self, rows: &[usize], cols: &[usize]) -> GramMatrix {
        let mut data = Vec::with_capacity(rows.len() * cols.len());
        for &i in rows {
            let row = self.gram.row(i);
            data.extend(cols.iter().map(|&j| row[j]));
        }
        GramMatrix {
            rows: rows.len(),
            cols: cols.len(),
            data,
        }
    }

    /// Borrow the underlying dense matrix
    pub fn as_gram(&self) -> &GramMatrix {
        &self.gram
    }
}

impl PrecomputedKernel for KernelMatrix {
    fn n_rows(&self) -> usize {
        self.gram.rows()
    }

    fn n_cols(&self) -> usize {
        self.gram.cols()
    }

    fn value(&self, i: usize, j: usize) -> f64 {
        self.gram.get(i, j)
    }
}

//! Kernel trait definition

/// Read access to a precomputed kernel (Gram) matrix
///
/// Rows index training points and columns index the points being scored, so a
/// square implementation is a training kernel and a rectangular one is a cross
/// kernel `K[train, test]`. Solvers consume kernels only through this trait and
/// never see the underlying sequences.
pub trait PrecomputedKernel: Send + Sync {
    /// Number of rows
    fn n_rows(&self) -> usize;

    /// Number of columns
    fn n_cols(&self) -> usize;

    /// Kernel value K(i, j)
    ///
    /// # Panics
    /// Implementations may panic if `i >= n_rows()` or `j >= n_cols()`
    fn value(&self, i: usize, j: usize) -> f64;

    /// Whether the kernel is square
    fn is_square(&self) -> bool {
        self.n_rows() == self.n_cols()
    }
}

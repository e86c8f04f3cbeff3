//! Sequential Minimal Optimization (SMO) solver for epsilon-SVR
//!
//! Solves the epsilon-SVR dual over a precomputed kernel. With n training
//! points the dual has 2n variables: the first n carry sign +1 and linear term
//! `epsilon - z_i`, the second n carry sign -1 and linear term `epsilon + z_i`.
//! Q(s, t) = y_s * y_t * K(s mod n, t mod n).
//!
//! Working pairs are chosen by the maximal violating pair rule with
//! second-order information (Fan, Chen and Lin, 2005).

use crate::cache::RowCache;
use crate::core::{GkmError, OptimizationResult, Result, SvrParams};
use crate::kernel::PrecomputedKernel;
use crate::solver::shrinking::ShrinkingStrategy;
use log::{debug, warn};
use std::sync::Arc;

/// Replacement for non-positive curvature in the two-variable subproblem
const TAU: f64 = 1e-12;

/// SMO solver for the epsilon-SVR dual
pub struct SMOSolver {
    params: SvrParams,
}

impl SMOSolver {
    /// Create a new SMO solver with the given hyperparameters
    pub fn new(params: SvrParams) -> Self {
        Self { params }
    }

    /// Get the solver hyperparameters
    pub fn params(&self) -> &SvrParams {
        &self.params
    }

    /// Solve the SVR problem for training kernel `kernel` and regression targets
    pub fn solve<K>(&self, kernel: &K, targets: &[f64]) -> Result<OptimizationResult>
    where
        K: PrecomputedKernel + ?Sized,
    {
        self.params.validate()?;

        let n = targets.len();
        if n == 0 {
            return Err(GkmError::fit("cannot fit on an empty training set"));
        }
        if !kernel.is_square() || kernel.n_rows() != n {
            return Err(GkmError::fit(format!(
                "training kernel is {}x{} but there are {n} targets",
                kernel.n_rows(),
                kernel.n_cols()
            )));
        }
        if let Some(bad) = targets.iter().position(|t| !t.is_finite()) {
            return Err(GkmError::fit(format!("target {bad} is not finite")));
        }

        let mut dual = SvrDual::new(kernel, targets, &self.params);
        let iterations = dual.optimize(self.params.tolerance, self.params.max_iterations);
        dual.into_result(iterations)
    }
}

/// Rows of Q built on demand from the precomputed kernel
struct QMatrix<'k, K: PrecomputedKernel + ?Sized> {
    kernel: &'k K,
    n: usize,
    diag: Vec<f64>,
    cache: RowCache,
}

impl<'k, K: PrecomputedKernel + ?Sized> QMatrix<'k, K> {
    fn new(kernel: &'k K, cache_size: usize) -> Self {
        let n = kernel.n_rows();
        let diag = (0..2 * n).map(|t| kernel.value(t % n, t % n)).collect();
        Self {
            kernel,
            n,
            diag,
            cache: RowCache::with_memory_limit(cache_size, 2 * n),
        }
    }

    fn row(&mut self, i: usize) -> Arc<[f64]> {
        let kernel = self.kernel;
        let n = self.n;
        self.cache.get_or_insert_with(i, || {
            let y_i = sign(i, n);
            let k_i = i % n;
            (0..2 * n)
                .map(|t| y_i * sign(t, n) * kernel.value(k_i, t % n))
                .collect()
        })
    }
}

fn sign(t: usize, n: usize) -> f64 {
    if t < n {
        1.0
    } else {
        -1.0
    }
}

/// Mutable state of one dual optimization
struct SvrDual<'k, K: PrecomputedKernel + ?Sized> {
    q: QMatrix<'k, K>,
    n: usize,
    c: f64,
    y: Vec<f64>,
    linear: Vec<f64>,
    alpha: Vec<f64>,
    grad: Vec<f64>,
    shrinking: Option<ShrinkingStrategy>,
}

impl<'k, K: PrecomputedKernel + ?Sized> SvrDual<'k, K> {
    fn new(kernel: &'k K, targets: &[f64], params: &SvrParams) -> Self {
        let n = targets.len();
        let l = 2 * n;
        let y: Vec<f64> = (0..l).map(|t| sign(t, n)).collect();
        // All alphas start at zero, so the gradient equals the linear term
        let linear: Vec<f64> = (0..l)
            .map(|t| {
                if t < n {
                    params.epsilon - targets[t]
                } else {
                    params.epsilon + targets[t - n]
                }
            })
            .collect();

        Self {
            q: QMatrix::new(kernel, params.cache_size),
            n,
            c: params.c,
            y,
            grad: linear.clone(),
            linear,
            alpha: vec![0.0; l],
            shrinking: params.shrinking.then(|| ShrinkingStrategy::new(l)),
        }
    }

    fn len(&self) -> usize {
        2 * self.n
    }

    fn is_upper(&self, t: usize) -> bool {
        self.alpha[t] >= self.c
    }

    fn is_lower(&self, t: usize) -> bool {
        self.alpha[t] <= 0.0
    }

    fn is_active(&self, t: usize) -> bool {
        self.shrinking.as_ref().map_or(true, |s| s.is_active(t))
    }

    /// Run SMO steps until convergence or the iteration cap
    fn optimize(&mut self, tolerance: f64, max_iterations: usize) -> usize {
        let mut iterations = 0;

        loop {
            if iterations >= max_iterations {
                warn!("SVR solver reached {max_iterations} iterations without converging");
                break;
            }

            if let Some(strategy) = self.shrinking.as_mut() {
                let shrunk = strategy.step(&self.alpha, &self.grad, &self.y, self.c);
                if shrunk > 0 {
                    debug!("Shrinking removed {shrunk} variables at iteration {iterations}");
                }
            }

            let (i, j) = match self.select_working_set(tolerance) {
                Some(pair) => pair,
                None => {
                    // Optimal on the active set; confirm against all variables
                    if let Some(strategy) = self.shrinking.as_mut() {
                        if strategy.unshrink_all() {
                            continue;
                        }
                    }
                    break;
                }
            };

            self.take_step(i, j);
            iterations += 1;
        }

        iterations
    }

    /// Pick the maximal violating pair, or `None` when the KKT gap is below tolerance
    fn select_working_set(&mut self, tolerance: f64) -> Option<(usize, usize)> {
        let l = self.len();

        let mut gmax = f64::NEG_INFINITY;
        let mut first = None;
        for t in 0..l {
            if !self.is_active(t) {
                continue;
            }
            if self.y[t] > 0.0 {
                if !self.is_upper(t) && -self.grad[t] >= gmax {
                    gmax = -self.grad[t];
                    first = Some(t);
                }
            } else if !self.is_lower(t) && self.grad[t] >= gmax {
                gmax = self.grad[t];
                first = Some(t);
            }
        }
        let i = first?;
        let q_i = self.q.row(i);

        let mut gmax2 = f64::NEG_INFINITY;
        let mut second = None;
        let mut obj_diff_min = f64::INFINITY;
        for t in 0..l {
            if !self.is_active(t) {
                continue;
            }
            let (grad_diff, quad_coef) = if self.y[t] > 0.0 {
                if self.is_lower(t) {
                    continue;
                }
                gmax2 = gmax2.max(self.grad[t]);
                (
                    gmax + self.grad[t],
                    self.q.diag[i] + self.q.diag[t] - 2.0 * self.y[i] * q_i[t],
                )
            } else {
                if self.is_upper(t) {
                    continue;
                }
                gmax2 = gmax2.max(-self.grad[t]);
                (
                    gmax - self.grad[t],
                    self.q.diag[i] + self.q.diag[t] + 2.0 * self.y[i] * q_i[t],
                )
            };

            if grad_diff > 0.0 {
                let curvature = if quad_coef > 0.0 { quad_coef } else { TAU };
                let obj_diff = -(grad_diff * grad_diff) / curvature;
                if obj_diff <= obj_diff_min {
                    obj_diff_min = obj_diff;
                    second = Some(t);
                }
            }
        }

        if gmax + gmax2 < tolerance {
            return None;
        }
        second.map(|j| (i, j))
    }

    /// Solve the two-variable subproblem for (i, j) and update the gradient
    fn take_step(&mut self, i: usize, j: usize) {
        let q_i = self.q.row(i);
        let q_j = self.q.row(j);
        let c = self.c;
        let qd_i = self.q.diag[i];
        let qd_j = self.q.diag[j];

        let old_alpha_i = self.alpha[i];
        let old_alpha_j = self.alpha[j];
        let mut alpha_i = old_alpha_i;
        let mut alpha_j = old_alpha_j;

        if self.y[i] != self.y[j] {
            let mut quad_coef = qd_i + qd_j + 2.0 * q_i[j];
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (-self.grad[i] - self.grad[j]) / quad_coef;
            let diff = alpha_i - alpha_j;
            alpha_i += delta;
            alpha_j += delta;

            if diff > 0.0 {
                if alpha_j < 0.0 {
                    alpha_j = 0.0;
                    alpha_i = diff;
                }
            } else if alpha_i < 0.0 {
                alpha_i = 0.0;
                alpha_j = -diff;
            }
            if diff > 0.0 {
                if alpha_i > c {
                    alpha_i = c;
                    alpha_j = c - diff;
                }
            } else if alpha_j > c {
                alpha_j = c;
                alpha_i = c + diff;
            }
        } else {
            let mut quad_coef = qd_i + qd_j - 2.0 * q_i[j];
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (self.grad[i] - self.grad[j]) / quad_coef;
            let sum = alpha_i + alpha_j;
            alpha_i -= delta;
            alpha_j += delta;

            if sum > c {
                if alpha_i > c {
                    alpha_i = c;
                    alpha_j = sum - c;
                }
            } else if alpha_j < 0.0 {
                alpha_j = 0.0;
                alpha_i = sum;
            }
            if sum > c {
                if alpha_j > c {
                    alpha_j = c;
                    alpha_i = sum - c;
                }
            } else if alpha_i < 0.0 {
                alpha_i = 0.0;
                alpha_j = sum;
            }
        }

        self.alpha[i] = alpha_i;
        self.alpha[j] = alpha_j;

        let delta_i = alpha_i - old_alpha_i;
        let delta_j = alpha_j - old_alpha_j;
        for (t, g) in self.grad.iter_mut().enumerate() {
            *g += q_i[t] * delta_i + q_j[t] * delta_j;
        }
    }

    /// Offset of the decision function from the KKT conditions
    fn calculate_rho(&self) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut n_free = 0;
        let mut sum_free = 0.0;

        for t in 0..self.len() {
            let y_grad = self.y[t] * self.grad[t];
            if self.is_upper(t) {
                if self.y[t] < 0.0 {
                    upper = upper.min(y_grad);
                } else {
                    lower = lower.max(y_grad);
                }
            } else if self.is_lower(t) {
                if self.y[t] > 0.0 {
                    upper = upper.min(y_grad);
                } else {
                    lower = lower.max(y_grad);
                }
            } else {
                n_free += 1;
                sum_free += y_grad;
            }
        }

        if n_free > 0 {
            sum_free / n_free as f64
        } else {
            (upper + lower) / 2.0
        }
    }

    fn into_result(self, iterations: usize) -> Result<OptimizationResult> {
        let rho = self.calculate_rho();
        if !rho.is_finite() {
            return Err(GkmError::fit("decision offset is not finite"));
        }
        if self.grad.iter().any(|g| !g.is_finite()) {
            return Err(GkmError::fit("solver gradient diverged"));
        }

        let objective_value = self
            .alpha
            .iter()
            .zip(self.grad.iter().zip(&self.linear))
            .map(|(a, (g, p))| a * (g + p))
            .sum::<f64>()
            / 2.0;

        let n = self.n;
        let coefficients: Vec<f64> = (0..n).map(|t| self.alpha[t] - self.alpha[t + n]).collect();
        let support_vectors: Vec<usize> = coefficients
            .iter()
            .enumerate()
            .filter_map(|(t, &beta)| if beta != 0.0 { Some(t) } else { None })
            .collect();

        let cache = self.q.cache.stats();
        debug!(
            "SVR solved in {iterations} iterations: {} of {n} support vectors, rho={rho:.6}",
            support_vectors.len()
        );
        debug!(
            "Q row cache: hit rate {:.3} ({} misses), {}/{} rows held",
            self.q.cache.hit_rate(),
            cache.misses,
            cache.size,
            cache.capacity
        );

        Ok(OptimizationResult {
            coefficients,
            rho,
            support_vectors,
            iterations,
            objective_value,
        })
    }
}

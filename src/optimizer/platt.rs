//! Platt scaling of SVR decision values into probabilities
//!
//! Fits `P(positive | f) = 1 / (1 + exp(A * f + B))` by Newton's method with
//! backtracking line search, using the regularized targets of Lin, Lin and
//! Weng ("A note on Platt's probabilistic outputs for support vector
//! machines", 2007).

use crate::core::{GkmError, Result};
use log::debug;

const MAX_ITERATIONS: usize = 100;
const MIN_STEP: f64 = 1e-10;
/// Ridge added to the Hessian diagonal
const SIGMA: f64 = 1e-12;
const GRADIENT_TOLERANCE: f64 = 1e-5;

/// Fitted sigmoid parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    /// Fit the sigmoid to decision values and 0/1 labels
    ///
    /// Labels above 0.5 count as positives.
    pub fn fit(decision_values: &[f64], labels: &[f64]) -> Result<Self> {
        if decision_values.len() != labels.len() {
            return Err(GkmError::fit(format!(
                "{} decision values for {} labels",
                decision_values.len(),
                labels.len()
            )));
        }
        if decision_values.is_empty() {
            return Err(GkmError::fit("cannot calibrate on zero points"));
        }

        let n_pos = labels.iter().filter(|&&y| y > 0.5).count() as f64;
        let n_neg = labels.len() as f64 - n_pos;
        let hi_target = (n_pos + 1.0) / (n_pos + 2.0);
        let lo_target = 1.0 / (n_neg + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&y| if y > 0.5 { hi_target } else { lo_target })
            .collect();

        let mut a = 0.0;
        let mut b = ((n_neg + 1.0) / (n_pos + 1.0)).ln();
        let mut fval = objective(decision_values, &targets, a, b);

        let mut iteration = 0;
        while iteration < MAX_ITERATIONS {
            let mut h11 = SIGMA;
            let mut h22 = SIGMA;
            let mut h21 = 0.0;
            let mut g1 = 0.0;
            let mut g2 = 0.0;
            for (&f, &t) in decision_values.iter().zip(&targets) {
                let (p, q) = probabilities(f * a + b);
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < GRADIENT_TOLERANCE && g2.abs() < GRADIENT_TOLERANCE {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(decision_values, &targets, new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                debug!("Platt scaling line search failed at iteration {iteration}");
                break;
            }
            iteration += 1;
        }

        if iteration >= MAX_ITERATIONS {
            debug!("Platt scaling reached {MAX_ITERATIONS} iterations");
        }
        if !(a.is_finite() && b.is_finite()) {
            return Err(GkmError::fit("probability calibration diverged"));
        }

        Ok(Self { a, b })
    }

    /// Probability of the positive class for one decision value
    pub fn probability(&self, decision_value: f64) -> f64 {
        probabilities(decision_value * self.a + self.b).0
    }
}

/// `(1 / (1 + exp(x)), exp(x) / (1 + exp(x)))` without overflow
fn probabilities(x: f64) -> (f64, f64) {
    if x >= 0.0 {
        let e = (-x).exp();
        (e / (1.0 + e), 1.0 / (1.0 + e))
    } else {
        let e = x.exp();
        (1.0 / (1.0 + e), e / (1.0 + e))
    }
}

/// Negative log-likelihood of the regularized targets
fn objective(decision_values: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    decision_values
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let x = f * a + b;
            if x >= 0.0 {
                t * x + (-x).exp().ln_1p()
            } else {
                (t - 1.0) * x + x.exp().ln_1p()
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_probabilities_are_stable() {
        let (p, q) = probabilities(1000.0);
        assert_abs_diff_eq!(p, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q, 1.0, epsilon = 1e-12);

        let (p, q) = probabilities(-1000.0);
        assert_abs_diff_eq!(p, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q, 0.0, epsilon = 1e-12);

        let (p, q) = probabilities(0.0);
        assert_abs_diff_eq!(p, 0.5);
        assert_abs_diff_eq!(q, 0.5);
    }

    #[test]
    fn test_platt_orders_by_decision_value() {
        let decisions = [-1.0, -0.8, -0.3, 0.2, 0.7, 1.1];
        let labels = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let platt = PlattScaling::fit(&decisions, &labels).expect("Should calibrate");

        assert!(platt.a < 0.0);
        let probs: Vec<f64> = decisions.iter().map(|&f| platt.probability(f)).collect();
        assert!(probs.windows(2).all(|w| w[0] < w[1]));
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!(probs[0] < 0.5 && probs[5] > 0.5);
    }

    #[test]
    fn test_platt_overlapping_classes() {
        let decisions = [-1.0, 0.1, -0.2, 0.3, -0.1, 0.9];
        let labels = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let platt = PlattScaling::fit(&decisions, &labels).expect("Should calibrate");
        assert!(platt.a.is_finite() && platt.b.is_finite());
        assert!(platt.probability(1.0) > platt.probability(-1.0));
    }

    #[test]
    fn test_platt_length_mismatch() {
        let result = PlattScaling::fit(&[0.0, 1.0], &[1.0]);
        assert!(matches!(result, Err(GkmError::FitFailure(_))));
    }

    #[test]
    fn test_platt_empty() {
        assert!(PlattScaling::fit(&[], &[]).is_err());
    }
}

//! Serializable nu-to-AUC surrogate models

use crate::core::{GkmError, Result, SurrogateRegressor};
use serde::{Deserialize, Serialize};

/// One knot of a piecewise-linear surrogate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurrogatePoint {
    pub nu: f64,
    pub auc: f64,
}

/// Depth-limited regression tree over the scalar nu
///
/// `values` has one entry more than `thresholds`. An input `x` falls in leaf
/// `i` where `i` counts the thresholds strictly below `x`, so `x` equal to a
/// threshold goes to the lower leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTree {
    pub thresholds: Vec<f64>,
    pub values: Vec<f64>,
}

impl StepTree {
    /// Leaf value for `x`; NaN when the tree has no leaf for it
    pub fn predict(&self, x: f64) -> f64 {
        let leaf = self.thresholds.partition_point(|&t| t < x);
        self.values.get(leaf).copied().unwrap_or(f64::NAN)
    }
}

/// Fitted mapping from a single fit's nu to an expected cross-validated AUC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurrogateModel {
    Linear {
        slope: f64,
        intercept: f64,
    },
    /// Linear interpolation through knots sorted by nu, flat beyond the ends
    Piecewise { points: Vec<SurrogatePoint> },
    /// Gradient-boosted ensemble of step trees
    StepEnsemble {
        init: f64,
        learning_rate: f64,
        trees: Vec<StepTree>,
    },
}

impl SurrogateModel {
    /// Check the model is well formed
    pub fn validate(&self) -> Result<()> {
        match self {
            SurrogateModel::Linear { slope, intercept } => {
                if !(slope.is_finite() && intercept.is_finite()) {
                    return Err(GkmError::config("linear surrogate coefficients must be finite"));
                }
            }
            SurrogateModel::Piecewise { points } => {
                if points.is_empty() {
                    return Err(GkmError::config("piecewise surrogate needs at least one point"));
                }
                if points.iter().any(|p| !(p.nu.is_finite() && p.auc.is_finite())) {
                    return Err(GkmError::config("piecewise surrogate points must be finite"));
                }
                if points.windows(2).any(|w| w[1].nu < w[0].nu) {
                    return Err(GkmError::config("piecewise surrogate points must be sorted by nu"));
                }
            }
            SurrogateModel::StepEnsemble {
                init,
                learning_rate,
                trees,
            } => {
                if !(init.is_finite() && learning_rate.is_finite()) {
                    return Err(GkmError::config("ensemble init and learning rate must be finite"));
                }
                for (t, tree) in trees.iter().enumerate() {
                    if tree.values.len() != tree.thresholds.len() + 1 {
                        return Err(GkmError::config(format!(
                            "tree {t} has {} thresholds but {} leaf values",
                            tree.thresholds.len(),
                            tree.values.len()
                        )));
                    }
                    if tree.thresholds.windows(2).any(|w| w[1] < w[0]) {
                        return Err(GkmError::config(format!(
                            "tree {t} thresholds are not sorted"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Short name of the model kind
    pub fn kind(&self) -> &'static str {
        match self {
            SurrogateModel::Linear { .. } => "linear",
            SurrogateModel::Piecewise { .. } => "piecewise",
            SurrogateModel::StepEnsemble { .. } => "step_ensemble",
        }
    }
}

impl SurrogateRegressor for SurrogateModel {
    fn estimate_auc(&self, nu: f64) -> f64 {
        match self {
            SurrogateModel::Linear { slope, intercept } => slope * nu + intercept,
            SurrogateModel::Piecewise { points } => {
                let xp: Vec<f64> = points.iter().map(|p| p.nu).collect();
                let fp: Vec<f64> = points.iter().map(|p| p.auc).collect();
                crate::metrics::interp(nu, &xp, &fp)
            }
            SurrogateModel::StepEnsemble {
                init,
                learning_rate,
                trees,
            } => init + learning_rate * trees.iter().map(|tree| tree.predict(nu)).sum::<f64>(),
        }
    }
}

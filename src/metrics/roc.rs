//! ROC curves, interpolation and trapezoidal AUC

use crate::core::{GkmError, Result};

/// Number of points on the shared false-positive-rate grid
pub const GRID_POINTS: usize = 100;

/// Receiver operating characteristic of one scored test set
///
/// Points are ordered by decreasing threshold, so both rates are
/// non-decreasing. The first point is always (0, 0) with an infinite
/// threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Build the curve from scores and 0/1 labels (labels above 0.5 are positive)
    ///
    /// One point is emitted per distinct score; tied scores move both rates
    /// at once.
    pub fn from_scores(scores: &[f64], labels: &[f64]) -> Result<Self> {
        if scores.len() != labels.len() {
            return Err(GkmError::config(format!(
                "{} scores for {} labels",
                scores.len(),
                labels.len()
            )));
        }
        if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
            return Err(GkmError::fit(format!("score {i} is not finite")));
        }

        let n_pos = labels.iter().filter(|&&y| y > 0.5).count();
        let n_neg = labels.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(GkmError::config(format!(
                "ROC needs both classes, got {n_pos} positives and {n_neg} negatives"
            )));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut thresholds = vec![f64::INFINITY];
        let mut tp = 0usize;
        let mut fp = 0usize;

        for (rank, &i) in order.iter().enumerate() {
            if labels[i] > 0.5 {
                tp += 1;
            } else {
                fp += 1;
            }
            let last_of_tie = order
                .get(rank + 1)
                .map_or(true, |&next| scores[next] != scores[i]);
            if last_of_tie {
                fpr.push(fp as f64 / n_neg as f64);
                tpr.push(tp as f64 / n_pos as f64);
                thresholds.push(scores[i]);
            }
        }

        Ok(Self {
            fpr,
            tpr,
            thresholds,
        })
    }

    /// Area under this curve
    pub fn auc(&self) -> f64 {
        trapezoid(&self.fpr, &self.tpr)
    }

    /// True-positive rate sampled at each point of `grid`
    pub fn interpolate(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&x| interp(x, &self.fpr, &self.tpr)).collect()
    }
}

/// `count` evenly spaced points from 0 to 1 inclusive
pub fn fpr_grid(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = 1.0 / (count - 1) as f64;
            let mut grid: Vec<f64> = (0..count).map(|i| i as f64 * step).collect();
            grid[count - 1] = 1.0;
            grid
        }
    }
}

/// Piecewise-linear interpolation of `fp` over non-decreasing knots `xp`
///
/// Values outside the knot range take the end values. Where knots repeat,
/// the last of the repeated points wins.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (xp.first(), xp.last()) else {
        return f64::NAN;
    };
    if x < first {
        return fp[0];
    }
    if x >= last {
        return fp[xp.len() - 1];
    }

    // Rightmost knot at or below x; it cannot be the last knot here
    let j = xp.partition_point(|&v| v <= x) - 1;
    let (x0, x1) = (xp[j], xp[j + 1]);
    let (y0, y1) = (fp[j], fp[j + 1]);
    if x == x0 {
        y0
    } else {
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// Trapezoidal area under `y(x)`
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Pointwise mean of equally long curves
pub fn mean_curve(curves: &[Vec<f64>]) -> Vec<f64> {
    let Some(len) = curves.first().map(Vec::len) else {
        return Vec::new();
    };
    let mut mean = vec![0.0; len];
    for curve in curves {
        for (m, v) in mean.iter_mut().zip(curve) {
            *m += v;
        }
    }
    let count = curves.len() as f64;
    mean.iter_mut().for_each(|m| *m /= count);
    mean
}

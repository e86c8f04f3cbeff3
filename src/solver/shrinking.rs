//! Shrinking heuristic implementation
//!
//! Variables sitting at a bound whose gradient says they would stay there are
//! temporarily removed from working-set selection. The solver keeps the full
//! gradient up to date for every variable, so restoring shrunk variables is
//! just a matter of clearing the mask.

/// Iterations between shrinking passes are capped at this value
const MAX_INTERVAL: usize = 1000;

/// Shrinking strategy for the SVR dual
#[derive(Debug)]
pub struct ShrinkingStrategy {
    /// Whether each dual variable takes part in working-set selection
    active: Vec<bool>,
    /// Iterations between shrinking passes
    interval: usize,
    /// Iterations left until the next pass
    countdown: usize,
}

impl ShrinkingStrategy {
    /// Create a strategy for `n_variables` dual variables, all active
    pub fn new(n_variables: usize) -> Self {
        let interval = n_variables.clamp(1, MAX_INTERVAL);
        Self {
            active: vec![true; n_variables],
            interval,
            countdown: interval,
        }
    }

    /// Whether variable `t` is currently active
    pub fn is_active(&self, t: usize) -> bool {
        self.active[t]
    }

    /// Number of active variables
    pub fn n_active(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    /// Count one solver iteration and shrink when the interval elapses
    ///
    /// Returns the number of variables removed by this call.
    pub fn step(&mut self, alpha: &[f64], grad: &[f64], y: &[f64], c: f64) -> usize {
        self.countdown -= 1;
        if self.countdown > 0 {
            return 0;
        }
        self.countdown = self.interval;
        self.shrink(alpha, grad, y, c)
    }

    /// Remove every active variable that is stuck at a bound
    pub fn shrink(&mut self, alpha: &[f64], grad: &[f64], y: &[f64], c: f64) -> usize {
        let mut gmax_up = f64::NEG_INFINITY;
        let mut gmax_down = f64::NEG_INFINITY;

        for t in 0..self.active.len() {
            if !self.active[t] {
                continue;
            }
            if y[t] > 0.0 {
                if alpha[t] < c {
                    gmax_up = gmax_up.max(-grad[t]);
                }
                if alpha[t] > 0.0 {
                    gmax_down = gmax_down.max(grad[t]);
                }
            } else {
                if alpha[t] < c {
                    gmax_down = gmax_down.max(-grad[t]);
                }
                if alpha[t] > 0.0 {
                    gmax_up = gmax_up.max(grad[t]);
                }
            }
        }

        let mut shrunk = 0;
        for t in 0..self.active.len() {
            if !self.active[t] {
                continue;
            }
            let stuck = if alpha[t] >= c {
                if y[t] > 0.0 {
                    -grad[t] > gmax_up
                } else {
                    -grad[t] > gmax_down
                }
            } else if alpha[t] <= 0.0 {
                if y[t] > 0.0 {
                    grad[t] > gmax_down
                } else {
                    grad[t] > gmax_up
                }
            } else {
                false
            };

            if stuck {
                self.active[t] = false;
                shrunk += 1;
            }
        }

        shrunk
    }

    /// Reactivate every variable; returns whether anything had been shrunk
    pub fn unshrink_all(&mut self) -> bool {
        let any_shrunk = self.active.iter().any(|&a| !a);
        self.active.iter_mut().for_each(|a| *a = true);
        self.countdown = self.interval;
        any_shrunk
    }
}

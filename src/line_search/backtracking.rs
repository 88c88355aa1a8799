use log::trace;

use crate::line_search::{Line, LineSearch, LineSearchOutcome};

/// Armijo-style step halving.
///
/// Starts at `step_size` and halves `α` until
/// `f(x + α·d) ≤ f(x) − γ·step_size·α` or `max_iterations` halvings have been
/// spent. If even the last trial is worse than `f(x)` the step is rejected and
/// `α = 0` is returned.
#[derive(Debug, Clone)]
pub struct Backtracking {
    pub step_size: f64,
    pub gamma: f64,
    pub max_iterations: usize,
}

impl Backtracking {
    pub fn new(step_size: f64, gamma: f64, max_iterations: usize) -> Self {
        Self {
            step_size,
            gamma,
            max_iterations,
        }
    }
}

impl Default for Backtracking {
    fn default() -> Self {
        Self::new(1.0, 1e-4, 30)
    }
}

impl LineSearch for Backtracking {
    fn find_alpha_star(
        &mut self,
        f: &mut dyn FnMut(&[f64]) -> f64,
        x: &[f64],
        direction: &[f64],
    ) -> LineSearchOutcome {
        let mut line = Line::new(f, x, direction);
        let f0 = line.at(0.0);
        let mut alpha = self.step_size;
        let mut value = line.at(alpha);
        let mut halvings = 0;
        while value > f0 - self.gamma * self.step_size * alpha && halvings < self.max_iterations {
            alpha /= 2.0;
            value = line.at(alpha);
            halvings += 1;
        }
        trace!("backtracking stopped at alpha = {alpha} after {halvings} halvings");
        if value > f0 {
            return line.outcome(0.0, f0);
        }
        line.outcome(alpha, value)
    }

    /// The smallest step the search can return.
    fn epsilon(&self) -> f64 {
        self.step_size / 2f64.powi(self.max_iterations as i32)
    }
}

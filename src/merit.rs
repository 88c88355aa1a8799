//! Penalty (merit) functions.
//!
//! Methods that cannot handle constraints natively minimize
//! `f(x) + penalty(g(x), h(x))` instead of `f(x)`. A merit function only sees
//! constraint values (and their gradients), never the decision vector.

/// Combines constraint violations into a scalar penalty.
pub trait MeritFunction: Send + Sync {
    /// Penalty for inequality values `g` (feasible when `≤ 0`) and equality
    /// values `h` (feasible when `= 0`).
    fn penalty(&self, g: &[f64], h: &[f64]) -> f64;

    /// Gradient of the penalty given each constraint's gradient.
    fn penalty_gradient(
        &self,
        g: &[f64],
        g_gradients: &[Vec<f64>],
        h: &[f64],
        h_gradients: &[Vec<f64>],
    ) -> Vec<f64>;
}

/// `weight · (Σ max(0, g)² + Σ h²)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquaredExteriorPenalty {
    pub weight: f64,
}

impl SquaredExteriorPenalty {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

impl Default for SquaredExteriorPenalty {
    fn default() -> Self {
        Self { weight: 1.0e3 }
    }
}

impl MeritFunction for SquaredExteriorPenalty {
    fn penalty(&self, g: &[f64], h: &[f64]) -> f64 {
        let inequality: f64 = g.iter().map(|&gi| gi.max(0.0).powi(2)).sum();
        let equality: f64 = h.iter().map(|&hi| hi * hi).sum();
        self.weight * (inequality + equality)
    }

    fn penalty_gradient(
        &self,
        g: &[f64],
        g_gradients: &[Vec<f64>],
        h: &[f64],
        h_gradients: &[Vec<f64>],
    ) -> Vec<f64> {
        let n = gradient_length(g_gradients, h_gradients);
        let mut grad = vec![0.0; n];
        for (&gi, dg) in g.iter().zip(g_gradients.iter()) {
            if gi > 0.0 {
                accumulate(&mut grad, 2.0 * self.weight * gi, dg);
            }
        }
        for (&hi, dh) in h.iter().zip(h_gradients.iter()) {
            accumulate(&mut grad, 2.0 * self.weight * hi, dh);
        }
        grad
    }
}

/// `weight · (Σ max(0, g) + Σ |h|)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearExteriorPenalty {
    pub weight: f64,
}

impl LinearExteriorPenalty {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

impl Default for LinearExteriorPenalty {
    fn default() -> Self {
        Self { weight: 1.0e2 }
    }
}

impl MeritFunction for LinearExteriorPenalty {
    fn penalty(&self, g: &[f64], h: &[f64]) -> f64 {
        let inequality: f64 = g.iter().map(|&gi| gi.max(0.0)).sum();
        let equality: f64 = h.iter().map(|&hi| hi.abs()).sum();
        self.weight * (inequality + equality)
    }

    // Subgradient: zero on the boundary.
    fn penalty_gradient(
        &self,
        g: &[f64],
        g_gradients: &[Vec<f64>],
        h: &[f64],
        h_gradients: &[Vec<f64>],
    ) -> Vec<f64> {
        let n = gradient_length(g_gradients, h_gradients);
        let mut grad = vec![0.0; n];
        for (&gi, dg) in g.iter().zip(g_gradients.iter()) {
            if gi > 0.0 {
                accumulate(&mut grad, self.weight, dg);
            }
        }
        for (&hi, dh) in h.iter().zip(h_gradients.iter()) {
            if hi != 0.0 {
                accumulate(&mut grad, self.weight * hi.signum(), dh);
            }
        }
        grad
    }
}

fn gradient_length(g_gradients: &[Vec<f64>], h_gradients: &[Vec<f64>]) -> usize {
    g_gradients
        .iter()
        .chain(h_gradients.iter())
        .map(Vec::len)
        .max()
        .unwrap_or(0)
}

fn accumulate(grad: &mut [f64], factor: f64, direction: &[f64]) {
    for (gi, &di) in grad.iter_mut().zip(direction.iter()) {
        *gi += factor * di;
    }
}

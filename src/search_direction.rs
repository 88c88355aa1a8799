//! Strategies that choose the next search direction.
//!
//! A direction is requested once per gradient-based iteration, before the
//! line search runs. Strategies may keep history between calls; `reset`
//! discards it.

mod bfgs;
mod cyclic_coordinates;
mod fletcher_reeves;
mod powell;
mod steepest_descent;

pub use bfgs::Bfgs;
pub use cyclic_coordinates::CyclicCoordinates;
pub use fletcher_reeves::FletcherReeves;
pub use powell::PowellDirections;
pub use steepest_descent::SteepestDescent;

use crate::linalg::{negate, normalize};

/// Produces descent directions from the current point and gradient.
pub trait SearchDirection {
    /// Returns the next direction to search along from `x`.
    ///
    /// `gradient` is empty for strategies that do not need one.
    fn find(&mut self, x: &[f64], gradient: &[f64], f: f64, reset: bool) -> Vec<f64>;

    /// Reports the step length the line search accepted along the last
    /// direction.
    fn observe_step(&mut self, _alpha: f64) {}

    fn requires_gradient(&self) -> bool {
        true
    }
}

/// `-g / |g|`, or the zero vector when `g` is zero.
pub(crate) fn steepest(gradient: &[f64]) -> Vec<f64> {
    match normalize(gradient) {
        Some(unit) => negate(&unit),
        None => vec![0.0; gradient.len()],
    }
}

/// Unit vector along axis `i`.
pub(crate) fn unit(n: usize, i: usize) -> Vec<f64> {
    let mut e = vec![0.0; n];
    e[i] = 1.0;
    e
}

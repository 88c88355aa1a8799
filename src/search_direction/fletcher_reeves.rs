use log::warn;

use crate::linalg::{axpy, norm2, normalize};
use crate::search_direction::{steepest, SearchDirection};

/// Fletcher-Reeves conjugate gradient.
///
/// `d = −ĝ + (‖g‖ / ‖g_last‖)·d_last`, normalized. The first call, an explicit
/// reset, or a combined direction of zero magnitude all fall back to steepest
/// descent and clear the history.
#[derive(Debug, Clone, Default)]
pub struct FletcherReeves {
    last_gradient_norm: Option<f64>,
    last_direction: Option<Vec<f64>>,
}

impl FletcherReeves {
    pub fn new() -> Self {
        Self::default()
    }

    fn restart(&mut self, gradient: &[f64]) -> Vec<f64> {
        let direction = steepest(gradient);
        self.last_gradient_norm = Some(norm2(gradient));
        self.last_direction = Some(direction.clone());
        direction
    }
}

impl SearchDirection for FletcherReeves {
    fn find(&mut self, _x: &[f64], gradient: &[f64], _f: f64, reset: bool) -> Vec<f64> {
        let (last_norm, last_direction) = match (self.last_gradient_norm, self.last_direction.take()) {
            (Some(n), Some(d)) if !reset && n > 0.0 && d.len() == gradient.len() => (n, d),
            _ => return self.restart(gradient),
        };
        let beta = norm2(gradient) / last_norm;
        let combined = axpy(&steepest(gradient), beta, &last_direction);
        match normalize(&combined) {
            Some(direction) => {
                self.last_gradient_norm = Some(norm2(gradient));
                self.last_direction = Some(direction.clone());
                direction
            }
            None => {
                warn!("conjugate direction vanished, restarting from steepest descent");
                self.restart(gradient)
            }
        }
    }
}

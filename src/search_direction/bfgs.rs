use log::warn;
use ndarray::{Array1, Array2, Axis};

use crate::linalg::subtract;
use crate::search_direction::SearchDirection;

/// BFGS quasi-Newton directions.
///
/// Keeps an approximation `H` of the inverse Hessian, updated with the
/// rank-two formula
///
/// `H⁺ = (I − ρ·s·yᵀ) H (I − ρ·y·sᵀ) + ρ·s·sᵀ`, `ρ = 1 / (yᵀs)`
///
/// from the step `s = x − x_last` and the gradient change `y = g − g_last`.
/// The direction is `−H·g`, not normalized. `H` starts as the identity and
/// returns to it on reset, on a change of dimension, or whenever `−H·g` fails
/// to be a descent direction.
#[derive(Debug, Clone, Default)]
pub struct Bfgs {
    inverse_hessian: Option<Array2<f64>>,
    last_x: Vec<f64>,
    last_gradient: Vec<f64>,
}

impl Bfgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current inverse-Hessian estimate, if any step has been taken.
    pub fn inverse_hessian(&self) -> Option<&Array2<f64>> {
        self.inverse_hessian.as_ref()
    }

    fn update(h: &Array2<f64>, s: &Array1<f64>, y: &Array1<f64>) -> Option<Array2<f64>> {
        let sy = s.dot(y);
        let scale = s.dot(s).sqrt() * y.dot(y).sqrt();
        if !(sy > 1e-12 * scale) || !sy.is_finite() {
            return None;
        }
        let rho = 1.0 / sy;
        let n = s.len();
        let identity = Array2::<f64>::eye(n);
        let s_col = s.view().insert_axis(Axis(1));
        let y_col = y.view().insert_axis(Axis(1));
        let s_yt = s_col.dot(&y_col.t());
        let left = &identity - &s_yt.mapv(|v| rho * v);
        let right = &identity - &s_yt.t().mapv(|v| rho * v);
        let s_st = s_col.dot(&s_col.t()).mapv(|v| rho * v);
        Some(left.dot(h).dot(&right) + s_st)
    }
}

impl SearchDirection for Bfgs {
    fn find(&mut self, x: &[f64], gradient: &[f64], _f: f64, reset: bool) -> Vec<f64> {
        let n = gradient.len();
        let g = Array1::from(gradient.to_vec());
        let mut h = match self.inverse_hessian.take() {
            Some(h) if !reset && h.nrows() == n && self.last_x.len() == n => {
                let s = Array1::from(subtract(x, &self.last_x));
                let y = Array1::from(subtract(gradient, &self.last_gradient));
                match Self::update(&h, &s, &y) {
                    Some(updated) => updated,
                    None => {
                        warn!("BFGS curvature condition failed, keeping previous estimate");
                        h
                    }
                }
            }
            _ => Array2::eye(n),
        };

        let mut direction = -h.dot(&g);
        if direction.dot(&g) > 0.0 || direction.iter().any(|v| !v.is_finite()) {
            warn!("BFGS direction is not a descent direction, resetting to identity");
            h = Array2::eye(n);
            direction = -&g;
        }

        self.inverse_hessian = Some(h);
        self.last_x = x.to_vec();
        self.last_gradient = gradient.to_vec();
        direction.to_vec()
    }
}

/// Finite-difference scheme used when a function has no analytic derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Differencing {
    /// `(f(x + h) − f(x)) / h`
    Forward { step: f64 },
    /// `(f(x) − f(x − h)) / h`
    Backward { step: f64 },
    /// `(f(x + h) − f(x − h)) / 2h`
    Central { step: f64 },
    /// Four-point central difference, fourth-order accurate.
    Central4 { step: f64 },
}

impl Default for Differencing {
    fn default() -> Self {
        Differencing::Central { step: 1e-6 }
    }
}

impl Differencing {
    pub fn step(&self) -> f64 {
        match *self {
            Differencing::Forward { step }
            | Differencing::Backward { step }
            | Differencing::Central { step }
            | Differencing::Central4 { step } => step,
        }
    }

    /// Approximates `∂f/∂x[i]`. `fx` is `f(x)` when the caller already has
    /// it; one-sided schemes evaluate it otherwise.
    pub fn partial(
        &self,
        f: &mut dyn FnMut(&[f64]) -> f64,
        x: &[f64],
        i: usize,
        fx: Option<f64>,
    ) -> f64 {
        let h = self.step();
        match self {
            Differencing::Forward { .. } => {
                let f0 = fx.unwrap_or_else(|| f(x));
                (shifted(f, x, i, h) - f0) / h
            }
            Differencing::Backward { .. } => {
                let f0 = fx.unwrap_or_else(|| f(x));
                (f0 - shifted(f, x, i, -h)) / h
            }
            Differencing::Central { .. } => {
                (shifted(f, x, i, h) - shifted(f, x, i, -h)) / (2.0 * h)
            }
            Differencing::Central4 { .. } => {
                let f_m2 = shifted(f, x, i, -2.0 * h);
                let f_m1 = shifted(f, x, i, -h);
                let f_p1 = shifted(f, x, i, h);
                let f_p2 = shifted(f, x, i, 2.0 * h);
                (f_m2 - 8.0 * f_m1 + 8.0 * f_p1 - f_p2) / (12.0 * h)
            }
        }
    }

    /// Approximates the full gradient of `f` at `x`.
    pub fn gradient(
        &self,
        f: &mut dyn FnMut(&[f64]) -> f64,
        x: &[f64],
        fx: Option<f64>,
    ) -> Vec<f64> {
        let fx = match self {
            Differencing::Forward { .. } | Differencing::Backward { .. } => {
                Some(fx.unwrap_or_else(|| f(x)))
            }
            _ => fx,
        };
        (0..x.len()).map(|i| self.partial(f, x, i, fx)).collect()
    }
}

fn shifted(f: &mut dyn FnMut(&[f64]) -> f64, x: &[f64], i: usize, offset: f64) -> f64 {
    let mut moved = x.to_vec();
    moved[i] += offset;
    f(&moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cubic(x: &[f64]) -> f64 {
        x[0].powi(3) + 2.0 * x[0] * x[1]
    }

    #[test]
    fn test_schemes_approximate_gradient() {
        let x = [1.5, -0.5];
        let exact = [3.0 * 1.5 * 1.5 + 2.0 * -0.5, 2.0 * 1.5];
        for scheme in [
            Differencing::Forward { step: 1e-7 },
            Differencing::Backward { step: 1e-7 },
            Differencing::Central { step: 1e-5 },
            Differencing::Central4 { step: 1e-3 },
        ] {
            let grad = scheme.gradient(&mut |p: &[f64]| cubic(p), &x, None);
            assert_abs_diff_eq!(grad[0], exact[0], epsilon = 1e-4);
            assert_abs_diff_eq!(grad[1], exact[1], epsilon = 1e-4);
        }
    }

    #[test]
    fn test_forward_reuses_base_value() {
        let mut calls = 0;
        let mut f = |p: &[f64]| {
            calls += 1;
            cubic(p)
        };
        Differencing::Forward { step: 1e-6 }.gradient(&mut f, &[1.0, 1.0], Some(3.0));
        assert_eq!(calls, 2);

        let mut calls = 0;
        let mut f = |p: &[f64]| {
            calls += 1;
            cubic(p)
        };
        Differencing::Central4 { step: 1e-3 }.gradient(&mut f, &[1.0, 1.0], None);
        assert_eq!(calls, 8);
    }
}

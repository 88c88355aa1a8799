use crate::search_direction::{steepest, SearchDirection};

/// Normalized negative gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteepestDescent;

impl SteepestDescent {
    pub fn new() -> Self {
        Self
    }
}

impl SearchDirection for SteepestDescent {
    fn find(&mut self, _x: &[f64], gradient: &[f64], _f: f64, _reset: bool) -> Vec<f64> {
        steepest(gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_unit_negative_gradient() {
        let d = SteepestDescent::new().find(&[0.0, 0.0], &[3.0, -4.0], 0.0, false);
        assert_abs_diff_eq!(d[0], -0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(d[1], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_gradient_is_a_fixpoint() {
        let d = SteepestDescent::new().find(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0], 0.0, false);
        assert_eq!(d, vec![0.0, 0.0, 0.0]);
    }
}

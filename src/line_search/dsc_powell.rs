use log::warn;

use crate::line_search::{
    bracket_three, fallback_trial, refine_three, Line, LineSearch, LineSearchOutcome, Triple,
};

/// Davies-Swann-Campey bracketing followed by Powell's quadratic
/// interpolation.
///
/// Each refinement step fits a parabola through the three bracket points and
/// tries its vertex. A fit with non-positive curvature is rejected in favour
/// of bisection or extrapolation, depending on which point holds the minimum.
#[derive(Debug, Clone)]
pub struct DscPowell {
    pub epsilon: f64,
    pub step_size: f64,
    pub max_iterations: usize,
}

impl DscPowell {
    pub fn new(epsilon: f64, step_size: f64, max_iterations: usize) -> Self {
        Self {
            epsilon,
            step_size,
            max_iterations,
        }
    }
}

impl Default for DscPowell {
    fn default() -> Self {
        Self::new(1e-8, 1.0, 100)
    }
}

/// Vertex of the parabola through three sorted points, if it opens upward.
pub(crate) fn quadratic_vertex(points: &Triple) -> Option<f64> {
    let [(a, fa), (b, fb), (c, fc)] = *points;
    if b - a <= 0.0 || c - b <= 0.0 {
        return None;
    }
    let slope = (fb - fa) / (b - a);
    let curvature = ((fc - fb) / (c - b) - slope) / (c - a);
    if curvature > 0.0 {
        Some((a + b) / 2.0 - slope / (2.0 * curvature))
    } else {
        None
    }
}

fn powell_trial(points: &Triple) -> f64 {
    quadratic_vertex(points).unwrap_or_else(|| {
        warn!("quadratic fit is not convex, falling back to bracket rules");
        fallback_trial(points)
    })
}

impl LineSearch for DscPowell {
    fn find_alpha_star(
        &mut self,
        f: &mut dyn FnMut(&[f64]) -> f64,
        x: &[f64],
        direction: &[f64],
    ) -> LineSearchOutcome {
        let mut line = Line::new(f, x, direction);
        let points = bracket_three(&mut line, self.step_size, self.max_iterations);
        let (alpha, value) = refine_three(
            &mut line,
            points,
            self.epsilon,
            self.max_iterations,
            powell_trial,
        );
        line.outcome(alpha, value)
    }

    fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_vertex_of_exact_parabola() {
        let p = |a: f64| (a - 1.3).powi(2) + 2.0;
        let points = [(0.0, p(0.0)), (1.0, p(1.0)), (3.0, p(3.0))];
        assert_abs_diff_eq!(quadratic_vertex(&points).unwrap(), 1.3, epsilon = 1e-12);
    }

    #[test]
    fn test_concave_fit_is_rejected() {
        let points = [(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)];
        assert_eq!(quadratic_vertex(&points), None);
        let collinear = [(0.0, 3.0), (1.0, 2.0), (2.0, 1.0)];
        assert_eq!(quadratic_vertex(&collinear), None);
        assert_eq!(powell_trial(&collinear), 3.0);
    }

    #[test]
    fn test_finds_quadratic_minimum() {
        let mut search = DscPowell::new(1e-6, 0.5, 100);
        let mut f = |x: &[f64]| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2);
        let outcome = search.find_alpha_star(&mut f, &[0.0, -1.0], &[1.0, 0.0]);
        assert_abs_diff_eq!(outcome.alpha, 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(outcome.value, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_non_quadratic_function() {
        let mut search = DscPowell::default();
        let mut f = |x: &[f64]| (x[0] - 2.0).powi(4) + x[0];
        // f'(α) = 4(α − 2)³ + 1 = 0
        let expected = 2.0 - 0.25_f64.cbrt();
        let outcome = search.find_alpha_star(&mut f, &[0.0], &[1.0]);
        assert_abs_diff_eq!(outcome.alpha, expected, epsilon = 1e-3);
    }
}

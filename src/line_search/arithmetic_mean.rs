use crate::line_search::{bracket_three, refine_three, Line, LineSearch, LineSearchOutcome, Triple};

/// Bracket-and-replace search whose trial point is the unweighted mean of the
/// three bracket points.
#[derive(Debug, Clone)]
pub struct ArithmeticMean {
    pub epsilon: f64,
    pub step_size: f64,
    pub max_iterations: usize,
}

impl ArithmeticMean {
    pub fn new(epsilon: f64, step_size: f64, max_iterations: usize) -> Self {
        Self {
            epsilon,
            step_size,
            max_iterations,
        }
    }
}

impl Default for ArithmeticMean {
    fn default() -> Self {
        Self::new(1e-8, 1.0, 200)
    }
}

fn mean_trial(points: &Triple) -> f64 {
    (points[0].0 + points[1].0 + points[2].0) / 3.0
}

impl LineSearch for ArithmeticMean {
    fn find_alpha_star(
        &mut self,
        f: &mut dyn FnMut(&[f64]) -> f64,
        x: &[f64],
        direction: &[f64],
    ) -> LineSearchOutcome {
        let mut line = Line::new(f, x, direction);
        let points = bracket_three(&mut line, self.step_size, self.max_iterations);
        let (alpha, value) =
            refine_three(&mut line, points, self.epsilon, self.max_iterations, mean_trial);
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
    fn test_mean_trial() {
        assert_eq!(mean_trial(&[(0.0, 1.0), (1.0, 0.0), (5.0, 2.0)]), 2.0);
    }

    #[test]
    fn test_converges_on_parabola() {
        let mut search = ArithmeticMean::new(1e-7, 0.25, 500);
        let mut f = |x: &[f64]| (x[0] - 1.7).powi(2);
        let outcome = search.find_alpha_star(&mut f, &[0.0], &[1.0]);
        assert_abs_diff_eq!(outcome.alpha, 1.7, epsilon = 1e-5);
        assert!(outcome.evaluations > 3);
    }
}

//! One-dimensional minimization along a search direction.
//!
//! Every strategy finds `α*` minimizing `f(x + α·d)` by first bracketing a
//! minimum and then shrinking the bracket. Evaluations are counted on the
//! returned [`LineSearchOutcome`].

mod arithmetic_mean;
mod backtracking;
mod dsc_powell;
mod golden_section;

pub use arithmetic_mean::ArithmeticMean;
pub use backtracking::Backtracking;
pub use dsc_powell::DscPowell;
pub use golden_section::GoldenSection;

use log::{trace, warn};

use crate::linalg::axpy;

/// Result of a line search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchOutcome {
    /// Step length along the direction.
    pub alpha: f64,
    /// Function value at `x + alpha·d`.
    pub value: f64,
    /// Function evaluations spent.
    pub evaluations: usize,
}

/// A 1-D minimizer along a direction.
pub trait LineSearch {
    /// Minimizes `f(x + α·direction)` over `α`.
    fn find_alpha_star(
        &mut self,
        f: &mut dyn FnMut(&[f64]) -> f64,
        x: &[f64],
        direction: &[f64],
    ) -> LineSearchOutcome;

    /// Step lengths below this are treated as "no progress".
    fn epsilon(&self) -> f64;
}

/// `f` restricted to the line `x + α·d`, counting evaluations.
pub(crate) struct Line<'a, 'f> {
    f: &'a mut (dyn FnMut(&[f64]) -> f64 + 'f),
    x: &'a [f64],
    direction: &'a [f64],
    evaluations: usize,
}

impl<'a, 'f> Line<'a, 'f> {
    pub(crate) fn new(
        f: &'a mut (dyn FnMut(&[f64]) -> f64 + 'f),
        x: &'a [f64],
        direction: &'a [f64],
    ) -> Self {
        Self {
            f,
            x,
            direction,
            evaluations: 0,
        }
    }

    pub(crate) fn at(&mut self, alpha: f64) -> f64 {
        self.evaluations += 1;
        let point = axpy(self.x, alpha, self.direction);
        (self.f)(&point)
    }

    pub(crate) fn outcome(&self, alpha: f64, value: f64) -> LineSearchOutcome {
        LineSearchOutcome {
            alpha,
            value,
            evaluations: self.evaluations,
        }
    }
}

/// Three sorted `(α, f)` pairs.
pub(crate) type Triple = [(f64, f64); 3];

/// Brackets a minimum with three points, doubling the step while the
/// function keeps decreasing and halving it if the first step overshoots.
pub(crate) fn bracket_three(line: &mut Line<'_, '_>, step_size: f64, max_steps: usize) -> Triple {
    let f0 = line.at(0.0);
    let f1 = line.at(step_size);
    if f1 > f0 {
        let mut far = (step_size, f1);
        for _ in 0..max_steps {
            let h = far.0 / 2.0;
            let fh = line.at(h);
            if fh <= f0 {
                return [(0.0, f0), (h, fh), far];
            }
            far = (h, fh);
        }
        let h = far.0 / 2.0;
        let fh = line.at(h);
        return [(0.0, f0), (h, fh), far];
    }

    let mut previous = (0.0, f0);
    let mut current = (step_size, f1);
    let mut delta = step_size;
    for _ in 0..max_steps {
        delta *= 2.0;
        let next_alpha = current.0 + delta;
        let next = (next_alpha, line.at(next_alpha));
        if next.1 > current.1 {
            return [previous, current, next];
        }
        previous = current;
        current = next;
    }
    warn!("bracketing hit its step cap at alpha = {}", current.0);
    let next_alpha = current.0 + 2.0 * delta;
    [previous, current, (next_alpha, line.at(next_alpha))]
}

/// Shrinks a three-point bracket by inserting trial points proposed by
/// `propose` and keeping the best point with its two neighbours. Stops when
/// the bracket half-width is at most `epsilon` or after `max_iterations`.
pub(crate) fn refine_three(
    line: &mut Line<'_, '_>,
    mut points: Triple,
    epsilon: f64,
    max_iterations: usize,
    propose: impl Fn(&Triple) -> f64,
) -> (f64, f64) {
    for k in 0..max_iterations {
        let (a, c) = (points[0].0, points[2].0);
        if (c - a) / 2.0 <= epsilon {
            trace!("bracket closed after {k} iterations");
            break;
        }
        let mut trial = propose(&points);
        if !trial.is_finite() || coincides(&points, trial) {
            trial = larger_half_midpoint(&points);
            if coincides(&points, trial) {
                break;
            }
        }
        let f_trial = line.at(trial);
        points = keep_around_minimum(points, (trial, f_trial));
    }
    best_of(&points)
}

/// Index of the lowest value in a triple (first on ties).
pub(crate) fn argmin(points: &Triple) -> usize {
    let mut best = 0;
    for i in 1..3 {
        if points[i].1 < points[best].1 {
            best = i;
        }
    }
    best
}

/// Rule-based trial when a fitted model cannot be trusted: bisect toward the
/// minimum when it sits at the low end, extrapolate when it sits at the high
/// end, otherwise split the larger sub-interval.
pub(crate) fn fallback_trial(points: &Triple) -> f64 {
    let [(a, _), (b, _), (c, _)] = *points;
    match argmin(points) {
        0 => (a + b) / 2.0,
        2 => c + (c - b),
        _ => larger_half_midpoint(points),
    }
}

fn larger_half_midpoint(points: &Triple) -> f64 {
    let [(a, _), (b, _), (c, _)] = *points;
    if b - a > c - b {
        (a + b) / 2.0
    } else {
        (b + c) / 2.0
    }
}

fn coincides(points: &Triple, trial: f64) -> bool {
    points
        .iter()
        .any(|&(alpha, _)| (alpha - trial).abs() <= 1e-14 * (1.0 + alpha.abs()))
}

fn keep_around_minimum(points: Triple, trial: (f64, f64)) -> Triple {
    let mut four = [points[0], points[1], points[2], trial];
    four.sort_by(|p, q| p.0.partial_cmp(&q.0).unwrap_or(std::cmp::Ordering::Equal));
    let mut best = 0;
    for i in 1..4 {
        if four[i].1 < four[best].1 {
            best = i;
        }
    }
    let start = best.saturating_sub(1).min(1);
    [four[start], four[start + 1], four[start + 2]]
}

fn best_of(points: &Triple) -> (f64, f64) {
    points[argmin(points)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parabola(x: &[f64]) -> f64 {
        (x[0] - 3.0).powi(2)
    }

    #[test]
    fn test_bracket_expands_to_contain_minimum() {
        let mut f = |x: &[f64]| parabola(x);
        let mut line = Line::new(&mut f, &[0.0], &[1.0]);
        let points = bracket_three(&mut line, 0.5, 50);
        assert!(points[0].0 < 3.0 && 3.0 < points[2].0);
        assert!(points[1].1 <= points[0].1 && points[1].1 <= points[2].1);
    }

    #[test]
    fn test_bracket_shrinks_when_step_overshoots() {
        let mut f = |x: &[f64]| parabola(x);
        let mut line = Line::new(&mut f, &[0.0], &[1.0]);
        let points = bracket_three(&mut line, 100.0, 50);
        assert_eq!(points[0].0, 0.0);
        assert!(points[1].1 <= points[0].1);
        assert!(points[2].0 > 3.0);
    }

    #[test]
    fn test_keep_around_minimum() {
        let kept = keep_around_minimum([(0.0, 5.0), (1.0, 2.0), (4.0, 6.0)], (2.0, 1.0));
        assert_eq!(kept, [(1.0, 2.0), (2.0, 1.0), (4.0, 6.0)]);
        let kept = keep_around_minimum([(0.0, 5.0), (1.0, 2.0), (4.0, 6.0)], (0.5, 0.1));
        assert_eq!(kept, [(0.0, 5.0), (0.5, 0.1), (1.0, 2.0)]);
    }

    #[test]
    fn test_fallback_trial() {
        assert_eq!(fallback_trial(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]), 0.5);
        assert_eq!(fallback_trial(&[(0.0, 3.0), (1.0, 2.0), (2.0, 1.0)]), 3.0);
        assert_eq!(fallback_trial(&[(0.0, 3.0), (1.0, 1.0), (4.0, 3.0)]), 2.5);
    }
}

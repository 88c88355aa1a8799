use log::trace;

use crate::line_search::{Line, LineSearch, LineSearchOutcome};

/// `(√5 − 1) / 2`
const GOLDEN_RATIO: f64 = 0.618_033_988_749_895;

/// Golden section line search.
///
/// The bracket starts at `[0, step_size]` and slides outward by a factor of
/// `1 / 0.618` for as long as the far end keeps improving. The interior
/// refinement then runs a fixed number of golden-ratio reductions computed up
/// front from `ln(ε / width) / ln(0.618)`, so no convergence test is needed
/// inside the loop.
///
/// # Examples
///
/// ```
/// use optkit::line_search::{GoldenSection, LineSearch};
///
/// let mut search = GoldenSection::new(1e-8, 1.0);
/// let mut f = |x: &[f64]| (x[0] - 2.5).powi(2);
/// let outcome = search.find_alpha_star(&mut f, &[0.0], &[1.0]);
/// assert!((outcome.alpha - 2.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct GoldenSection {
    /// Final bracket width.
    pub epsilon: f64,
    /// First trial step.
    pub step_size: f64,
    /// Upper bound on outward slides while bracketing.
    pub max_expansions: usize,
}

impl GoldenSection {
    pub fn new(epsilon: f64, step_size: f64) -> Self {
        Self {
            epsilon,
            step_size,
            max_expansions: 200,
        }
    }

    /// Number of golden reductions needed to shrink `width` below `epsilon`.
    pub fn reductions_needed(&self, width: f64) -> usize {
        if width <= self.epsilon || self.epsilon <= 0.0 {
            return 0;
        }
        ((self.epsilon / width).ln() / GOLDEN_RATIO.ln()).ceil() as usize
    }

    fn bracket(&self, line: &mut Line<'_, '_>) -> (f64, f64) {
        let mut low = 0.0;
        let f_low = line.at(low);
        let mut mid = self.step_size;
        let mut f_mid = line.at(mid);
        if f_mid >= f_low {
            return (low, mid);
        }
        let mut high = mid + (mid - low) / GOLDEN_RATIO;
        let mut f_high = line.at(high);
        let mut expansions = 0;
        while f_high < f_mid && expansions < self.max_expansions {
            low = mid;
            mid = high;
            f_mid = f_high;
            high = mid + (mid - low) / GOLDEN_RATIO;
            f_high = line.at(high);
            expansions += 1;
        }
        trace!("golden bracket [{low}, {high}] after {expansions} expansions");
        (low, high)
    }
}

impl Default for GoldenSection {
    fn default() -> Self {
        Self::new(1e-8, 1.0)
    }
}

impl LineSearch for GoldenSection {
    fn find_alpha_star(
        &mut self,
        f: &mut dyn FnMut(&[f64]) -> f64,
        x: &[f64],
        direction: &[f64],
    ) -> LineSearchOutcome {
        let mut line = Line::new(f, x, direction);
        let (low, high) = self.bracket(&mut line);
        let mut bracket = GoldenBracket::new(&mut line, low, high);
        for _ in 0..self.reductions_needed(high - low) {
            bracket.reduce(&mut line);
        }
        let (alpha, value) = bracket.best();
        line.outcome(alpha, value)
    }

    fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

/// Interval `[low, high]` with the two golden interior points `c < d`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GoldenBracket {
    pub(crate) low: f64,
    pub(crate) high: f64,
    pub(crate) c: f64,
    pub(crate) d: f64,
    f_c: f64,
    f_d: f64,
}

impl GoldenBracket {
    pub(crate) fn new(line: &mut Line<'_, '_>, low: f64, high: f64) -> Self {
        let c = high - GOLDEN_RATIO * (high - low);
        let d = low + GOLDEN_RATIO * (high - low);
        Self {
            low,
            high,
            c,
            d,
            f_c: line.at(c),
            f_d: line.at(d),
        }
    }

    /// Drops the end beyond the worse interior point; one new evaluation.
    pub(crate) fn reduce(&mut self, line: &mut Line<'_, '_>) {
        if self.f_c < self.f_d {
            self.high = self.d;
            self.d = self.c;
            self.f_d = self.f_c;
            self.c = self.high - GOLDEN_RATIO * (self.high - self.low);
            self.f_c = line.at(self.c);
        } else {
            self.low = self.c;
            self.c = self.d;
            self.f_c = self.f_d;
            self.d = self.low + GOLDEN_RATIO * (self.high - self.low);
            self.f_d = line.at(self.d);
        }
    }

    pub(crate) fn width(&self) -> f64 {
        self.high - self.low
    }

    pub(crate) fn best(&self) -> (f64, f64) {
        if self.f_c <= self.f_d {
            (self.c, self.f_c)
        } else {
            (self.d, self.f_d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_reductions_needed() {
        let search = GoldenSection::new(1e-3, 1.0);
        let n = search.reductions_needed(1.0);
        assert!(GOLDEN_RATIO.powi(n as i32) <= 1e-3);
        assert!(GOLDEN_RATIO.powi(n as i32 - 1) > 1e-3);
        assert_eq!(search.reductions_needed(1e-4), 0);
    }

    #[test]
    fn test_bracket_shrinks_monotonically() {
        let mut f = |x: &[f64]| (x[0] - 0.7).powi(2);
        let mut line = Line::new(&mut f, &[0.0], &[1.0]);
        let mut bracket = GoldenBracket::new(&mut line, 0.0, 4.0);
        let mut width = bracket.width();
        for _ in 0..30 {
            bracket.reduce(&mut line);
            assert!(bracket.width() < width);
            assert!(bracket.low < bracket.c && bracket.c < bracket.high);
            assert!(bracket.low < bracket.d && bracket.d < bracket.high);
            assert!(bracket.low <= 0.7 && 0.7 <= bracket.high);
            width = bracket.width();
        }
    }

    #[test]
    fn test_slides_outward_for_distant_minimum() {
        let mut search = GoldenSection::new(1e-7, 0.1);
        let mut f = |x: &[f64]| (x[0] - 40.0).powi(2);
        let outcome = search.find_alpha_star(&mut f, &[0.0], &[1.0]);
        assert_abs_diff_eq!(outcome.alpha, 40.0, epsilon = 1e-5);
        assert!(outcome.evaluations > 10);
    }

    #[test]
    fn test_minimum_before_first_step() {
        let mut search = GoldenSection::new(1e-8, 10.0);
        let mut f = |x: &[f64]| (x[0] + 2.0 * x[1] - 1.0).powi(2);
        // Along (1, 2) the minimum is at α = 0.2.
        let outcome = search.find_alpha_star(&mut f, &[0.0, 0.0], &[1.0, 2.0]);
        assert_abs_diff_eq!(outcome.alpha, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(outcome.value, 0.0, epsilon = 1e-10);
    }
}

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::candidate::{Candidate, OptimizeDirection};
use crate::selector::Selector;

/// Metropolis acceptance test.
///
/// An improving move is always accepted. A worsening one is accepted with
/// probability `exp(sign · (f_current − f_candidate) / T)`, where `sign` is
/// `+1` when minimizing and `−1` when maximizing. At `T ≤ 0` only improving
/// moves pass.
#[derive(Debug, Clone)]
pub struct Metropolis {
    pub direction: OptimizeDirection,
    temperature: f64,
    rng: ChaCha8Rng,
}

impl Metropolis {
    pub fn new(direction: OptimizeDirection) -> Self {
        Self::from_rng(direction, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(direction: OptimizeDirection, seed: u64) -> Self {
        Self::from_rng(direction, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(direction: OptimizeDirection, rng: ChaCha8Rng) -> Self {
        Self {
            direction,
            temperature: 1.0,
            rng,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Temperature used by [`Selector::select`].
    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    pub fn acceptance_probability(&self, current: f64, candidate: f64, temperature: f64) -> f64 {
        if !self.direction.is_better(current, candidate) {
            return 1.0;
        }
        if temperature <= 0.0 {
            return 0.0;
        }
        (self.direction.sign() * (current - candidate) / temperature).exp()
    }

    pub fn accept(&mut self, current: f64, candidate: f64, temperature: f64) -> bool {
        let p = self.acceptance_probability(current, candidate, temperature);
        p >= 1.0 || self.rng.gen::<f64>() < p
    }
}

impl Selector for Metropolis {
    /// Treats the first candidate as the incumbent and offers it each of the
    /// others in turn; returns the final incumbent.
    fn select(&mut self, candidates: Vec<Candidate>, _target: usize) -> Vec<Candidate> {
        let mut pool = candidates.into_iter();
        let Some(mut incumbent) = pool.next() else {
            return Vec::new();
        };
        let temperature = self.temperature;
        for proposal in pool {
            if self.accept(incumbent.f(), proposal.f(), temperature) {
                incumbent = proposal;
            }
        }
        vec![incumbent]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_improvements_always_accepted() {
        let mut m = Metropolis::with_seed(OptimizeDirection::Minimize, 0);
        for _ in 0..100 {
            assert!(m.accept(5.0, 4.0, 1e-12));
        }
        assert_eq!(m.acceptance_probability(5.0, 5.0, 1.0), 1.0);
    }

    #[test]
    fn test_worse_probability() {
        let m = Metropolis::with_seed(OptimizeDirection::Minimize, 0);
        assert_relative_eq!(m.acceptance_probability(1.0, 3.0, 2.0), (-1.0f64).exp());
        let max = Metropolis::with_seed(OptimizeDirection::Maximize, 0);
        assert_relative_eq!(max.acceptance_probability(3.0, 1.0, 2.0), (-1.0f64).exp());
        assert_eq!(m.acceptance_probability(1.0, 3.0, 0.0), 0.0);
    }

    #[test]
    fn test_acceptance_rate_matches_probability() {
        let mut m = Metropolis::with_seed(OptimizeDirection::Minimize, 17);
        let trials = 20_000;
        let accepted = (0..trials).filter(|_| m.accept(0.0, 1.0, 1.0)).count();
        let rate = accepted as f64 / trials as f64;
        assert!((rate - (-1.0f64).exp()).abs() < 0.02);
    }

    #[test]
    fn test_select_returns_single_incumbent() {
        let mut m = Metropolis::with_seed(OptimizeDirection::Minimize, 1);
        m.set_temperature(0.0);
        let kept = m.select(
            vec![
                Candidate::scalar(vec![0.0], 2.0),
                Candidate::scalar(vec![1.0], 3.0),
                Candidate::scalar(vec![2.0], 1.0),
            ],
            1,
        );
        assert_eq!(kept, vec![Candidate::scalar(vec![2.0], 1.0)]);
    }
}

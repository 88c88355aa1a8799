use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::candidate::{Candidate, OptimizeDirection};
use crate::selector::Selector;

/// Tournament selection by random pairwise comparison.
///
/// The population is shuffled and split into pairs; the worse member of each
/// pair is eliminated until only `target` candidates remain. Rounds repeat
/// while the population is still too large.
#[derive(Debug, Clone)]
pub struct RandomPairwiseCompare {
    pub direction: OptimizeDirection,
    rng: ChaCha8Rng,
}

impl RandomPairwiseCompare {
    pub fn new(direction: OptimizeDirection) -> Self {
        Self {
            direction,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn with_seed(direction: OptimizeDirection, seed: u64) -> Self {
        Self {
            direction,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Selector for RandomPairwiseCompare {
    fn select(&mut self, mut candidates: Vec<Candidate>, target: usize) -> Vec<Candidate> {
        if target == 0 {
            return Vec::new();
        }
        while candidates.len() > target {
            let mut excess = candidates.len() - target;
            candidates.shuffle(&mut self.rng);
            let mut survivors = Vec::with_capacity(candidates.len());
            let mut pool = candidates.into_iter();
            while let Some(a) = pool.next() {
                match pool.next() {
                    Some(b) if excess > 0 => {
                        excess -= 1;
                        if self.direction.is_better(b.f(), a.f()) {
                            survivors.push(b);
                        } else {
                            survivors.push(a);
                        }
                    }
                    Some(b) => {
                        survivors.push(a);
                        survivors.push(b);
                    }
                    None => survivors.push(a),
                }
            }
            candidates = survivors;
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaches_target_size() {
        let population: Vec<Candidate> =
            (0..17).map(|i| Candidate::scalar(vec![i as f64], i as f64)).collect();
        let mut selector = RandomPairwiseCompare::with_seed(OptimizeDirection::Minimize, 3);
        let kept = selector.select(population, 5);
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn test_best_always_survives() {
        let mut selector = RandomPairwiseCompare::with_seed(OptimizeDirection::Maximize, 21);
        for _ in 0..10 {
            let population: Vec<Candidate> =
                (0..10).map(|i| Candidate::scalar(vec![i as f64], i as f64)).collect();
            let kept = selector.select(population, 4);
            assert!(kept.iter().any(|c| c.f() == 9.0));
        }
    }

    #[test]
    fn test_small_population_is_untouched() {
        let population = vec![Candidate::scalar(vec![0.0], 1.0)];
        let mut selector = RandomPairwiseCompare::with_seed(OptimizeDirection::Minimize, 0);
        assert_eq!(selector.select(population.clone(), 3), population);
    }

    #[test]
    fn test_zero_target_empties_population() {
        let population: Vec<Candidate> =
            (0..4).map(|i| Candidate::scalar(vec![i as f64], i as f64)).collect();
        let mut selector = RandomPairwiseCompare::with_seed(OptimizeDirection::Minimize, 1);
        assert!(selector.select(population, 0).is_empty());
    }

    #[test]
    fn test_empty_population() {
        let mut selector = RandomPairwiseCompare::with_seed(OptimizeDirection::Minimize, 1);
        assert!(selector.select(Vec::new(), 3).is_empty());
        assert!(selector.select(Vec::new(), 0).is_empty());
    }
}

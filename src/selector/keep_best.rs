use crate::candidate::{sort_by_objective, Candidate, OptimizeDirection};
use crate::selector::Selector;

/// Truncation: the `target` best candidates by first objective.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepBest {
    pub direction: OptimizeDirection,
}

impl KeepBest {
    pub fn new(direction: OptimizeDirection) -> Self {
        Self { direction }
    }
}

impl Selector for KeepBest {
    fn select(&mut self, mut candidates: Vec<Candidate>, target: usize) -> Vec<Candidate> {
        sort_by_objective(&mut candidates, self.direction);
        candidates.truncate(target);
        candidates
    }
}

/// Keeps only the single best candidate, whatever the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepSingleBest {
    pub direction: OptimizeDirection,
}

impl KeepSingleBest {
    pub fn new(direction: OptimizeDirection) -> Self {
        Self { direction }
    }
}

impl Selector for KeepSingleBest {
    fn select(&mut self, candidates: Vec<Candidate>, _target: usize) -> Vec<Candidate> {
        KeepBest::new(self.direction).select(candidates, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population() -> Vec<Candidate> {
        [4.0, 1.0, 3.0, 2.0]
            .iter()
            .map(|&f| Candidate::scalar(vec![f], f))
            .collect()
    }

    #[test]
    fn test_keep_best_minimizing() {
        let kept = KeepBest::default().select(population(), 2);
        let fs: Vec<f64> = kept.iter().map(Candidate::f).collect();
        assert_eq!(fs, vec![1.0, 2.0]);
    }

    #[test]
    fn test_keep_best_maximizing() {
        let kept = KeepBest::new(OptimizeDirection::Maximize).select(population(), 3);
        let fs: Vec<f64> = kept.iter().map(Candidate::f).collect();
        assert_eq!(fs, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_keep_single_best_ignores_target() {
        let kept = KeepSingleBest::default().select(population(), 10);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].f(), 1.0);
    }
}

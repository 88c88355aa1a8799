use std::cmp::Ordering;

use crate::candidate::{Candidate, OptimizeDirection};
use crate::selector::Selector;

/// Elitist multi-objective selection.
///
/// Candidates are sorted into non-dominated fronts. Whole fronts are admitted
/// best first; the front that would overflow `target` is truncated by
/// descending crowding distance so the survivors stay spread out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParetoSelector {
    pub direction: OptimizeDirection,
}

impl ParetoSelector {
    pub fn new(direction: OptimizeDirection) -> Self {
        Self { direction }
    }
}

/// Indices of `candidates` grouped into non-dominated fronts, first front
/// first.
pub fn non_dominated_fronts(candidates: &[Candidate], direction: OptimizeDirection) -> Vec<Vec<usize>> {
    let n = candidates.len();
    let mut dominated_by = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in i + 1..n {
            if candidates[i].dominates(&candidates[j], direction) {
                dominates[i].push(j);
                dominated_by[j] += 1;
            } else if candidates[j].dominates(&candidates[i], direction) {
                dominates[j].push(i);
                dominated_by[i] += 1;
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| dominated_by[i] == 0).collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominates[i] {
                dominated_by[j] -= 1;
                if dominated_by[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(current);
        current = next;
    }
    fronts
}

/// Crowding distance of each member of `front`, in the order given. Boundary
/// members of any objective get infinity.
pub fn crowding_distances(candidates: &[Candidate], front: &[usize]) -> Vec<f64> {
    let mut distance = vec![0.0; front.len()];
    if front.len() <= 2 {
        return vec![f64::INFINITY; front.len()];
    }
    let objectives = candidates[front[0]].objectives.len();
    for m in 0..objectives {
        let mut order: Vec<usize> = (0..front.len()).collect();
        let value = |k: usize| candidates[front[k]].objectives[m];
        order.sort_by(|&a, &b| value(a).partial_cmp(&value(b)).unwrap_or(Ordering::Equal));
        let (first, last) = (order[0], order[front.len() - 1]);
        distance[first] = f64::INFINITY;
        distance[last] = f64::INFINITY;
        let span = value(last) - value(first);
        if span <= 0.0 || !span.is_finite() {
            continue;
        }
        for w in order.windows(3) {
            distance[w[1]] += (value(w[2]) - value(w[0])) / span;
        }
    }
    distance
}

impl Selector for ParetoSelector {
    fn select(&mut self, candidates: Vec<Candidate>, target: usize) -> Vec<Candidate> {
        let fronts = non_dominated_fronts(&candidates, self.direction);
        let mut chosen: Vec<usize> = Vec::with_capacity(target);
        for front in fronts {
            if chosen.len() + front.len() <= target {
                chosen.extend(front);
                continue;
            }
            let distances = crowding_distances(&candidates, &front);
            let mut ranked: Vec<(usize, f64)> = front.into_iter().zip(distances).collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
            let room = target - chosen.len();
            chosen.extend(ranked.into_iter().take(room).map(|(i, _)| i));
            break;
        }
        let mut keep = vec![false; candidates.len()];
        for i in chosen {
            keep[i] = true;
        }
        candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(c, k)| k.then_some(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_objective(points: &[(f64, f64)]) -> Vec<Candidate> {
        points
            .iter()
            .map(|&(a, b)| Candidate::new(vec![a, b], vec![a, b]))
            .collect()
    }

    #[test]
    fn test_fronts() {
        let c = two_objective(&[(1.0, 4.0), (2.0, 2.0), (4.0, 1.0), (3.0, 3.0), (5.0, 5.0)]);
        let fronts = non_dominated_fronts(&c, OptimizeDirection::Minimize);
        assert_eq!(fronts.len(), 3);
        let mut first = fronts[0].clone();
        first.sort();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(fronts[1], vec![3]);
        assert_eq!(fronts[2], vec![4]);
    }

    #[test]
    fn test_crowding_prefers_extremes() {
        let c = two_objective(&[(0.0, 4.0), (1.0, 3.0), (1.1, 2.9), (4.0, 0.0)]);
        let d = crowding_distances(&c, &[0, 1, 2, 3]);
        assert!(d[0].is_infinite() && d[3].is_infinite());
        assert!(d[1] > 0.0 && d[2] > 0.0);
    }

    #[test]
    fn test_select_keeps_first_front_and_spreads() {
        let c = two_objective(&[(0.0, 4.0), (1.0, 3.0), (1.1, 2.9), (4.0, 0.0), (5.0, 5.0)]);
        let kept = ParetoSelector::default().select(c, 3);
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|k| k.objectives != vec![5.0, 5.0]));
        assert!(kept.iter().any(|k| k.objectives == vec![0.0, 4.0]));
        assert!(kept.iter().any(|k| k.objectives == vec![4.0, 0.0]));
    }

    #[test]
    fn test_maximizing_flips_dominance() {
        let c = two_objective(&[(1.0, 1.0), (2.0, 2.0)]);
        let kept = ParetoSelector::new(OptimizeDirection::Maximize).select(c, 1);
        assert_eq!(kept[0].objectives, vec![2.0, 2.0]);
    }
}

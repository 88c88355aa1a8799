//! Neighbor change vectors for local search over discrete variables.
//!
//! Step sizes grow as `round(e^level)` (1, 3, 7, 20, 55, ...). Each exponent
//! pass introduces the primitive `±step` moves of a new level, then revisits
//! every lower level and extends that level's most recent vectors by one more
//! `±step` component. A vector is only extended at indices after its last
//! non-zero component, so the same combination is never produced twice.

use log::trace;

/// Beyond this level `e^level` no longer fits the change-vector element type.
const MAX_LEVEL: usize = 40;

/// Builds at least `minimum` change vectors of length `dimension` that only
/// move the variables listed in `discrete`.
///
/// The pass for the current exponent always completes, so the returned set is
/// closed under negation.
pub(crate) fn neighbor_change_vectors(
    dimension: usize,
    discrete: &[usize],
    minimum: usize,
) -> Vec<Vec<i64>> {
    let mut all = Vec::new();
    if discrete.is_empty() || minimum == 0 {
        return all;
    }

    // Vectors most recently produced at each level.
    let mut frontiers: Vec<Vec<Vec<i64>>> = Vec::new();
    let mut exponent = 0;
    while all.len() < minimum && exponent <= MAX_LEVEL {
        for level in (0..=exponent).rev() {
            let step = step_size(level);
            let produced = if level == exponent {
                primitive_vectors(dimension, discrete, step)
            } else {
                compound_vectors(discrete, &frontiers[level], step)
            };
            trace!(
                "exponent {exponent}, level {level}: {} vectors with step {step}",
                produced.len()
            );
            all.extend(produced.iter().cloned());
            if level == exponent {
                frontiers.push(produced);
            } else {
                frontiers[level] = produced;
            }
        }
        exponent += 1;
    }
    all
}

pub(crate) fn step_size(level: usize) -> i64 {
    (level as f64).exp().round() as i64
}

fn primitive_vectors(dimension: usize, discrete: &[usize], step: i64) -> Vec<Vec<i64>> {
    let mut vectors = Vec::with_capacity(2 * discrete.len());
    for &i in discrete {
        for signed in [step, -step] {
            let mut v = vec![0; dimension];
            v[i] = signed;
            vectors.push(v);
        }
    }
    vectors
}

fn compound_vectors(discrete: &[usize], frontier: &[Vec<i64>], step: i64) -> Vec<Vec<i64>> {
    let mut vectors = Vec::new();
    for v in frontier {
        let Some(last) = v.iter().rposition(|&c| c != 0) else {
            continue;
        };
        for &j in discrete.iter().filter(|&&j| j > last) {
            for signed in [step, -step] {
                let mut w = v.clone();
                w[j] += signed;
                vectors.push(w);
            }
        }
    }
    vectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_step_sizes() {
        let steps: Vec<i64> = (0..5).map(step_size).collect();
        assert_eq!(steps, vec![1, 3, 7, 20, 55]);
    }

    #[test]
    fn test_single_variable() {
        let vectors = neighbor_change_vectors(1, &[0], 5);
        assert_eq!(vectors.len(), 6);
        let moves: Vec<i64> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(moves, vec![1, -1, 3, -3, 7, -7]);
    }

    #[test]
    fn test_symmetry() {
        let vectors = neighbor_change_vectors(4, &[0, 1, 3], 200);
        assert!(vectors.len() >= 200);
        let set: HashSet<Vec<i64>> = vectors.iter().cloned().collect();
        for v in &vectors {
            let negated: Vec<i64> = v.iter().map(|c| -c).collect();
            assert!(set.contains(&negated), "missing negation of {v:?}");
        }
    }

    #[test]
    fn test_no_duplicates_and_only_discrete_moves() {
        let vectors = neighbor_change_vectors(3, &[0, 2], 50);
        let set: HashSet<Vec<i64>> = vectors.iter().cloned().collect();
        assert_eq!(set.len(), vectors.len());
        assert!(vectors.iter().all(|v| v[1] == 0));
    }

    #[test]
    fn test_compound_vectors_appear() {
        // Exponent 1 revisits level 0 and pairs the two variables.
        let vectors = neighbor_change_vectors(2, &[0, 1], 5);
        assert!(vectors.contains(&vec![1, 1]));
        assert!(vectors.contains(&vec![-1, -1]));
        assert!(vectors.contains(&vec![1, -1]));
        assert!(vectors.contains(&vec![3, 0]));
    }

    #[test]
    fn test_no_discrete_variables() {
        assert!(neighbor_change_vectors(3, &[], 10).is_empty());
    }
}
